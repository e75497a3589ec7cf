use std::path::PathBuf;
use std::sync::Arc;

use iced::Task;
use rfd::{MessageButtons, MessageLevel};

use crate::api::ApiClient;
use crate::application::{DownloadCoordinator, DownloadEvent};
use crate::config::AppConfig;
use crate::domain::{AppError, DownloadPlan, FetchedVideo, Session};
use crate::extractor::YtDlp;
use crate::ui::{DownloadMessage, DownloadView};

pub struct DownloadApp {
    view: DownloadView,
    session: Session,
    coordinator: DownloadCoordinator,
}

impl Default for DownloadApp {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl DownloadApp {
    pub fn new(config: AppConfig) -> Self {
        let extractor = Arc::new(YtDlp::new(config.ytdlp_program));
        let api_client = ApiClient::new(config.thumbnail);
        Self::with_coordinator(DownloadCoordinator::new(extractor, api_client))
    }

    pub fn with_coordinator(coordinator: DownloadCoordinator) -> Self {
        Self {
            view: DownloadView::default(),
            session: Session::default(),
            coordinator,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    FetchCompleted(Result<FetchedVideo, AppError>),
    /// (Selected Path, resolved download)
    FileSaveSelected(Option<PathBuf>, DownloadPlan),
    Download(DownloadEvent),
    DialogClosed,
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                DownloadMessage::FetchPressed => return start_fetch(app),
                DownloadMessage::FormatSelected(choice) => {
                    if let Some(size_text) = app.session.select_format(choice.index) {
                        app.view.size_text = size_text;
                    }
                }
                DownloadMessage::DownloadPressed => return start_download(app),
                DownloadMessage::UrlChanged(_) => {}
            }
        }
        Message::FetchCompleted(result) => match app.session.finish_fetch(result) {
            Ok(()) => {
                app.view.show_session(&app.session);
                app.view.status_message =
                    format!("{} formats available", app.session.formats().len());
            }
            Err(e) => {
                tracing::warn!(error = %e, "fetch failed");
                app.view.status_message = "Fetch failed".to_string();
                return show_error(format!("Failed to fetch video details: {}", e));
            }
        },
        Message::FileSaveSelected(path_opt, plan) => match path_opt {
            Some(path) => {
                if !app.session.begin_download() {
                    tracing::warn!(path = %path.display(), "download refused, session busy");
                    app.view.status_message = "Download not started".to_string();
                    return show_error(format!(
                        "Failed to download video: another operation is in progress, {} was not written",
                        path.display()
                    ));
                }
                app.view.status_message = format!("Downloading to: {}", path.display());
                return Task::run(
                    app.coordinator.download_stream(plan, path),
                    Message::Download,
                );
            }
            None => {
                // User cancelled dialog
                app.session.cancel_save_dialog();
                app.view.status_message = "Download cancelled".to_string();
            }
        },
        Message::Download(DownloadEvent::Progress(report)) => {
            let percent = app.session.record_progress(report.downloaded, report.total);
            app.view.status_message = format!("Downloading: {}%", percent);
        }
        Message::Download(DownloadEvent::Completed(path)) => {
            app.session.finish_download();
            app.view.status_message = format!("Saved: {}", path.display());
            return show_info("Download complete".to_string());
        }
        Message::Download(DownloadEvent::Failed(e)) => {
            app.session.finish_download();
            app.view.status_message = "Download failed".to_string();
            return show_error(format!("Failed to download video: {}", e));
        }
        Message::DialogClosed => {}
    }
    Task::none()
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view(&app.session).map(Message::UiMessage)
}

fn start_fetch(app: &mut DownloadApp) -> Task<Message> {
    let url = app.view.url.trim().to_string();
    if url.is_empty() {
        return show_error(AppError::MissingUrl.to_string());
    }
    if !app.session.begin_fetch() {
        return Task::none();
    }

    app.view.status_message = "Fetching video details...".to_string();
    let coordinator = app.coordinator.clone();
    Task::perform(
        async move { coordinator.fetch(url).await },
        Message::FetchCompleted,
    )
}

fn start_download(app: &mut DownloadApp) -> Task<Message> {
    if app.session.is_busy() {
        return Task::none();
    }
    let plan = match app.session.plan_download(&app.view.url) {
        Ok(plan) => plan,
        Err(e) => return show_error(e.to_string()),
    };
    if !app.session.begin_save_dialog() {
        return Task::none();
    }

    app.view.status_message = "Please select save location...".to_string();
    let coordinator = app.coordinator.clone();
    Task::perform(
        async move {
            let path = coordinator
                .choose_save_path(plan.suggested_filename.clone())
                .await;
            (path, plan)
        },
        |(path, plan)| Message::FileSaveSelected(path, plan),
    )
}

fn show_error(description: String) -> Task<Message> {
    show_dialog(MessageLevel::Error, "Error", description)
}

fn show_info(description: String) -> Task<Message> {
    show_dialog(MessageLevel::Info, "Success", description)
}

fn show_dialog(level: MessageLevel, title: &'static str, description: String) -> Task<Message> {
    Task::perform(
        async move {
            rfd::AsyncMessageDialog::new()
                .set_level(level)
                .set_title(title)
                .set_description(description)
                .set_buttons(MessageButtons::Ok)
                .show()
                .await;
        },
        |_| Message::DialogClosed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ThumbnailConfig;
    use crate::application::download_coordinator::tests::{formats, MockExtractor};
    use crate::domain::{DownloadPhase, FormatChoice};
    use crate::extractor::ByteProgress;

    fn app() -> DownloadApp {
        let coordinator = DownloadCoordinator::new(
            Arc::new(MockExtractor::with_formats(formats(3))),
            ApiClient::new(ThumbnailConfig::default()),
        );
        DownloadApp::with_coordinator(coordinator)
    }

    fn fetched(count: usize) -> FetchedVideo {
        FetchedVideo {
            url: "https://example.com/v".to_string(),
            title: "Clip".to_string(),
            formats: formats(count),
            thumbnail: None,
        }
    }

    /// Fetch one video and open the save dialog for its first format.
    fn awaiting_save_path(count: usize) -> (DownloadApp, DownloadPlan) {
        let mut app = app();
        let _ = update(
            &mut app,
            Message::UiMessage(DownloadMessage::UrlChanged("https://example.com/v".to_string())),
        );
        let _ = update(&mut app, Message::FetchCompleted(Ok(fetched(count))));
        let _ = update(&mut app, Message::UiMessage(DownloadMessage::DownloadPressed));
        let plan = app.session.plan_download(&app.view.url).unwrap();
        (app, plan)
    }

    fn labels(app: &DownloadApp) -> Vec<String> {
        app.session.choices().into_iter().map(|c| c.label).collect()
    }

    #[test]
    fn test_fetch_requires_url() {
        let mut app = app();
        let _ = update(&mut app, Message::UiMessage(DownloadMessage::FetchPressed));
        assert_eq!(app.session.phase(), DownloadPhase::Idle);
    }

    #[test]
    fn test_fetch_populates_list_and_size() {
        let mut app = app();
        let _ = update(
            &mut app,
            Message::UiMessage(DownloadMessage::UrlChanged("https://example.com/v".to_string())),
        );
        let _ = update(&mut app, Message::UiMessage(DownloadMessage::FetchPressed));
        assert_eq!(app.session.phase(), DownloadPhase::Fetching);

        let _ = update(&mut app, Message::FetchCompleted(Ok(fetched(4))));
        assert_eq!(
            labels(&app),
            vec![
                "144p - 1.00 MB",
                "288p - 2.00 MB",
                "432p - 3.00 MB",
                "576p - 4.00 MB"
            ]
        );
        assert_eq!(app.view.size_text, "Size: 1.00 MB");
        assert!(app.session.can_download());
    }

    #[test]
    fn test_selecting_updates_size_text() {
        let mut app = app();
        let _ = update(&mut app, Message::FetchCompleted(Ok(fetched(3))));

        let choice = FormatChoice {
            index: 2,
            label: "432p - 3.00 MB".to_string(),
        };
        let _ = update(
            &mut app,
            Message::UiMessage(DownloadMessage::FormatSelected(choice)),
        );
        assert_eq!(app.view.size_text, "Size: 3.00 MB");
        assert_eq!(app.session.selected(), Some(2));
    }

    #[test]
    fn test_failed_fetch_keeps_list() {
        let mut app = app();
        let _ = update(&mut app, Message::FetchCompleted(Ok(fetched(2))));
        let before = labels(&app);

        let _ = update(
            &mut app,
            Message::FetchCompleted(Err(AppError::Extraction("offline".to_string()))),
        );
        assert_eq!(labels(&app), before);
        assert_eq!(app.view.size_text, "Size: 1.00 MB");
        assert_eq!(app.view.status_message, "Fetch failed");
    }

    #[test]
    fn test_download_progress_and_completion() {
        let (mut app, plan) = awaiting_save_path(1);

        let _ = update(
            &mut app,
            Message::FileSaveSelected(Some(PathBuf::from("/tmp/clip.mp4")), plan),
        );
        assert_eq!(app.session.phase(), DownloadPhase::Downloading);

        let mut last = 0;
        for downloaded in [0, 30, 60, 45, 100, 130] {
            let _ = update(
                &mut app,
                Message::Download(DownloadEvent::Progress(ByteProgress {
                    downloaded,
                    total: Some(100),
                })),
            );
            let percent = app.session.progress();
            assert!(percent >= last && percent <= 100);
            last = percent;
        }
        assert_eq!(app.view.status_message, "Downloading: 100%");

        let _ = update(
            &mut app,
            Message::Download(DownloadEvent::Completed(PathBuf::from("/tmp/clip.mp4"))),
        );
        assert_eq!(app.session.phase(), DownloadPhase::Fetched);
        assert_eq!(app.view.status_message, "Saved: /tmp/clip.mp4");
    }

    #[test]
    fn test_cancelled_save_dialog_changes_nothing() {
        let (mut app, plan) = awaiting_save_path(1);

        let _ = update(&mut app, Message::FileSaveSelected(None, plan));
        assert_eq!(app.session.phase(), DownloadPhase::Fetched);
        assert_eq!(app.view.status_message, "Download cancelled");
    }

    #[test]
    fn test_download_failure_returns_to_fetched() {
        let (mut app, plan) = awaiting_save_path(1);
        let _ = update(
            &mut app,
            Message::FileSaveSelected(Some(PathBuf::from("/tmp/clip.mp4")), plan),
        );

        let _ = update(
            &mut app,
            Message::Download(DownloadEvent::Failed(AppError::Download("403".to_string()))),
        );
        assert_eq!(app.session.phase(), DownloadPhase::Fetched);
        assert_eq!(app.session.formats().len(), 1);
    }

    #[test]
    fn test_save_dialog_holds_the_session() {
        let (mut app, plan) = awaiting_save_path(1);
        assert_eq!(app.session.phase(), DownloadPhase::AwaitingSavePath);
        assert!(app.session.is_busy());

        let _ = update(&mut app, Message::UiMessage(DownloadMessage::FetchPressed));
        let _ = update(&mut app, Message::UiMessage(DownloadMessage::DownloadPressed));
        assert_eq!(app.session.phase(), DownloadPhase::AwaitingSavePath);
        assert_eq!(app.view.status_message, "Please select save location...");

        let _ = update(
            &mut app,
            Message::FileSaveSelected(Some(PathBuf::from("/tmp/x.mp4")), plan),
        );
        assert_eq!(app.session.phase(), DownloadPhase::Downloading);
        assert_eq!(app.view.status_message, "Downloading to: /tmp/x.mp4");
    }

    #[test]
    fn test_unexpected_save_path_is_reported() {
        let mut app = app();
        let _ = update(&mut app, Message::FetchCompleted(Ok(fetched(1))));
        let plan = app.session.plan_download("https://example.com/v").unwrap();

        let _ = update(
            &mut app,
            Message::FileSaveSelected(Some(PathBuf::from("/tmp/x.mp4")), plan),
        );
        assert_eq!(app.session.phase(), DownloadPhase::Fetched);
        assert_eq!(app.view.status_message, "Download not started");
    }
}
