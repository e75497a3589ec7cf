use iced::{
    widget::{button, column, image, pick_list, progress_bar, text, text_input, Space},
    Alignment, Element, Length,
};

use crate::domain::{FormatChoice, Session, Thumbnail};

/// Main view state
pub struct DownloadView {
    pub url: String,
    pub size_text: String,
    pub status_message: String,
    pub thumbnail: Option<image::Handle>,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self {
            url: String::new(),
            size_text: String::new(),
            status_message: "Paste a video URL and fetch its formats".to_string(),
            thumbnail: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    UrlChanged(String),
    FetchPressed,
    FormatSelected(FormatChoice),
    DownloadPressed,
}

impl DownloadView {
    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::UrlChanged(url) => {
                self.url = url;
            }
            DownloadMessage::FetchPressed
            | DownloadMessage::FormatSelected(_)
            | DownloadMessage::DownloadPressed => {
                // Will be handled by the app
            }
        }
    }

    /// Refresh everything derived from a freshly fetched session.
    pub fn show_session(&mut self, session: &Session) {
        self.thumbnail = session.thumbnail().map(thumbnail_handle);
        self.size_text = session.size_text().unwrap_or_default();
    }

    pub fn view<'a>(&'a self, session: &'a Session) -> Element<'a, DownloadMessage> {
        let thumbnail: Element<'a, DownloadMessage> = match &self.thumbnail {
            Some(handle) => image(handle.clone())
                .width(Length::Fixed(200.0))
                .height(Length::Fixed(120.0))
                .into(),
            None => Space::new().height(Length::Fixed(120.0)).into(),
        };

        column![
            text("Video URL:").size(16),
            text_input("Paste a video URL...", &self.url)
                .on_input(DownloadMessage::UrlChanged)
                .padding(10),
            button("Fetch Video")
                .on_press_maybe((!session.is_busy()).then_some(DownloadMessage::FetchPressed))
                .padding([6, 16]),
            text("Progress:").size(16),
            progress_bar(0.0..=100.0, f32::from(session.progress())),
            thumbnail,
            text(session.title()).size(16),
            text("Select Format:").size(16),
            pick_list(
                session.choices(),
                session.selected_choice(),
                DownloadMessage::FormatSelected
            )
            .placeholder("Fetch a video first"),
            text(&self.size_text).size(14),
            Space::new().height(Length::Fixed(10.0)),
            button("Download")
                .on_press_maybe(session.can_download().then_some(DownloadMessage::DownloadPressed))
                .padding([10, 20]),
            text(&self.status_message).size(14),
        ]
        .padding(20)
        .spacing(10)
        .align_x(Alignment::Center)
        .into()
    }
}

fn thumbnail_handle(thumbnail: &Thumbnail) -> image::Handle {
    image::Handle::from_rgba(thumbnail.width, thumbnail.height, thumbnail.rgba.clone())
}
