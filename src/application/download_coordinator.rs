use std::path::PathBuf;
use std::sync::Arc;

use futures::{stream::BoxStream, StreamExt};

use crate::{
    api::ApiClient,
    domain::{AppError, DownloadPlan, FetchedVideo},
    extractor::{ByteProgress, DownloadRequest, Extractor},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    Progress(ByteProgress),
    Completed(PathBuf),
    Failed(AppError),
}

#[derive(Clone)]
pub struct DownloadCoordinator {
    extractor: Arc<dyn Extractor>,
    api_client: ApiClient,
}

impl DownloadCoordinator {
    pub fn new(extractor: Arc<dyn Extractor>, api_client: ApiClient) -> Self {
        Self {
            extractor,
            api_client,
        }
    }

    /// Extract metadata for `url` and load its thumbnail.
    pub async fn fetch(&self, url: String) -> Result<FetchedVideo, AppError> {
        let url = url.trim().to_string();
        if url.is_empty() {
            return Err(AppError::MissingUrl);
        }

        tracing::info!(%url, "fetching video details");
        let info = self
            .extractor
            .extract_info(&url)
            .await
            .map_err(|e| AppError::Extraction(e.to_string()))?;
        tracing::info!(title = %info.title, formats = info.formats.len(), "video details fetched");

        let thumbnail = match info.thumbnail_url.as_deref() {
            Some(thumbnail_url) => match self.api_client.fetch_thumbnail(thumbnail_url).await {
                Ok(thumbnail) => Some(thumbnail),
                Err(e) => {
                    tracing::warn!(%thumbnail_url, error = %e, "thumbnail unavailable");
                    None
                }
            },
            None => None,
        };

        Ok(FetchedVideo {
            url,
            title: info.title,
            formats: info.formats,
            thumbnail,
        })
    }

    pub async fn choose_save_path(&self, suggested_filename: String) -> Option<PathBuf> {
        rfd::AsyncFileDialog::new()
            .set_file_name(&suggested_filename)
            .add_filter("MP4 files", &["mp4"])
            .add_filter("All files", &["*"])
            .save_file()
            .await
            .map(|handle| with_default_extension(handle.path().to_path_buf()))
    }

    /// Run the download, ending with exactly one `Completed` or `Failed` event.
    pub fn download_stream(&self, plan: DownloadPlan, path: PathBuf) -> BoxStream<'static, DownloadEvent> {
        tracing::info!(
            url = %plan.url,
            format = %plan.format_id,
            path = %path.display(),
            "starting download"
        );

        let progress = self.extractor.download(DownloadRequest {
            url: plan.url,
            format_id: plan.format_id,
            destination: path.clone(),
        });

        futures::stream::unfold(
            DownloadRuntimeState::Downloading { progress, path },
            |state| async move {
                match state {
                    DownloadRuntimeState::Downloading { mut progress, path } => {
                        match progress.next().await {
                            Some(Ok(report)) => Some((
                                DownloadEvent::Progress(report),
                                DownloadRuntimeState::Downloading { progress, path },
                            )),
                            Some(Err(e)) => {
                                tracing::error!(error = %e, "download failed");
                                Some((
                                    DownloadEvent::Failed(AppError::Download(e.to_string())),
                                    DownloadRuntimeState::Finished,
                                ))
                            }
                            None => {
                                tracing::info!(path = %path.display(), "download complete");
                                Some((DownloadEvent::Completed(path), DownloadRuntimeState::Finished))
                            }
                        }
                    }
                    DownloadRuntimeState::Finished => None,
                }
            },
        )
        .boxed()
    }
}

enum DownloadRuntimeState {
    Downloading {
        progress: BoxStream<'static, crate::extractor::Result<ByteProgress>>,
        path: PathBuf,
    },
    Finished,
}

/// Mirror the save dialog's `.mp4` default when the user typed a bare name.
fn with_default_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension("mp4")
    }
}
