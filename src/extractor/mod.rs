mod ytdlp;

use std::path::PathBuf;

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::domain::VideoInfo;

pub use ytdlp::YtDlp;

#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Process(String),

    #[error("Destination path is not valid UTF-8: {}", .0.display())]
    InvalidDestination(PathBuf),

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExtractorError>;

/// Byte counts reported while a download is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteProgress {
    pub downloaded: u64,
    pub total: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub format_id: String,
    pub destination: PathBuf,
}

/// The external video-extraction tool. Metadata and streams only ever come
/// through this trait.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract_info(&self, url: &str) -> Result<VideoInfo>;

    /// Start a download. The stream yields progress reports and ends when the
    /// file is complete; an `Err` item means the download failed.
    fn download(&self, request: DownloadRequest) -> BoxStream<'static, Result<ByteProgress>>;
}
