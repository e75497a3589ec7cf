use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Please enter a video URL")]
    MissingUrl,

    #[error("Please select a format")]
    NoFormatSelected,

    #[error("{0}")]
    Extraction(String),

    #[error("{0}")]
    Download(String),
}
