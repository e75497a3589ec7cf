use bytes::Bytes;
use image::imageops::FilterType;
use reqwest::Client;
use thiserror::Error;

use super::models::ThumbnailConfig;
use crate::domain::Thumbnail;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Failed to decode image: {0}")]
    DecodeError(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Fetches preview images over HTTP.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: ThumbnailConfig,
}

impl ApiClient {
    pub fn new(config: ThumbnailConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Download a thumbnail and resize it to the configured display size
    pub async fn fetch_thumbnail(&self, url: &str) -> Result<Thumbnail> {
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        self.decode_thumbnail(&body)
    }

    fn decode_thumbnail(&self, data: &[u8]) -> Result<Thumbnail> {
        let image = image::load_from_memory(data)?;
        let resized = image
            .resize_exact(self.config.width, self.config.height, FilterType::Lanczos3)
            .to_rgba8();
        let (width, height) = resized.dimensions();

        Ok(Thumbnail {
            width,
            height,
            rgba: Bytes::from(resized.into_raw()),
        })
    }
}
