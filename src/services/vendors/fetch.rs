//! Fetches generated images from the vendor's CDN for download.

use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

use super::{build_http_client, ensure_success, VendorImage};
use crate::error::VendorError;

const VENDOR: &str = "image_cdn";

pub struct ImageFetcher {
    http: reqwest::Client,
}

impl ImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, VendorError> {
        Ok(Self {
            http: build_http_client(timeout)?,
        })
    }

    pub async fn fetch(&self, url: &str) -> Result<VendorImage, VendorError> {
        let response = self.http.get(url).send().await?;
        let response = ensure_success(VENDOR, response).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = response.bytes().await?.to_vec();
        if bytes.is_empty() {
            return Err(VendorError::Malformed("empty image body".to_string()));
        }

        tracing::debug!(size = bytes.len(), content_type = %content_type, "Fetched generated image");

        Ok(VendorImage {
            bytes,
            content_type,
        })
    }
}
