//! remove.bg background removal client.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};

use super::{
    build_http_client, ensure_success, require_key, BackgroundRemover, VendorImage,
};
use crate::error::VendorError;
use crate::models::{ApiKey, ImageMime, RemoveBgConfig, UploadedFile, REMOVE_BG_API_KEY_ENV};

const VENDOR: &str = "remove_bg";

pub struct RemoveBgClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<ApiKey>,
}

impl RemoveBgClient {
    pub fn new(config: &RemoveBgConfig, api_key: Option<ApiKey>) -> Result<Self, VendorError> {
        Ok(Self {
            http: build_http_client(config.timeout())?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl BackgroundRemover for RemoveBgClient {
    async fn remove_background(
        &self,
        file: &UploadedFile,
        mime: ImageMime,
    ) -> Result<VendorImage, VendorError> {
        if file.bytes.is_empty() {
            return Err(VendorError::MissingInput("image"));
        }
        let key = require_key(self.api_key.as_ref(), REMOVE_BG_API_KEY_ENV)?;

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(mime.as_str())
            .map_err(|e| VendorError::Transport(e.to_string()))?;
        let form = Form::new()
            .part("image_file", part)
            .text("size", "auto")
            .text("format", "png");

        tracing::info!(
            file_name = %file.file_name,
            size = file.size(),
            "Requesting background removal"
        );

        let response = self
            .http
            .post(format!("{}/v1.0/removebg", self.base_url))
            .header("X-Api-Key", key.expose())
            .header(ACCEPT, "image/*")
            .multipart(form)
            .send()
            .await?;
        let response = ensure_success(VENDOR, response).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(VendorError::Malformed(format!(
                "expected an image, got content type '{content_type}'"
            )));
        }

        let bytes = response.bytes().await?.to_vec();
        if bytes.is_empty() {
            return Err(VendorError::Malformed("empty image body".to_string()));
        }

        tracing::info!(size = bytes.len(), content_type = %content_type, "Background removed");

        Ok(VendorImage {
            bytes,
            content_type,
        })
    }
}
