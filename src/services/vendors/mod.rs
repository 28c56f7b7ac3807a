//! Adapters for the third-party AI services.
//!
//! Each adapter makes exactly one request per call: no retries, batching or
//! streaming. Failures are mapped onto [`VendorError`] and handed back to the
//! caller once.

pub mod ark;
pub mod fetch;
pub mod remove_bg;

pub use ark::ArkClient;
pub use fetch::ImageFetcher;
pub use remove_bg::RemoveBgClient;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::error::VendorError;
use crate::models::{ApiKey, ImageMime, SizePreset, Style, UploadedFile};

/// Longest excerpt of an upstream error body echoed back to clients
const MAX_ERROR_EXCERPT: usize = 200;

/// Input to an image generation call
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub style: Style,
    pub size: SizePreset,
}

/// Output of an image generation call
#[derive(Debug, Clone)]
pub struct Generation {
    pub url: String,
    /// Prompt actually sent, including the style descriptor
    pub prompt: String,
    pub usage: Option<Value>,
}

/// Output of a recognition call
#[derive(Debug, Clone)]
pub struct Recognition {
    pub content: String,
    pub usage: Option<Value>,
}

/// Binary image returned by a vendor
#[derive(Debug, Clone)]
pub struct VendorImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, VendorError>;
}

#[async_trait]
pub trait ImageRecognizer: Send + Sync {
    async fn recognize(
        &self,
        image: &[u8],
        mime: ImageMime,
        question: &str,
    ) -> Result<Recognition, VendorError>;
}

#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    async fn remove_background(
        &self,
        file: &UploadedFile,
        mime: ImageMime,
    ) -> Result<VendorImage, VendorError>;
}

pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client, VendorError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("imgkit/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| VendorError::Transport(format!("Failed to build HTTP client: {e}")))
}

pub(crate) fn require_key<'a>(
    key: Option<&'a ApiKey>,
    env_name: &'static str,
) -> Result<&'a ApiKey, VendorError> {
    key.ok_or(VendorError::MissingCredential(env_name))
}

/// Pass 2xx responses through; turn anything else into `VendorError::Upstream`.
pub(crate) async fn ensure_success(
    vendor: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, VendorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(
        vendor,
        status = status.as_u16(),
        body = %truncate(&body, 1000),
        "Vendor API returned an error"
    );

    Err(VendorError::Upstream {
        status: status.as_u16(),
        message: upstream_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string()),
    })
}

/// Pull a human-readable message out of a vendor error body.
///
/// Understands `{"error": {"message": ..}}`, `{"error": ".."}` and
/// `{"errors": [{"title": ..}]}`; otherwise uses a plain-text excerpt.
pub(crate) fn upstream_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(json) = serde_json::from_str::<Value>(trimmed) {
        let from_error = match &json["error"] {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => obj.get("message").and_then(Value::as_str).map(str::to_string),
            _ => None,
        };
        let from_errors = json["errors"].as_array().and_then(|errors| {
            let titles: Vec<&str> = errors
                .iter()
                .filter_map(|e| e["title"].as_str().or_else(|| e["detail"].as_str()))
                .collect();
            (!titles.is_empty()).then(|| titles.join("; "))
        });
        if let Some(message) = from_error.or(from_errors) {
            return Some(truncate(&message, MAX_ERROR_EXCERPT));
        }
    }

    Some(truncate(trimmed, MAX_ERROR_EXCERPT))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max_chars).collect();
        out.push('…');
        out
    }
}
