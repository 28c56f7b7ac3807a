use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Json},
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;

use super::upload::UploadForm;
use crate::error::ApiError;
use crate::models::{AppConfig, UploadPolicy};
use crate::services::ImageRecognizer;

/// Multipart form accepted by /api/image-recognition
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct RecognizeForm {
    /// Image file (jpeg, png, webp or bmp)
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    /// Question about the image (default: what is the main content?)
    prompt: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecognizeResponse {
    pub success: bool,
    /// The model's answer
    pub content: String,
    /// Token usage reported by the vendor
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub usage: Option<Value>,
}

/// Describe an image
///
/// Sends the image and a free-text question to the vision model.
#[utoipa::path(
    post,
    path = "/api/image-recognition",
    request_body(content = RecognizeForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Answer from the vision model", body = RecognizeResponse),
        (status = 400, description = "Missing file or unsupported type"),
        (status = 413, description = "File exceeds the upload limit"),
        (status = 500, description = "API key not configured"),
        (status = 502, description = "Vision service failed"),
    ),
    tag = "Recognition"
)]
pub async fn handle_recognize(
    State(config): State<Arc<AppConfig>>,
    State(recognizer): State<Arc<dyn ImageRecognizer>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let (file, mime) = form.take_image(UploadPolicy::new(config.uploads.recognize.max_bytes))?;
    let question = form.text("prompt").unwrap_or_default();

    tracing::info!(
        file_name = %file.file_name,
        size = file.size(),
        has_question = !question.is_empty(),
        "Recognition request received"
    );

    let recognition = recognizer.recognize(&file.bytes, mime, question).await?;

    Ok(Json(RecognizeResponse {
        success: true,
        content: recognition.content,
        usage: recognition.usage,
    }))
}
