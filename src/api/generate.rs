use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;

use super::download::attachment;
use crate::error::ApiError;
use crate::models::{GeneratedImage, SizePreset, Style};
use crate::services::{GenerationHistory, GenerationRequest, ImageFetcher, ImageGenerator};

/// Request body for image generation
#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateRequest {
    /// What to draw
    #[serde(default)]
    pub prompt: String,
    /// realistic, artistic, anime, cartoon, digital or watercolor
    #[schema(example = "realistic")]
    pub style: Option<String>,
    /// One of the size presets, e.g. 512x512 or 1024x768
    #[schema(example = "512x512")]
    pub size: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GenerateResponse {
    pub success: bool,
    /// History id, usable with the download endpoint
    pub id: u64,
    pub image_url: String,
    /// Prompt sent to the model (with style descriptor)
    pub prompt: String,
    pub original_prompt: String,
    pub style: Style,
    #[schema(value_type = String, example = "512x512")]
    pub size: SizePreset,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub usage: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClearHistoryResponse {
    pub success: bool,
    /// Number of entries removed
    pub cleared: usize,
}

impl GenerateRequest {
    fn validate(&self) -> Result<GenerationRequest, ApiError> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(ApiError::invalid("prompt", "prompt must not be empty"));
        }

        let style = match non_blank(&self.style) {
            Some(s) => s.parse::<Style>().map_err(|e| ApiError::invalid("style", e))?,
            None => Style::default(),
        };
        let size = match non_blank(&self.size) {
            Some(s) => s.parse::<SizePreset>().map_err(|e| ApiError::invalid("size", e))?,
            None => SizePreset::default(),
        };

        Ok(GenerationRequest {
            prompt: prompt.to_string(),
            style,
            size,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Generate an image from a text prompt
///
/// The prompt is enhanced with the style's descriptor before it is sent to
/// the model. Successful results are kept in the generation history.
#[utoipa::path(
    post,
    path = "/api/ai-generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Image generated", body = GenerateResponse),
        (status = 400, description = "Empty prompt, unknown style or unsupported size"),
        (status = 500, description = "API key not configured"),
        (status = 502, description = "Generation service failed"),
    ),
    tag = "Generation"
)]
pub async fn handle_generate(
    State(generator): State<Arc<dyn ImageGenerator>>,
    State(history): State<Arc<GenerationHistory>>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::invalid("body", e.body_text()))?;
    let request = body.validate()?;

    tracing::info!(
        style = %request.style,
        size = %request.size,
        prompt_len = request.prompt.len(),
        "Generation request received"
    );

    let generation = generator.generate(&request).await?;
    let entry = history
        .record(&generation, &request.prompt, request.style, request.size)
        .await;

    tracing::info!(id = entry.id, url = %entry.url, "Image generated");

    Ok(Json(GenerateResponse {
        success: true,
        id: entry.id,
        image_url: entry.url,
        prompt: entry.prompt,
        original_prompt: entry.original_prompt,
        style: entry.style,
        size: entry.size,
        usage: generation.usage,
        created_at: entry.created_at,
    }))
}

/// List generated images, most recent first
#[utoipa::path(
    get,
    path = "/api/ai-generate/history",
    responses(
        (status = 200, description = "Generation history", body = Vec<GeneratedImage>),
    ),
    tag = "Generation"
)]
pub async fn handle_history(
    State(history): State<Arc<GenerationHistory>>,
) -> Json<Vec<GeneratedImage>> {
    Json(history.list().await)
}

/// Clear the generation history
#[utoipa::path(
    delete,
    path = "/api/ai-generate/history",
    responses(
        (status = 200, description = "History cleared", body = ClearHistoryResponse),
    ),
    tag = "Generation"
)]
pub async fn handle_clear_history(
    State(history): State<Arc<GenerationHistory>>,
) -> Json<ClearHistoryResponse> {
    let cleared = history.clear().await;
    tracing::info!(cleared, "Generation history cleared");
    Json(ClearHistoryResponse {
        success: true,
        cleared,
    })
}

/// Download a generated image
///
/// Fetches the image from the vendor URL stored in the history and returns
/// it as an attachment.
#[utoipa::path(
    get,
    path = "/api/ai-generate/history/{id}/download",
    params(("id" = u64, Path, description = "History id")),
    responses(
        (status = 200, description = "Generated image", content_type = "image/jpeg"),
        (status = 404, description = "No history entry with this id"),
        (status = 502, description = "Image could not be fetched"),
    ),
    tag = "Generation"
)]
pub async fn handle_download(
    State(history): State<Arc<GenerationHistory>>,
    State(fetcher): State<Arc<ImageFetcher>>,
    Path(id): Path<u64>,
) -> Result<Response, ApiError> {
    let entry = history.get(id).await.ok_or(ApiError::NotFound)?;
    let image = fetcher.fetch(&entry.url).await?;

    tracing::info!(id, size = image.bytes.len(), "Generated image downloaded");

    Ok(attachment(
        image.bytes,
        &image.content_type,
        &entry.download_name(),
        &[],
    ))
}
