use axum::{
    extract::{Multipart, State},
    response::Response,
};
use std::sync::Arc;
use utoipa::ToSchema;

use super::download::attachment;
use super::upload::UploadForm;
use crate::error::ApiError;
use crate::models::{AppConfig, UploadPolicy};
use crate::services::BackgroundRemover;

/// Multipart form accepted by /api/remove-bg
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct RemoveBgForm {
    /// Image file (jpeg, png, webp or bmp)
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

/// Remove the background of an image
///
/// The image is forwarded to the background-removal service and the
/// transparent PNG it returns is sent back as a download.
#[utoipa::path(
    post,
    path = "/api/remove-bg",
    request_body(content = RemoveBgForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image with transparent background", content_type = "image/png"),
        (status = 400, description = "Missing file or unsupported type"),
        (status = 413, description = "File exceeds the upload limit"),
        (status = 500, description = "API key not configured"),
        (status = 502, description = "Background-removal service failed"),
    ),
    tag = "Background removal"
)]
pub async fn handle_remove_bg(
    State(config): State<Arc<AppConfig>>,
    State(remover): State<Arc<dyn BackgroundRemover>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let (file, mime) = form.take_image(UploadPolicy::new(config.uploads.remove_bg.max_bytes))?;

    tracing::info!(
        file_name = %file.file_name,
        size = file.size(),
        "Background removal request received"
    );

    let image = remover.remove_background(&file, mime).await?;
    let file_name = format!("no_bg_{}.png", file.stem());

    Ok(attachment(image.bytes, &image.content_type, &file_name, &[]))
}
