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
use crate::services::{CompressOptions, CompressService};

/// Multipart form accepted by /api/compress
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct CompressForm {
    /// Image file (jpeg, png, webp or bmp)
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    /// Quality percentage, 10-100 (default from config, normally 80)
    quality: Option<u8>,
    /// Longest side of the output in pixels; larger images are downscaled
    max_dimension: Option<u32>,
}

/// Compress an image
///
/// PNG stays PNG; every other format is re-encoded as JPEG. The result is
/// returned as a download together with size and dimension headers.
#[utoipa::path(
    post,
    path = "/api/compress",
    request_body(content = CompressForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Compressed image", content_type = "image/jpeg",
            headers(
                ("X-Original-Size" = u64, description = "Input size in bytes"),
                ("X-Compressed-Size" = u64, description = "Output size in bytes"),
                ("X-Image-Width" = u32, description = "Output width"),
                ("X-Image-Height" = u32, description = "Output height"),
            )),
        (status = 400, description = "Missing file, unsupported type or bad parameter"),
        (status = 413, description = "File exceeds the upload limit"),
        (status = 422, description = "Image could not be decoded"),
    ),
    tag = "Compression"
)]
pub async fn handle_compress(
    State(config): State<Arc<AppConfig>>,
    State(compressor): State<Arc<CompressService>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let (file, mime) = form.take_image(UploadPolicy::new(config.uploads.compress.max_bytes))?;

    let quality = form
        .parsed::<u8>("quality")?
        .unwrap_or(config.compress.default_quality);
    let max_dimension = form.parsed::<u32>("max_dimension")?;
    let options = CompressOptions::new(quality, max_dimension)?;

    tracing::info!(
        file_name = %file.file_name,
        size = file.size(),
        quality,
        max_dimension = ?options.max_dimension(),
        "Compression request received"
    );

    let stem = file.stem().to_string();
    let compressed = compressor.compress(file.bytes, mime, options).await?;

    tracing::info!(
        original_size = compressed.original_size,
        compressed_size = compressed.compressed_size(),
        width = compressed.width,
        height = compressed.height,
        "Compression finished"
    );

    let file_name = compressed.download_name(&stem);
    let extra = [
        ("x-original-size", compressed.original_size.to_string()),
        ("x-compressed-size", compressed.compressed_size().to_string()),
        ("x-image-width", compressed.width.to_string()),
        ("x-image-height", compressed.height.to_string()),
    ];
    Ok(attachment(
        compressed.bytes,
        compressed.mime.as_str(),
        &file_name,
        &extra,
    ))
}
