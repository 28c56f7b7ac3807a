use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Invalid upload: {0}")]
    Upload(#[from] UploadError),

    #[error("Image processing failed: {0}")]
    Compress(#[from] CompressError),

    #[error("{0}")]
    Vendor(#[from] VendorError),

    #[error("Not found")]
    NotFound,
}

impl ApiError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ApiError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Rejections raised by the shared upload validation step.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file provided")]
    MissingFile,

    #[error("File is empty")]
    Empty,

    #[error("File too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("File too large: request body exceeds the upload limit")]
    BodyTooLarge,

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File content is not a supported image")]
    NotAnImage,

    #[error("Malformed multipart body: {0}")]
    Multipart(String),
}

#[derive(Debug, Error)]
pub enum CompressError {
    #[error("Input is empty")]
    Empty,

    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("Quality {0} out of range (10-100)")]
    QualityOutOfRange(u8),

    #[error("Max dimension must be at least 1")]
    ZeroMaxDimension,

    #[error("Could not decode image: {0}")]
    Decode(String),

    #[error("Could not encode image: {0}")]
    Encode(String),

    #[error("Compression task failed: {0}")]
    Task(String),
}

/// Failure taxonomy shared by every vendor adapter.
#[derive(Debug, Error)]
pub enum VendorError {
    #[error("Missing input: {0}")]
    MissingInput(&'static str),

    #[error("API key not configured: {0}")]
    MissingCredential(&'static str),

    #[error("Upstream API returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Malformed upstream response: {0}")]
    Malformed(String),

    #[error("Upstream request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for VendorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            VendorError::Malformed(e.to_string())
        } else {
            VendorError::Transport(e.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            ApiError::Upload(UploadError::TooLarge { .. } | UploadError::BodyTooLarge) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::Compress(CompressError::Task(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Compress(
                CompressError::QualityOutOfRange(_) | CompressError::ZeroMaxDimension,
            ) => StatusCode::BAD_REQUEST,
            ApiError::Compress(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Vendor(VendorError::MissingInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Vendor(VendorError::MissingCredential(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Vendor(_) => StatusCode::BAD_GATEWAY,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        };

        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = Json(json!({
            "status": status.as_u16(),
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
