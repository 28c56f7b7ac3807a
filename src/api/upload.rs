//! Shared multipart handling for every upload endpoint.

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{ApiError, UploadError};
use crate::models::{ImageMime, UploadPolicy, UploadedFile};

/// Name of the multipart part carrying the image
pub const FILE_FIELD: &str = "file";

/// A parsed multipart form: at most one file plus text fields
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// Drain a multipart body.
    ///
    /// The first part named `file` (or the first part that carries a file
    /// name) is taken as the upload; other parts are read as text.
    pub async fn read(mut multipart: Multipart) -> Result<Self, UploadError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(multipart_error)?
        {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);

            let is_file = name == FILE_FIELD || file_name.is_some();
            if is_file && form.file.is_none() {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(multipart_error)?;
                form.file = Some(UploadedFile::new(
                    file_name.unwrap_or_else(|| "image".to_string()),
                    content_type.unwrap_or_default(),
                    bytes.to_vec(),
                ));
            } else if !is_file {
                let value = field
                    .text()
                    .await
                    .map_err(multipart_error)?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Take the uploaded file and validate it against `policy`.
    pub fn take_image(&mut self, policy: UploadPolicy) -> Result<(UploadedFile, ImageMime), ApiError> {
        let file = self.file.take().ok_or(UploadError::MissingFile)?;
        let mime = policy.validate(&file)?;

        tracing::debug!(
            file_name = %file.file_name,
            size = file.size(),
            image_type = %mime,
            "Upload accepted"
        );

        Ok((file, mime))
    }

    /// A text field, `None` if absent or blank
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Parse an optional text field
    pub fn parsed<T: FromStr>(&self, name: &'static str) -> Result<Option<T>, ApiError> {
        self.text(name)
            .map(|v| {
                v.parse()
                    .map_err(|_| ApiError::invalid(name, format!("'{v}' is not a valid value")))
            })
            .transpose()
    }
}

/// Bodies cut off by the router limit surface as multipart read errors
fn multipart_error(e: MultipartError) -> UploadError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::BodyTooLarge
    } else {
        UploadError::Multipart(e.body_text())
    }
}
