//! REST API module.
//!
//! Contains the handlers for both resources plus the shared request plumbing:
//! list query parameters and JSON-or-multipart payload extraction.

mod music;
mod scout_content;

pub use music::*;
pub use scout_content::*;

use axum::{
    body::Bytes,
    extract::{multipart::Field, Request},
    http::header::CONTENT_TYPE,
};
use serde::Deserialize;

use crate::errors::AppError;

/// Common list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Exact-match filter on the type code
    #[serde(rename = "type")]
    pub type_code: Option<String>,
    /// Exact-match filter on the category code
    pub category: Option<String>,
    /// Exact-match filter on the numeric difficulty
    pub difficulty: Option<String>,
    /// Case-insensitive substring search over the text fields
    pub search: Option<String>,
    /// Sort key, optionally prefixed with `-` for descending
    pub ordering: Option<String>,
}

/// An uploaded file part: declared filename, declared content type, bytes.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Whether the request body is a multipart form.
pub(crate) fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

/// Trim a submitted text value, mapping blank to absent.
pub(crate) fn blank_to_none(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Validation error for an out-of-range choice value.
pub(crate) fn invalid_choice(field: &str, value: &str) -> AppError {
    AppError::validation_field(field, format!("\"{}\" is not a valid choice.", value))
}

pub(crate) fn bad_multipart(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("Malformed multipart body: {}", err))
}

/// Read a multipart text field.
pub(crate) async fn text_field(field: Field<'_>) -> Result<String, AppError> {
    field.text().await.map_err(bad_multipart)
}

/// Read a multipart integer field; blank values count as absent.
pub(crate) async fn int_field(name: &str, field: Field<'_>) -> Result<Option<i64>, AppError> {
    let raw = text_field(field).await?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<i64>()
        .map(Some)
        .map_err(|_| AppError::validation_field(name, "A valid integer is required."))
}

/// Read a multipart file field. Empty parts (a form submitted with an
/// untouched file input) count as absent.
pub(crate) async fn file_field(field: Field<'_>) -> Result<Option<UploadedFile>, AppError> {
    let filename = field.file_name().unwrap_or_default().to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field.bytes().await.map_err(bad_multipart)?;

    if filename.is_empty() && bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(UploadedFile {
        filename,
        content_type,
        bytes,
    }))
}
