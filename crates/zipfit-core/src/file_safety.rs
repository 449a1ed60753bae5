//! Upload validation for announcement documents.
//!
//! Rejection happens before the pipeline ever sees the file: only PDF, JPEG
//! and PNG uploads of at most 10 MB are accepted, and acceptance is decided
//! by magic bytes, not by the declared content type or extension.

use crate::defaults::MAX_UPLOAD_BYTES;

/// MIME types the ingestion pipeline accepts.
pub const ACCEPTED_MIME_TYPES: &[&str] = &["application/pdf", "image/jpeg", "image/png"];

/// Result of upload validation.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub allowed: bool,
    pub block_reason: Option<String>,
    /// MIME type detected from magic bytes when recognizable.
    pub detected_type: Option<String>,
}

impl ValidationResult {
    pub fn allowed(detected: impl Into<String>) -> Self {
        Self {
            allowed: true,
            block_reason: None,
            detected_type: Some(detected.into()),
        }
    }

    pub fn blocked(reason: impl Into<String>, detected: Option<String>) -> Self {
        Self {
            allowed: false,
            block_reason: Some(reason.into()),
            detected_type: detected,
        }
    }
}

/// Validate an upload against the size cap and the accepted-type allowlist.
pub fn validate_upload(data: &[u8], declared_type: &str) -> ValidationResult {
    if data.is_empty() {
        return ValidationResult::blocked("Empty upload", None);
    }

    if data.len() as u64 > MAX_UPLOAD_BYTES {
        return ValidationResult::blocked(
            format!("File exceeds maximum size of {} bytes", MAX_UPLOAD_BYTES),
            None,
        );
    }

    let detected = infer::get(data).map(|kind| kind.mime_type().to_string());

    match detected {
        Some(mime) if ACCEPTED_MIME_TYPES.contains(&mime.as_str()) => {
            ValidationResult::allowed(mime)
        }
        Some(mime) => ValidationResult::blocked(
            format!("Unsupported file type: {}", mime),
            Some(mime),
        ),
        // PDFs, JPEGs and PNGs all carry magic bytes; unrecognizable data
        // cannot be one of them regardless of what the client declared.
        None => ValidationResult::blocked(
            format!("Content does not match a supported type (declared {})", declared_type),
            None,
        ),
    }
}
