//! Error types for zipfit.

use thiserror::Error;

/// Result type alias using zipfit's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for zipfit operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(uuid::Uuid),

    /// Offer not found
    #[error("Offer not found: {0}")]
    OfferNotFound(uuid::Uuid),

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// OCR processing failed
    #[error("OCR error: {0}")]
    Ocr(String),

    /// AI output could not be turned into criteria
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Cache operation failed
    #[error("Cache error: {0}")]
    Cache(String),

    /// External service circuit breaker is open
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Job queue error
    #[error("Job error: {0}")]
    Job(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a retry against the external service could plausibly succeed.
    ///
    /// Only transport-class failures count; parse and validation errors are
    /// deterministic and retrying them wastes the retry budget.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Request(_) | Error::Inference(_) | Error::Ocr(_) | Error::Io(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
