//! # zipfit-inference
//!
//! External AI and OCR backend abstraction for zipfit.
//!
//! This crate provides:
//! - Gemini-style generation backend (criteria extraction)
//! - Vision OCR backend (scanned documents and photos)
//! - Local `pdftotext` direct extraction for digitally-born PDFs
//! - The criteria extractor (prompt construction + defensive parsing)
//! - Retry + circuit-breaker decoration for every external call
//! - Scripted mock backends for tests

pub mod extraction;
pub mod gemini;
pub mod mock;
pub mod pdf_text;
pub mod resilience;
pub mod vision;

// Re-export core types
pub use zipfit_core::*;

pub use extraction::CriteriaExtractor;
pub use gemini::GeminiBackend;
pub use mock::{MockGenerationBackend, MockOcrBackend, MockTextExtractor};
pub use pdf_text::PdfTextExtractor;
pub use resilience::{BreakerConfig, CircuitBreaker, ResiliencePolicy, RetryConfig};
pub use vision::VisionOcrBackend;
