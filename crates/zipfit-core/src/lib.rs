//! # zipfit-core
//!
//! Core types, traits, and abstractions for zipfit.
//!
//! This crate provides the foundational data structures, the pure
//! eligibility/matching engine, OCR quality grading, upload validation and
//! the trait definitions that the other zipfit crates depend on.

pub mod defaults;
pub mod eligibility;
pub mod error;
pub mod file_safety;
pub mod fingerprint;
pub mod logging;
pub mod models;
pub mod quality;
pub mod scoring;
pub mod traits;

// Re-export commonly used types at crate root
pub use eligibility::{evaluate, is_eligible, match_score, EligibilityBreakdown};
pub use error::{Error, Result};
pub use file_safety::{validate_upload, ValidationResult, ACCEPTED_MIME_TYPES};
pub use fingerprint::fingerprint;
pub use models::*;
pub use quality::{assess, QualityAssessment};
pub use scoring::{detailed_score, MatchBreakdown};
pub use traits::*;
