//! # zipfit-jobs
//!
//! Background analysis execution for zipfit.
//!
//! This crate provides:
//! - The end-to-end document analysis pipeline (orchestrator)
//! - A fire-and-forget worker pool with bounded concurrency
//! - Document intake (pre-pipeline upload validation)
//! - Redis-backed analysis result cache
//! - Duplicate reconciliation with a pluggable matcher
//! - Registry feed collection and the offer expiry sweep
//!
//! ## Example
//!
//! ```ignore
//! use zipfit_jobs::{AnalysisPipeline, AnalysisWorker, WorkerConfig, DocumentIntake};
//!
//! let pipeline = AnalysisPipeline::new(/* repositories, backends, policies */);
//! let worker = AnalysisWorker::new(pipeline, WorkerConfig::from_env());
//! let handle = worker.start();
//!
//! let intake = DocumentIntake::new(documents, profiles, handle.submitter(), "/var/lib/zipfit");
//! let document_id = intake.accept(user_id, "공고문.pdf", "application/pdf", &bytes).await?;
//! // Poll the document by id until COMPLETED or FAILED.
//! ```

pub mod cache;
pub mod collector;
pub mod intake;
pub mod pipeline;
pub mod reconcile;
pub mod worker;

// Re-export core types
pub use zipfit_core::*;

pub use cache::RedisAnalysisCache;
pub use collector::{CollectorHandle, CollectorReport, RegistryCollector};
pub use intake::DocumentIntake;
pub use pipeline::AnalysisPipeline;
pub use reconcile::{DuplicateMatcher, DuplicateReconciler, NameRegionMatcher, ReconcileOutcome};
pub use worker::{
    AnalysisRequest, AnalysisSubmitter, AnalysisWorker, WorkerConfig, WorkerEvent, WorkerHandle,
};
