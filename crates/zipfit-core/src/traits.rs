//! Core traits for zipfit abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability: the Postgres
//! repositories live in `zipfit-db`, the external-service backends in
//! `zipfit-inference`, and tests substitute in-memory fixtures.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// REPOSITORIES
// =============================================================================

/// Repository for uploaded documents and their lifecycle.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Insert a new document (status PENDING).
    async fn insert(&self, document: &Document) -> Result<()>;

    /// Fetch a document by id.
    async fn fetch(&self, id: Uuid) -> Result<Document>;

    /// Transition PENDING → PROCESSING at pipeline start.
    async fn mark_processing(&self, id: Uuid) -> Result<()>;

    /// Transition to the COMPLETED terminal state.
    async fn mark_completed(&self, id: Uuid) -> Result<()>;

    /// Transition to the FAILED terminal state with a captured reason.
    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<()>;
}

/// Repository for analysis outcomes (1:1 with documents).
#[async_trait]
pub trait OutcomeRepository: Send + Sync {
    /// Insert the outcome for a document. At most one per document.
    async fn insert(&self, outcome: &AnalysisOutcome) -> Result<()>;

    /// Fetch the outcome for a document, if analysis completed.
    async fn fetch_for_document(&self, document_id: Uuid) -> Result<Option<AnalysisOutcome>>;
}

/// Repository for housing-subscription offers.
#[async_trait]
pub trait OfferRepository: Send + Sync {
    /// Insert a new offer.
    async fn create(&self, offer: &Offer) -> Result<()>;

    /// Fetch an offer by id.
    async fn fetch(&self, id: Uuid) -> Result<Offer>;

    /// All currently active offers (document-side duplicate check).
    async fn list_active(&self) -> Result<Vec<Offer>>;

    /// Active offers in an exact region.
    async fn list_active_by_region(&self, region: &str) -> Result<Vec<Offer>>;

    /// Find a registry-sourced offer by external id (feed-side duplicate
    /// check).
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Offer>>;

    /// Update an offer in place (registry refresh path).
    async fn update(&self, offer: &Offer) -> Result<()>;

    /// Record a merge with an uploaded document. Provenance transitions
    /// Registry → Merged in storage; registry attribute values are left
    /// untouched.
    async fn mark_merged(&self, id: Uuid, document_id: Uuid) -> Result<()>;

    /// Deactivate offers whose application window closed before `today`.
    /// Returns the number of offers deactivated.
    async fn deactivate_expired(&self, today: NaiveDate) -> Result<u64>;
}

/// Read/write access to user profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch the profile for a user, if one exists.
    async fn fetch(&self, user_id: Uuid) -> Result<Option<Profile>>;

    /// Create or replace the profile for a user.
    async fn upsert(&self, profile: &Profile) -> Result<()>;
}

// =============================================================================
// EXTERNAL BACKENDS
// =============================================================================

/// Text generation backend (prompt in, completion out).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate a completion for `prompt` with the given sampling
    /// temperature and output-token budget.
    async fn generate(&self, prompt: &str, temperature: f64, max_tokens: u32) -> Result<String>;

    /// Identifier of the model serving this backend.
    fn model_name(&self) -> &str;
}

/// OCR backend for scanned documents and photos.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Probe whether the file contains recognizable text content.
    async fn detect_text(&self, data: &[u8], mime_type: &str) -> Result<bool>;

    /// Run full OCR and return the recognized text.
    ///
    /// "No text found" is `Ok` with an empty string, distinguishable from
    /// service failures which surface as `Err`. Downstream grading treats
    /// empty text as a quality-LOW signal rather than a hard failure.
    async fn recognize(&self, data: &[u8], mime_type: &str) -> Result<String>;
}

/// Direct text extraction for digitally-born documents (no OCR).
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract embedded text from the document bytes.
    async fn extract(&self, data: &[u8], mime_type: &str) -> Result<String>;
}

// =============================================================================
// RESULT CACHE
// =============================================================================

/// Content-addressed cache of analysis results.
///
/// Keys are document fingerprints. Implementations must degrade gracefully:
/// connection or serialization failures log a warning and behave as a miss
/// (`get`) or a no-op (`put`/`touch`) — the cache accelerates computation,
/// it never owns data.
#[async_trait]
pub trait AnalysisCache: Send + Sync {
    /// Look up a cached analysis by fingerprint.
    async fn get(&self, fingerprint: &str) -> Option<CachedAnalysis>;

    /// Store an analysis under a fingerprint with the standard TTL.
    async fn put(&self, fingerprint: &str, analysis: &CachedAnalysis);

    /// Extend the TTL of an existing entry (refresh-on-hit).
    async fn touch(&self, fingerprint: &str);
}

// =============================================================================
// REGISTRY FEED
// =============================================================================

/// External collaborator producing candidate offer records from the public
/// registry. Transport details are the implementation's concern.
#[async_trait]
pub trait RegistryFeed: Send + Sync {
    /// Fetch candidate records announced since `from`.
    async fn fetch_records(&self, from: NaiveDate) -> Result<Vec<RegistryRecord>>;
}
