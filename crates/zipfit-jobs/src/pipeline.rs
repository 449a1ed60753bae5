//! The end-to-end document analysis pipeline.
//!
//! Drives one document from PROCESSING to a terminal state: cache lookup,
//! OCR-need classification, text extraction, quality grading, AI criteria
//! extraction, eligibility scoring against the uploader's profile,
//! duplicate reconciliation and outcome persistence. Every failure is
//! caught exactly once at the pipeline boundary, logged with document
//! context and converted to FAILED — nothing propagates to the submitter,
//! who observes progress by polling the document status.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use zipfit_core::{
    defaults, eligibility, quality, AnalysisCache, AnalysisOutcome, CachedAnalysis, Document,
    DocumentRepository, OcrBackend, OcrQuality, OutcomeRepository, Profile, Result, TextExtractor,
};
use zipfit_inference::{CriteriaExtractor, ResiliencePolicy};

use crate::reconcile::DuplicateReconciler;

/// Analysis pipeline with injected collaborators.
pub struct AnalysisPipeline {
    documents: Arc<dyn DocumentRepository>,
    outcomes: Arc<dyn OutcomeRepository>,
    cache: Arc<dyn AnalysisCache>,
    ocr: Arc<dyn OcrBackend>,
    text_extractor: Arc<dyn TextExtractor>,
    extractor: CriteriaExtractor,
    reconciler: DuplicateReconciler,
    ocr_policy: ResiliencePolicy,
    gen_policy: ResiliencePolicy,
}

impl AnalysisPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        outcomes: Arc<dyn OutcomeRepository>,
        cache: Arc<dyn AnalysisCache>,
        ocr: Arc<dyn OcrBackend>,
        text_extractor: Arc<dyn TextExtractor>,
        extractor: CriteriaExtractor,
        reconciler: DuplicateReconciler,
        ocr_policy: ResiliencePolicy,
        gen_policy: ResiliencePolicy,
    ) -> Self {
        Self {
            documents,
            outcomes,
            cache,
            ocr,
            text_extractor,
            extractor,
            reconciler,
            ocr_policy,
            gen_policy,
        }
    }

    /// Analyze one document. Never returns an error: failures are captured
    /// on the document record instead.
    pub async fn analyze(&self, document_id: Uuid, profile: Option<Profile>) {
        let start = Instant::now();
        info!(
            subsystem = "jobs",
            component = "pipeline",
            document_id = %document_id,
            "Starting document analysis"
        );

        if let Err(e) = self.run(document_id, profile, start).await {
            let reason = truncate_chars(&e.to_string(), defaults::FAILURE_REASON_MAX_CHARS);
            error!(
                subsystem = "jobs",
                component = "pipeline",
                document_id = %document_id,
                error = %e,
                duration_ms = start.elapsed().as_millis() as u64,
                "Document analysis failed"
            );
            if let Err(mark_err) = self.documents.mark_failed(document_id, &reason).await {
                error!(
                    document_id = %document_id,
                    error = %mark_err,
                    "Failed to record analysis failure"
                );
            }
        }
    }

    async fn run(&self, document_id: Uuid, profile: Option<Profile>, start: Instant) -> Result<()> {
        let document = self.documents.fetch(document_id).await?;

        self.documents.mark_processing(document_id).await?;

        // Identical bytes may already have been analyzed for another
        // document; the cached computation is copied, but a fresh outcome
        // row is still persisted for this document.
        if let Some(cached) = self.cache.get(&document.fingerprint).await {
            info!(
                subsystem = "jobs",
                component = "pipeline",
                document_id = %document_id,
                fingerprint = %document.fingerprint,
                "Using cached analysis result"
            );
            let outcome = cached.to_outcome(document_id, start.elapsed().as_millis() as i64);
            self.outcomes.insert(&outcome).await?;
            self.cache.touch(&document.fingerprint).await;
            self.documents.mark_completed(document_id).await?;
            return Ok(());
        }

        let outcome = self.compute(&document, profile, start).await?;

        self.outcomes.insert(&outcome).await?;
        self.cache
            .put(&document.fingerprint, &CachedAnalysis::from_outcome(&outcome))
            .await;
        self.documents.mark_completed(document_id).await?;

        info!(
            subsystem = "jobs",
            component = "pipeline",
            document_id = %document_id,
            duration_ms = outcome.processing_ms,
            match_score = outcome.match_score,
            "Document analysis completed"
        );
        Ok(())
    }

    /// The cache-miss path: classify, extract text, grade, extract
    /// criteria, score and reconcile.
    async fn compute(
        &self,
        document: &Document,
        profile: Option<Profile>,
        start: Instant,
    ) -> Result<AnalysisOutcome> {
        let data = tokio::fs::read(&document.storage_path).await?;
        let mime = document.content_type.as_str();

        let needs_ocr = self.detect_needs_ocr(&data, mime).await;

        let raw_text = if needs_ocr {
            self.ocr_policy
                .run(|| self.ocr.recognize(&data, mime))
                .await?
        } else {
            self.text_extractor.extract(&data, mime).await?
        };

        // Quality grading only makes sense on the OCR path; an embedded
        // text layer is exact by construction.
        let (ocr_quality, ocr_warning) = if needs_ocr {
            let assessment = quality::assess(&raw_text);
            (assessment.quality, assessment.warning)
        } else {
            (OcrQuality::High, None)
        };

        let criteria = self
            .gen_policy
            .run(|| self.extractor.extract(&raw_text))
            .await?;

        // Score against the uploader's profile when one exists. Nothing is
        // stored on the offer itself: eligibility stays derived state.
        let (eligible, match_score) = match &profile {
            Some(profile) => {
                let candidate = criteria.to_offer(Utc::now().date_naive());
                (
                    eligibility::is_eligible(profile, &candidate),
                    eligibility::match_score(profile, &candidate),
                )
            }
            None => (false, 0),
        };

        self.reconciler
            .reconcile(&criteria, document.id, Utc::now().date_naive())
            .await?;

        Ok(AnalysisOutcome {
            document_id: document.id,
            criteria,
            match_score,
            eligible,
            ocr_quality,
            ocr_warning,
            extracted_text: truncate_chars(&raw_text, defaults::EXTRACTED_TEXT_MAX_CHARS),
            model: self.extractor.model_name().to_string(),
            processing_ms: start.elapsed().as_millis() as i64,
        })
    }

    /// Classify whether the document needs OCR. Fails open: when the
    /// detection capability is down (or its breaker is open), assuming
    /// "needs OCR" over-extracts rather than silently skipping content.
    async fn detect_needs_ocr(&self, data: &[u8], mime: &str) -> bool {
        match self
            .ocr_policy
            .run(|| self.ocr.detect_text(data, mime))
            .await
        {
            Ok(has_text) => has_text,
            Err(e) => {
                warn!(
                    subsystem = "jobs",
                    component = "pipeline",
                    error = %e,
                    "OCR-need detection failed, assuming OCR is needed"
                );
                true
            }
        }
    }
}

/// Truncate to at most `max` characters on a char boundary.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}
