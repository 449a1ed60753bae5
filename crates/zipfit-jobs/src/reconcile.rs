//! Duplicate reconciliation between extracted criteria and stored offers.
//!
//! A document often announces an offer the registry feed already delivered.
//! Instead of creating a duplicate, the reconciler merges the document into
//! the existing record. Matching is deliberately loose (substring on the
//! name plus exact region equality) and lives behind [`DuplicateMatcher`]
//! so a fuzzier strategy can replace it without touching the pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use zipfit_core::{Offer, OfferCriteria, OfferRepository, Result};

/// Strategy for locating an existing offer that matches extracted criteria.
#[async_trait]
pub trait DuplicateMatcher: Send + Sync {
    /// Find a stored offer that describes the same real-world announcement.
    async fn find_duplicate(
        &self,
        criteria: &OfferCriteria,
        offers: &dyn OfferRepository,
    ) -> Result<Option<Offer>>;
}

/// Default matcher: the stored name contains the extracted name and the
/// regions are exactly equal, over active offers only.
///
/// False negatives are expected (renamed complexes, region granularity
/// drift); false positives are rare because both conditions must hold.
pub struct NameRegionMatcher;

#[async_trait]
impl DuplicateMatcher for NameRegionMatcher {
    async fn find_duplicate(
        &self,
        criteria: &OfferCriteria,
        offers: &dyn OfferRepository,
    ) -> Result<Option<Offer>> {
        let (Some(name), Some(region)) = (criteria.name.as_deref(), criteria.region.as_deref())
        else {
            return Ok(None);
        };

        let active = offers.list_active().await?;
        Ok(active
            .into_iter()
            .find(|offer| offer.name.contains(name) && offer.region == region))
    }
}

/// How a reconciliation run resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Document merged into an existing offer.
    Merged(Uuid),
    /// A fresh document-sourced offer was created.
    Created(Uuid),
}

impl ReconcileOutcome {
    /// The id of the offer the document ended up attached to.
    pub fn offer_id(&self) -> Uuid {
        match self {
            Self::Merged(id) | Self::Created(id) => *id,
        }
    }
}

/// Reconciles extracted criteria against the offer store.
pub struct DuplicateReconciler {
    offers: Arc<dyn OfferRepository>,
    matcher: Arc<dyn DuplicateMatcher>,
}

impl DuplicateReconciler {
    /// Create a reconciler with the default name/region matcher.
    pub fn new(offers: Arc<dyn OfferRepository>) -> Self {
        Self::with_matcher(offers, Arc::new(NameRegionMatcher))
    }

    /// Create a reconciler with a custom matching strategy.
    pub fn with_matcher(offers: Arc<dyn OfferRepository>, matcher: Arc<dyn DuplicateMatcher>) -> Self {
        Self { offers, matcher }
    }

    /// Merge the document into a matching offer, or create a new
    /// document-sourced offer.
    ///
    /// On merge, registry-sourced attribute values are never overwritten by
    /// document-derived ones; only the provenance transition and the
    /// document link are recorded.
    pub async fn reconcile(
        &self,
        criteria: &OfferCriteria,
        document_id: Uuid,
        today: NaiveDate,
    ) -> Result<ReconcileOutcome> {
        if let Some(existing) = self
            .matcher
            .find_duplicate(criteria, self.offers.as_ref())
            .await?
        {
            info!(
                subsystem = "jobs",
                component = "reconcile",
                offer_id = %existing.id,
                document_id = %document_id,
                "Merging document into existing offer"
            );
            self.offers.mark_merged(existing.id, document_id).await?;
            return Ok(ReconcileOutcome::Merged(existing.id));
        }

        let mut offer = criteria.to_offer(today);
        offer.document_id = Some(document_id);

        debug!(
            subsystem = "jobs",
            component = "reconcile",
            offer_id = %offer.id,
            name = %offer.name,
            "Creating offer from document"
        );
        self.offers.create(&offer).await?;
        Ok(ReconcileOutcome::Created(offer.id))
    }
}
