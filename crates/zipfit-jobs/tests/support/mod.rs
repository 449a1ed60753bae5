//! In-memory fixtures for pipeline integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use zipfit_core::{
    AnalysisCache, AnalysisOutcome, CachedAnalysis, Document, DocumentRepository, Error, Offer,
    OfferRepository, OutcomeRepository, Profile, ProfileRepository, RegistryFeed, RegistryRecord,
    Result,
};
use zipfit_inference::{BreakerConfig, ResiliencePolicy, RetryConfig};

// =============================================================================
// REPOSITORY FIXTURES
// =============================================================================

#[derive(Default)]
pub struct MemoryDocumentRepository {
    docs: RwLock<HashMap<Uuid, Document>>,
}

impl MemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentRepository for MemoryDocumentRepository {
    async fn insert(&self, document: &Document) -> Result<()> {
        self.docs.write().await.insert(document.id, document.clone());
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Document> {
        self.docs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(Error::DocumentNotFound(id))
    }

    async fn mark_processing(&self, id: Uuid) -> Result<()> {
        let mut docs = self.docs.write().await;
        let doc = docs.get_mut(&id).ok_or(Error::DocumentNotFound(id))?;
        if doc.status != zipfit_core::DocumentStatus::Pending {
            return Err(Error::Job(format!("document {} is not pending", id)));
        }
        doc.status = zipfit_core::DocumentStatus::Processing;
        Ok(())
    }

    async fn mark_completed(&self, id: Uuid) -> Result<()> {
        let mut docs = self.docs.write().await;
        let doc = docs.get_mut(&id).ok_or(Error::DocumentNotFound(id))?;
        doc.status = zipfit_core::DocumentStatus::Completed;
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<()> {
        let mut docs = self.docs.write().await;
        let doc = docs.get_mut(&id).ok_or(Error::DocumentNotFound(id))?;
        doc.status = zipfit_core::DocumentStatus::Failed;
        doc.failure_reason = Some(reason.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryOutcomeRepository {
    outcomes: RwLock<HashMap<Uuid, AnalysisOutcome>>,
}

impl MemoryOutcomeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.outcomes.read().await.len()
    }
}

#[async_trait]
impl OutcomeRepository for MemoryOutcomeRepository {
    async fn insert(&self, outcome: &AnalysisOutcome) -> Result<()> {
        let mut outcomes = self.outcomes.write().await;
        if outcomes.contains_key(&outcome.document_id) {
            return Err(Error::Job(format!(
                "outcome already exists for document {}",
                outcome.document_id
            )));
        }
        outcomes.insert(outcome.document_id, outcome.clone());
        Ok(())
    }

    async fn fetch_for_document(&self, document_id: Uuid) -> Result<Option<AnalysisOutcome>> {
        Ok(self.outcomes.read().await.get(&document_id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryOfferRepository {
    offers: RwLock<HashMap<Uuid, Offer>>,
}

impl MemoryOfferRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.offers.read().await.len()
    }

    pub async fn all(&self) -> Vec<Offer> {
        self.offers.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl OfferRepository for MemoryOfferRepository {
    async fn create(&self, offer: &Offer) -> Result<()> {
        self.offers.write().await.insert(offer.id, offer.clone());
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Offer> {
        self.offers
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(Error::OfferNotFound(id))
    }

    async fn list_active(&self) -> Result<Vec<Offer>> {
        Ok(self
            .offers
            .read()
            .await
            .values()
            .filter(|o| o.active)
            .cloned()
            .collect())
    }

    async fn list_active_by_region(&self, region: &str) -> Result<Vec<Offer>> {
        Ok(self
            .offers
            .read()
            .await
            .values()
            .filter(|o| o.active && o.region == region)
            .cloned()
            .collect())
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Offer>> {
        Ok(self
            .offers
            .read()
            .await
            .values()
            .find(|o| o.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn update(&self, offer: &Offer) -> Result<()> {
        let mut offers = self.offers.write().await;
        if !offers.contains_key(&offer.id) {
            return Err(Error::OfferNotFound(offer.id));
        }
        offers.insert(offer.id, offer.clone());
        Ok(())
    }

    async fn mark_merged(&self, id: Uuid, document_id: Uuid) -> Result<()> {
        let mut offers = self.offers.write().await;
        let offer = offers.get_mut(&id).ok_or(Error::OfferNotFound(id))?;
        offer.merge_with_document(document_id);
        Ok(())
    }

    async fn deactivate_expired(&self, today: NaiveDate) -> Result<u64> {
        let mut offers = self.offers.write().await;
        let mut count = 0;
        for offer in offers.values_mut() {
            if offer.active && offer.is_expired(today) {
                offer.active = false;
                count += 1;
            }
        }
        Ok(count)
    }
}

#[derive(Default)]
pub struct MemoryProfileRepository {
    profiles: RwLock<HashMap<Uuid, Profile>>,
}

impl MemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileRepository for MemoryProfileRepository {
    async fn fetch(&self, user_id: Uuid) -> Result<Option<Profile>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn upsert(&self, profile: &Profile) -> Result<()> {
        self.profiles
            .write()
            .await
            .insert(profile.user_id, profile.clone());
        Ok(())
    }
}

// =============================================================================
// CACHE FIXTURE
// =============================================================================

#[derive(Default)]
pub struct MemoryAnalysisCache {
    entries: RwLock<HashMap<String, CachedAnalysis>>,
    touches: AtomicU32,
}

impl MemoryAnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, fingerprint: &str, analysis: CachedAnalysis) {
        self.entries
            .write()
            .await
            .insert(fingerprint.to_string(), analysis);
    }

    pub async fn contains(&self, fingerprint: &str) -> bool {
        self.entries.read().await.contains_key(fingerprint)
    }

    pub fn touch_count(&self) -> u32 {
        self.touches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisCache for MemoryAnalysisCache {
    async fn get(&self, fingerprint: &str) -> Option<CachedAnalysis> {
        self.entries.read().await.get(fingerprint).cloned()
    }

    async fn put(&self, fingerprint: &str, analysis: &CachedAnalysis) {
        self.entries
            .write()
            .await
            .insert(fingerprint.to_string(), analysis.clone());
    }

    async fn touch(&self, fingerprint: &str) {
        if self.entries.read().await.contains_key(fingerprint) {
            self.touches.fetch_add(1, Ordering::SeqCst);
        }
    }
}

// =============================================================================
// REGISTRY FEED FIXTURE
// =============================================================================

pub struct StaticRegistryFeed {
    records: Vec<RegistryRecord>,
}

impl StaticRegistryFeed {
    pub fn new(records: Vec<RegistryRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl RegistryFeed for StaticRegistryFeed {
    async fn fetch_records(&self, _from: NaiveDate) -> Result<Vec<RegistryRecord>> {
        Ok(self.records.clone())
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Initialize test logging from `RUST_LOG`. Safe to call repeatedly.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// A resilience policy with no retry delay, sized for tests.
pub fn fast_policy(service: &str) -> ResiliencePolicy {
    ResiliencePolicy::with_config(
        service,
        RetryConfig {
            max_retries: 0,
            base_delay: Duration::from_millis(1),
            call_timeout: Duration::from_secs(5),
        },
        BreakerConfig {
            failure_threshold: 100,
            cooldown: Duration::from_secs(1),
        },
    )
}

/// Shared repository bundle handed to pipelines and assertions.
pub struct Fixtures {
    pub documents: Arc<MemoryDocumentRepository>,
    pub outcomes: Arc<MemoryOutcomeRepository>,
    pub offers: Arc<MemoryOfferRepository>,
    pub profiles: Arc<MemoryProfileRepository>,
    pub cache: Arc<MemoryAnalysisCache>,
}

impl Fixtures {
    pub fn new() -> Self {
        init_logging();
        Self {
            documents: Arc::new(MemoryDocumentRepository::new()),
            outcomes: Arc::new(MemoryOutcomeRepository::new()),
            offers: Arc::new(MemoryOfferRepository::new()),
            profiles: Arc::new(MemoryProfileRepository::new()),
            cache: Arc::new(MemoryAnalysisCache::new()),
        }
    }
}

/// The reference profile from the matching examples: 30 years old, 50M KRW
/// income, household of two, no housing owned, prefers 서울.
pub fn reference_profile(user_id: Uuid) -> Profile {
    Profile {
        user_id,
        age: 30,
        annual_income: 50_000_000,
        household_members: 2,
        housing_owned: 0,
        preferred_regions: vec!["서울".to_string()],
    }
}

/// A model reply describing an offer the reference profile qualifies for.
pub const ELIGIBLE_CRITERIA_JSON: &str = r#"{
    "name": "강남 헤리티지",
    "region": "서울",
    "address": "서울특별시 강남구",
    "housing_category": "아파트",
    "min_age": 19,
    "max_age": 65,
    "min_income": 30000000,
    "max_income": 100000000,
    "min_household_members": 1,
    "max_household_members": 5,
    "max_housing_owned": 0,
    "application_period": "2026-12-31"
}"#;

/// OCR text long and Korean-dense enough to grade HIGH.
pub fn high_quality_text() -> String {
    "청약 자격 1순위 소득 12345 기준 공고 안내 ".repeat(30)
}

/// Write document bytes to a temp dir and register a PENDING document.
pub async fn store_document(
    fixtures: &Fixtures,
    dir: &std::path::Path,
    user_id: Uuid,
    data: &[u8],
    content_type: &str,
) -> Document {
    let id = Uuid::new_v4();
    let path = dir.join(id.to_string());
    tokio::fs::write(&path, data).await.unwrap();

    let document = Document {
        id,
        user_id,
        file_name: "공고문.pdf".to_string(),
        storage_path: path.to_string_lossy().into_owned(),
        byte_size: data.len() as i64,
        content_type: content_type.to_string(),
        fingerprint: zipfit_core::fingerprint(data),
        status: zipfit_core::DocumentStatus::Pending,
        failure_reason: None,
        created_at: chrono::Utc::now(),
    };
    fixtures.documents.insert(&document).await.unwrap();
    document
}
