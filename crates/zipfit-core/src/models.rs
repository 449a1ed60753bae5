//! Core data models for zipfit.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults;

// =============================================================================
// PROFILE
// =============================================================================

/// A user's attributes used to evaluate eligibility.
///
/// Treated as an immutable snapshot for the duration of an evaluation;
/// mutation happens only through an explicit profile update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub user_id: Uuid,
    pub age: i32,
    /// Annual income in KRW.
    pub annual_income: i64,
    pub household_members: i32,
    pub housing_owned: i32,
    /// Ordered preferred region tokens, e.g. ["서울", "경기"].
    pub preferred_regions: Vec<String>,
}

impl Profile {
    /// Preferred region tokens, trimmed, empty tokens dropped.
    pub fn region_tokens(&self) -> impl Iterator<Item = &str> {
        self.preferred_regions
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
    }
}

// =============================================================================
// OFFER
// =============================================================================

/// Housing category of an offer, parsed from free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HousingCategory {
    Apartment,
    Officetel,
    Villa,
    Townhouse,
    Etc,
}

impl HousingCategory {
    /// Parse a category from announcement free text by keyword containment.
    pub fn from_text(text: Option<&str>) -> Self {
        let Some(text) = text else {
            return Self::Etc;
        };
        let normalized = text.trim();
        if normalized.contains("아파트") {
            Self::Apartment
        } else if normalized.contains("오피스텔") {
            Self::Officetel
        } else if normalized.contains("빌라") {
            Self::Villa
        } else if normalized.contains("타운하우스") {
            Self::Townhouse
        } else {
            Self::Etc
        }
    }

    /// Stable string form used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Apartment => "apartment",
            Self::Officetel => "officetel",
            Self::Villa => "villa",
            Self::Townhouse => "townhouse",
            Self::Etc => "etc",
        }
    }

    /// Parse the storage string form. Unknown values map to `Etc`.
    pub fn parse(s: &str) -> Self {
        match s {
            "apartment" => Self::Apartment,
            "officetel" => Self::Officetel,
            "villa" => Self::Villa,
            "townhouse" => Self::Townhouse,
            _ => Self::Etc,
        }
    }
}

/// Origin lineage of an offer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Sourced from the external registry feed.
    Registry,
    /// Created from an uploaded document.
    Document,
    /// Registry record enriched with an uploaded document.
    Merged,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registry => "registry",
            Self::Document => "document",
            Self::Merged => "merged",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "registry" => Some(Self::Registry),
            "document" => Some(Self::Document),
            "merged" => Some(Self::Merged),
            _ => None,
        }
    }
}

/// A time-boxed housing-subscription opportunity with eligibility criteria.
///
/// A `None` bound means the offer is unrestricted on that side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Offer {
    pub id: Uuid,
    pub name: String,
    /// Region, e.g. "서울", "경기".
    pub region: String,
    pub address: Option<String>,
    pub category: HousingCategory,
    /// Price bounds in KRW.
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    /// Income bounds in KRW.
    pub min_income: Option<i64>,
    pub max_income: Option<i64>,
    pub min_household_members: Option<i32>,
    pub max_household_members: Option<i32>,
    pub max_housing_owned: Option<i32>,
    pub special_qualifications: Option<String>,
    pub preference_categories: Option<String>,
    pub application_start: NaiveDate,
    pub application_end: NaiveDate,
    pub provenance: Provenance,
    /// External id from the registry feed, when registry-sourced.
    pub external_id: Option<String>,
    /// Uploaded document this offer was created from or merged with.
    pub document_id: Option<Uuid>,
    pub active: bool,
}

impl Offer {
    /// Whether the application window has closed relative to `today`.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        today > self.application_end
    }

    /// Record a merge with an uploaded document.
    ///
    /// Provenance only ever transitions Registry → Merged; a document- or
    /// merged-provenance offer just gains the document link. Registry-sourced
    /// attribute values are never overwritten here.
    pub fn merge_with_document(&mut self, document_id: Uuid) {
        if self.provenance == Provenance::Registry {
            self.provenance = Provenance::Merged;
        }
        self.document_id = Some(document_id);
    }
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// Processing lifecycle of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Terminal states admit no further transition; re-entry requires a
    /// fresh upload.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// An uploaded announcement document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub storage_path: String,
    pub byte_size: i64,
    pub content_type: String,
    /// SHA-256 hex digest of the raw bytes; the cache key.
    pub fingerprint: String,
    pub status: DocumentStatus,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// ANALYSIS OUTCOME
// =============================================================================

/// Confidence tier of an OCR extraction. Ordered LOW < MEDIUM < HIGH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OcrQuality {
    Low,
    Medium,
    High,
}

impl OcrQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            _ => None,
        }
    }
}

/// Result of analyzing one document. 1:1 with `Document`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisOutcome {
    pub document_id: Uuid,
    pub criteria: OfferCriteria,
    /// Match score against the uploader's profile, 0 when no profile.
    pub match_score: i32,
    pub eligible: bool,
    pub ocr_quality: OcrQuality,
    pub ocr_warning: Option<String>,
    /// Raw extracted text, truncated to `EXTRACTED_TEXT_MAX_CHARS`.
    pub extracted_text: String,
    /// Identifier of the model that produced the extraction.
    pub model: String,
    pub processing_ms: i64,
}

/// Cacheable portion of an analysis, shared across documents with identical
/// bytes. Excludes the document scoping; a fresh outcome row is persisted
/// per document even on a cache hit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedAnalysis {
    pub criteria: OfferCriteria,
    pub match_score: i32,
    pub eligible: bool,
    pub ocr_quality: OcrQuality,
    pub ocr_warning: Option<String>,
    pub extracted_text: String,
    pub model: String,
}

impl CachedAnalysis {
    /// Build the cache payload from a computed outcome.
    pub fn from_outcome(outcome: &AnalysisOutcome) -> Self {
        Self {
            criteria: outcome.criteria.clone(),
            match_score: outcome.match_score,
            eligible: outcome.eligible,
            ocr_quality: outcome.ocr_quality,
            ocr_warning: outcome.ocr_warning.clone(),
            extracted_text: outcome.extracted_text.clone(),
            model: outcome.model.clone(),
        }
    }

    /// Rehydrate an outcome scoped to a different document.
    pub fn to_outcome(&self, document_id: Uuid, processing_ms: i64) -> AnalysisOutcome {
        AnalysisOutcome {
            document_id,
            criteria: self.criteria.clone(),
            match_score: self.match_score,
            eligible: self.eligible,
            ocr_quality: self.ocr_quality,
            ocr_warning: self.ocr_warning.clone(),
            extracted_text: self.extracted_text.clone(),
            model: self.model.clone(),
            processing_ms,
        }
    }
}

// =============================================================================
// EXTRACTED CRITERIA
// =============================================================================

/// Structured criteria extracted from an announcement document.
///
/// Every field is optional: the extractor resolves fields independently and
/// a missing or unreadable field must not sink the rest of the extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OfferCriteria {
    pub name: Option<String>,
    pub region: Option<String>,
    pub address: Option<String>,
    pub housing_category: Option<String>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub min_income: Option<i64>,
    pub max_income: Option<i64>,
    pub min_household_members: Option<i32>,
    pub max_household_members: Option<i32>,
    pub max_housing_owned: Option<i32>,
    pub special_qualifications: Option<String>,
    pub preference_categories: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub application_period: Option<String>,
}

impl OfferCriteria {
    /// Materialize an offer from extracted criteria.
    ///
    /// The application window defaults to [today, today + 30 days] when the
    /// period text does not carry a parseable `YYYY-MM-DD` end date.
    pub fn to_offer(&self, today: NaiveDate) -> Offer {
        Offer {
            id: Uuid::new_v4(),
            name: self.name.clone().unwrap_or_default(),
            region: self.region.clone().unwrap_or_default(),
            address: self.address.clone(),
            category: HousingCategory::from_text(self.housing_category.as_deref()),
            min_price: self.min_price,
            max_price: self.max_price,
            min_age: self.min_age,
            max_age: self.max_age,
            min_income: self.min_income,
            max_income: self.max_income,
            min_household_members: self.min_household_members,
            max_household_members: self.max_household_members,
            max_housing_owned: self.max_housing_owned,
            special_qualifications: self.special_qualifications.clone(),
            preference_categories: self.preference_categories.clone(),
            application_start: today,
            application_end: parse_application_end(self.application_period.as_deref(), today),
            provenance: Provenance::Document,
            external_id: None,
            document_id: None,
            active: true,
        }
    }
}

/// Parse an application end date out of the free-text period field.
fn parse_application_end(period: Option<&str>, today: NaiveDate) -> NaiveDate {
    let fallback = today + Duration::days(defaults::DEFAULT_APPLICATION_WINDOW_DAYS);
    let Some(period) = period else {
        return fallback;
    };
    NaiveDate::parse_from_str(period.trim(), "%Y-%m-%d").unwrap_or(fallback)
}

// =============================================================================
// REGISTRY FEED
// =============================================================================

/// A candidate offer record produced by the registry feed collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistryRecord {
    pub external_id: String,
    pub name: String,
    pub region: String,
    pub address: Option<String>,
    pub housing_category: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub application_start: NaiveDate,
    pub application_end: NaiveDate,
}

impl RegistryRecord {
    /// Materialize a registry-sourced offer from a feed record.
    pub fn to_offer(&self) -> Offer {
        Offer {
            id: Uuid::new_v4(),
            name: self.name.clone(),
            region: self.region.clone(),
            address: self.address.clone(),
            category: HousingCategory::from_text(self.housing_category.as_deref()),
            min_price: self.min_price,
            max_price: self.max_price,
            min_age: None,
            max_age: None,
            min_income: None,
            max_income: None,
            min_household_members: None,
            max_household_members: None,
            max_housing_owned: None,
            special_qualifications: None,
            preference_categories: None,
            application_start: self.application_start,
            application_end: self.application_end,
            provenance: Provenance::Registry,
            external_id: Some(self.external_id.clone()),
            document_id: None,
            active: true,
        }
    }
}
