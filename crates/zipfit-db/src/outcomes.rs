//! Analysis outcome repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use zipfit_core::{
    AnalysisOutcome, Error, OcrQuality, OfferCriteria, OutcomeRepository, Result,
};

/// PostgreSQL implementation of [`OutcomeRepository`].
///
/// `analysis_outcomes.document_id` carries a unique constraint; the 1:1
/// document/outcome invariant is enforced by storage.
#[derive(Clone)]
pub struct PgOutcomeRepository {
    pool: Pool<Postgres>,
}

impl PgOutcomeRepository {
    /// Create a new repository backed by the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> AnalysisOutcome {
        let quality: String = row.get("ocr_quality");
        AnalysisOutcome {
            document_id: row.get("document_id"),
            criteria: OfferCriteria {
                name: row.get("name"),
                region: row.get("region"),
                address: row.get("address"),
                housing_category: row.get("housing_category"),
                min_age: row.get("min_age"),
                max_age: row.get("max_age"),
                min_income: row.get("min_income"),
                max_income: row.get("max_income"),
                min_household_members: row.get("min_household_members"),
                max_household_members: row.get("max_household_members"),
                max_housing_owned: row.get("max_housing_owned"),
                special_qualifications: row.get("special_qualifications"),
                preference_categories: row.get("preference_categories"),
                min_price: row.get("min_price"),
                max_price: row.get("max_price"),
                application_period: row.get("application_period"),
            },
            match_score: row.get("match_score"),
            eligible: row.get("eligible"),
            ocr_quality: OcrQuality::parse(&quality).unwrap_or(OcrQuality::Low),
            ocr_warning: row.get("ocr_warning"),
            extracted_text: row.get("extracted_text"),
            model: row.get("model"),
            processing_ms: row.get("processing_ms"),
        }
    }
}

#[async_trait]
impl OutcomeRepository for PgOutcomeRepository {
    async fn insert(&self, outcome: &AnalysisOutcome) -> Result<()> {
        sqlx::query(
            "INSERT INTO analysis_outcomes
                 (document_id, name, region, address, housing_category,
                  min_age, max_age, min_income, max_income,
                  min_household_members, max_household_members, max_housing_owned,
                  special_qualifications, preference_categories, min_price, max_price,
                  application_period, match_score, eligible, ocr_quality, ocr_warning,
                  extracted_text, model, processing_ms)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                     $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)",
        )
        .bind(outcome.document_id)
        .bind(&outcome.criteria.name)
        .bind(&outcome.criteria.region)
        .bind(&outcome.criteria.address)
        .bind(&outcome.criteria.housing_category)
        .bind(outcome.criteria.min_age)
        .bind(outcome.criteria.max_age)
        .bind(outcome.criteria.min_income)
        .bind(outcome.criteria.max_income)
        .bind(outcome.criteria.min_household_members)
        .bind(outcome.criteria.max_household_members)
        .bind(outcome.criteria.max_housing_owned)
        .bind(&outcome.criteria.special_qualifications)
        .bind(&outcome.criteria.preference_categories)
        .bind(outcome.criteria.min_price)
        .bind(outcome.criteria.max_price)
        .bind(&outcome.criteria.application_period)
        .bind(outcome.match_score)
        .bind(outcome.eligible)
        .bind(outcome.ocr_quality.as_str())
        .bind(&outcome.ocr_warning)
        .bind(&outcome.extracted_text)
        .bind(&outcome.model)
        .bind(outcome.processing_ms)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn fetch_for_document(&self, document_id: Uuid) -> Result<Option<AnalysisOutcome>> {
        let row = sqlx::query(
            "SELECT document_id, name, region, address, housing_category,
                    min_age, max_age, min_income, max_income,
                    min_household_members, max_household_members, max_housing_owned,
                    special_qualifications, preference_categories, min_price, max_price,
                    application_period, match_score, eligible, ocr_quality, ocr_warning,
                    extracted_text, model, processing_ms
             FROM analysis_outcomes WHERE document_id = $1",
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_row))
    }
}
