//! Offer repository implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use zipfit_core::{
    Error, HousingCategory, Offer, OfferRepository, Provenance, Result,
};

const OFFER_COLUMNS: &str = "id, name, region, address, category, min_price, max_price, \
     min_age, max_age, min_income, max_income, min_household_members, max_household_members, \
     max_housing_owned, special_qualifications, preference_categories, \
     application_start, application_end, provenance, external_id, document_id, active";

/// PostgreSQL implementation of [`OfferRepository`].
#[derive(Clone)]
pub struct PgOfferRepository {
    pool: Pool<Postgres>,
}

impl PgOfferRepository {
    /// Create a new repository backed by the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> Offer {
        let category: String = row.get("category");
        let provenance: String = row.get("provenance");
        Offer {
            id: row.get("id"),
            name: row.get("name"),
            region: row.get("region"),
            address: row.get("address"),
            category: HousingCategory::parse(&category),
            min_price: row.get("min_price"),
            max_price: row.get("max_price"),
            min_age: row.get("min_age"),
            max_age: row.get("max_age"),
            min_income: row.get("min_income"),
            max_income: row.get("max_income"),
            min_household_members: row.get("min_household_members"),
            max_household_members: row.get("max_household_members"),
            max_housing_owned: row.get("max_housing_owned"),
            special_qualifications: row.get("special_qualifications"),
            preference_categories: row.get("preference_categories"),
            application_start: row.get("application_start"),
            application_end: row.get("application_end"),
            provenance: Provenance::parse(&provenance).unwrap_or(Provenance::Registry),
            external_id: row.get("external_id"),
            document_id: row.get("document_id"),
            active: row.get("active"),
        }
    }
}

#[async_trait]
impl OfferRepository for PgOfferRepository {
    async fn create(&self, offer: &Offer) -> Result<()> {
        sqlx::query(
            "INSERT INTO offers
                 (id, name, region, address, category, min_price, max_price,
                  min_age, max_age, min_income, max_income,
                  min_household_members, max_household_members, max_housing_owned,
                  special_qualifications, preference_categories,
                  application_start, application_end, provenance, external_id,
                  document_id, active)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                     $15, $16, $17, $18, $19, $20, $21, $22)",
        )
        .bind(offer.id)
        .bind(&offer.name)
        .bind(&offer.region)
        .bind(&offer.address)
        .bind(offer.category.as_str())
        .bind(offer.min_price)
        .bind(offer.max_price)
        .bind(offer.min_age)
        .bind(offer.max_age)
        .bind(offer.min_income)
        .bind(offer.max_income)
        .bind(offer.min_household_members)
        .bind(offer.max_household_members)
        .bind(offer.max_housing_owned)
        .bind(&offer.special_qualifications)
        .bind(&offer.preference_categories)
        .bind(offer.application_start)
        .bind(offer.application_end)
        .bind(offer.provenance.as_str())
        .bind(&offer.external_id)
        .bind(offer.document_id)
        .bind(offer.active)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Offer> {
        let row = sqlx::query(&format!("SELECT {} FROM offers WHERE id = $1", OFFER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.map(Self::parse_row).ok_or(Error::OfferNotFound(id))
    }

    async fn list_active(&self) -> Result<Vec<Offer>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM offers WHERE active = true ORDER BY application_end ASC",
            OFFER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_row).collect())
    }

    async fn list_active_by_region(&self, region: &str) -> Result<Vec<Offer>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM offers WHERE active = true AND region = $1
             ORDER BY application_end ASC",
            OFFER_COLUMNS
        ))
        .bind(region)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_row).collect())
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Offer>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM offers WHERE external_id = $1",
            OFFER_COLUMNS
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_row))
    }

    async fn update(&self, offer: &Offer) -> Result<()> {
        let result = sqlx::query(
            "UPDATE offers SET
                 name = $2, region = $3, address = $4, category = $5,
                 min_price = $6, max_price = $7, min_age = $8, max_age = $9,
                 min_income = $10, max_income = $11,
                 min_household_members = $12, max_household_members = $13,
                 max_housing_owned = $14, special_qualifications = $15,
                 preference_categories = $16, application_start = $17,
                 application_end = $18, active = $19
             WHERE id = $1",
        )
        .bind(offer.id)
        .bind(&offer.name)
        .bind(&offer.region)
        .bind(&offer.address)
        .bind(offer.category.as_str())
        .bind(offer.min_price)
        .bind(offer.max_price)
        .bind(offer.min_age)
        .bind(offer.max_age)
        .bind(offer.min_income)
        .bind(offer.max_income)
        .bind(offer.min_household_members)
        .bind(offer.max_household_members)
        .bind(offer.max_housing_owned)
        .bind(&offer.special_qualifications)
        .bind(&offer.preference_categories)
        .bind(offer.application_start)
        .bind(offer.application_end)
        .bind(offer.active)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::OfferNotFound(offer.id));
        }
        Ok(())
    }

    async fn mark_merged(&self, id: Uuid, document_id: Uuid) -> Result<()> {
        // Provenance only ever transitions registry → merged; other
        // provenances keep their value and just gain the document link.
        let result = sqlx::query(
            "UPDATE offers SET
                 provenance = CASE WHEN provenance = 'registry' THEN 'merged'
                                   ELSE provenance END,
                 document_id = $2
             WHERE id = $1",
        )
        .bind(id)
        .bind(document_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::OfferNotFound(id));
        }
        Ok(())
    }

    async fn deactivate_expired(&self, today: NaiveDate) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE offers SET active = false WHERE active = true AND application_end < $1",
        )
        .bind(today)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(result.rows_affected())
    }
}
