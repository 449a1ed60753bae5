//! Profile repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use zipfit_core::{Error, Profile, ProfileRepository, Result};

/// PostgreSQL implementation of [`ProfileRepository`].
///
/// Preferred regions are stored as one comma-separated text column and
/// split back into ordered tokens on read.
#[derive(Clone)]
pub struct PgProfileRepository {
    pool: Pool<Postgres>,
}

impl PgProfileRepository {
    /// Create a new repository backed by the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> Profile {
        let regions: Option<String> = row.get("preferred_regions");
        Profile {
            user_id: row.get("user_id"),
            age: row.get("age"),
            annual_income: row.get("annual_income"),
            household_members: row.get("household_members"),
            housing_owned: row.get("housing_owned"),
            preferred_regions: split_regions(regions.as_deref()),
        }
    }
}

fn split_regions(stored: Option<&str>) -> Vec<String> {
    match stored {
        Some(s) if !s.trim().is_empty() => s
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn join_regions(regions: &[String]) -> Option<String> {
    if regions.is_empty() {
        None
    } else {
        Some(regions.join(","))
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn fetch(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let row = sqlx::query(
            "SELECT user_id, age, annual_income, household_members, housing_owned,
                    preferred_regions
             FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_row))
    }

    async fn upsert(&self, profile: &Profile) -> Result<()> {
        sqlx::query(
            "INSERT INTO profiles
                 (user_id, age, annual_income, household_members, housing_owned,
                  preferred_regions)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (user_id) DO UPDATE SET
                 age = EXCLUDED.age,
                 annual_income = EXCLUDED.annual_income,
                 household_members = EXCLUDED.household_members,
                 housing_owned = EXCLUDED.housing_owned,
                 preferred_regions = EXCLUDED.preferred_regions",
        )
        .bind(profile.user_id)
        .bind(profile.age)
        .bind(profile.annual_income)
        .bind(profile.household_members)
        .bind(profile.housing_owned)
        .bind(join_regions(&profile.preferred_regions))
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }
}
