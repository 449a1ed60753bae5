//! # zipfit-db
//!
//! PostgreSQL database layer for zipfit.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for documents, analysis outcomes, offers
//!   and profiles
//!
//! Schema provisioning is managed externally; queries bind at runtime and
//! assume the tables `documents`, `analysis_outcomes` (unique on
//! `document_id`), `offers` and `profiles` exist.
//!
//! ## Example
//!
//! ```rust,ignore
//! use zipfit_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/zipfit").await?;
//!     let document = db.documents.fetch(document_id).await?;
//!     println!("status: {:?}", document.status);
//!     Ok(())
//! }
//! ```

pub mod documents;
pub mod offers;
pub mod outcomes;
pub mod pool;
pub mod profiles;

// Re-export core types
pub use zipfit_core::*;

pub use documents::PgDocumentRepository;
pub use offers::PgOfferRepository;
pub use outcomes::PgOutcomeRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use profiles::PgProfileRepository;

/// Bundle of repositories sharing one connection pool.
#[derive(Clone)]
pub struct Database {
    pub documents: PgDocumentRepository,
    pub outcomes: PgOutcomeRepository,
    pub offers: PgOfferRepository,
    pub profiles: PgProfileRepository,
}

impl Database {
    /// Connect with default pool configuration.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        Ok(Self::from_pool(pool))
    }

    /// Build the repository bundle from an existing pool.
    pub fn from_pool(pool: sqlx::PgPool) -> Self {
        Self {
            documents: PgDocumentRepository::new(pool.clone()),
            outcomes: PgOutcomeRepository::new(pool.clone()),
            offers: PgOfferRepository::new(pool.clone()),
            profiles: PgProfileRepository::new(pool),
        }
    }
}
