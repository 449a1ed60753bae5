//! Document repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use zipfit_core::{Document, DocumentRepository, DocumentStatus, Error, Result};

/// PostgreSQL implementation of [`DocumentRepository`].
#[derive(Clone)]
pub struct PgDocumentRepository {
    pool: Pool<Postgres>,
}

impl PgDocumentRepository {
    /// Create a new repository backed by the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> Document {
        let status: String = row.get("status");
        Document {
            id: row.get("id"),
            user_id: row.get("user_id"),
            file_name: row.get("file_name"),
            storage_path: row.get("storage_path"),
            byte_size: row.get("byte_size"),
            content_type: row.get("content_type"),
            fingerprint: row.get("fingerprint"),
            status: DocumentStatus::parse(&status).unwrap_or(DocumentStatus::Failed),
            failure_reason: row.get("failure_reason"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn insert(&self, document: &Document) -> Result<()> {
        sqlx::query(
            "INSERT INTO documents
                 (id, user_id, file_name, storage_path, byte_size, content_type,
                  fingerprint, status, failure_reason, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(document.id)
        .bind(document.user_id)
        .bind(&document.file_name)
        .bind(&document.storage_path)
        .bind(document.byte_size)
        .bind(&document.content_type)
        .bind(&document.fingerprint)
        .bind(document.status.as_str())
        .bind(&document.failure_reason)
        .bind(document.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Document> {
        let row = sqlx::query(
            "SELECT id, user_id, file_name, storage_path, byte_size, content_type,
                    fingerprint, status, failure_reason, created_at
             FROM documents WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(Self::parse_row).ok_or(Error::DocumentNotFound(id))
    }

    async fn mark_processing(&self, id: Uuid) -> Result<()> {
        // The PENDING → PROCESSING transition happens exactly once, at
        // pipeline start.
        let result = sqlx::query(
            "UPDATE documents SET status = 'processing' WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::Job(format!("document {} is not pending", id)));
        }
        Ok(())
    }

    async fn mark_completed(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("UPDATE documents SET status = 'completed' WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::DocumentNotFound(id));
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE documents SET status = 'failed', failure_reason = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::DocumentNotFound(id));
        }
        Ok(())
    }
}
