//! Document intake: the upload surface in front of the pipeline.
//!
//! Validation happens here, before pipeline entry: oversized uploads and
//! anything that is not a PDF, JPEG or PNG by magic bytes are rejected
//! synchronously. Accepted uploads are fingerprinted, stored, recorded as
//! PENDING and submitted to the worker; the returned document id is the
//! polling handle for status.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use zipfit_core::{
    file_safety, fingerprint, Document, DocumentRepository, DocumentStatus, Error,
    ProfileRepository, Result,
};

use crate::worker::AnalysisSubmitter;

/// Accepts uploads and schedules their analysis.
pub struct DocumentIntake {
    documents: Arc<dyn DocumentRepository>,
    profiles: Arc<dyn ProfileRepository>,
    submitter: AnalysisSubmitter,
    storage_dir: PathBuf,
}

impl DocumentIntake {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        profiles: Arc<dyn ProfileRepository>,
        submitter: AnalysisSubmitter,
        storage_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            documents,
            profiles,
            submitter,
            storage_dir: storage_dir.into(),
        }
    }

    /// Accept an upload: validate, fingerprint, persist, schedule.
    ///
    /// Returns the document id. The trigger returns as soon as the analysis
    /// is queued; callers poll the document for COMPLETED/FAILED.
    pub async fn accept(
        &self,
        user_id: Uuid,
        file_name: &str,
        declared_type: &str,
        data: &[u8],
    ) -> Result<Uuid> {
        let validation = file_safety::validate_upload(data, declared_type);
        if !validation.allowed {
            return Err(Error::InvalidInput(
                validation
                    .block_reason
                    .unwrap_or_else(|| "Upload rejected".to_string()),
            ));
        }
        let content_type = validation
            .detected_type
            .unwrap_or_else(|| declared_type.to_string());

        let document_id = Uuid::new_v4();
        let storage_path = self.storage_dir.join(document_id.to_string());
        tokio::fs::create_dir_all(&self.storage_dir).await?;
        tokio::fs::write(&storage_path, data).await?;

        let document = Document {
            id: document_id,
            user_id,
            file_name: file_name.to_string(),
            storage_path: storage_path.to_string_lossy().into_owned(),
            byte_size: data.len() as i64,
            content_type,
            fingerprint: fingerprint(data),
            status: DocumentStatus::Pending,
            failure_reason: None,
            created_at: Utc::now(),
        };
        self.documents.insert(&document).await?;

        // One profile read per run; the pipeline works on this snapshot.
        let profile = self.profiles.fetch(user_id).await?;

        self.submitter.submit(document_id, profile)?;

        info!(
            subsystem = "jobs",
            component = "intake",
            document_id = %document_id,
            user_id = %user_id,
            byte_size = data.len(),
            "Upload accepted and queued for analysis"
        );
        Ok(document_id)
    }
}
