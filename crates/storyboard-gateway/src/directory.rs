//! Gateway writing one JSON record file per document

use crate::error::PersistenceError;
use crate::gateway::PersistenceGateway;
use crate::types::{DocumentId, PersistedBlob, RecordId, StoreRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use ulid::Ulid;

#[derive(Debug, Serialize, Deserialize)]
struct RecordFile {
    record_id: RecordId,
    title: String,
    data: String,
    updated_at: DateTime<Utc>,
}

/// Stores `<root>/<document_id>.json`, replaced atomically on every store
#[derive(Debug, Clone)]
pub struct DirectoryGateway {
    root: PathBuf,
}

impl DirectoryGateway {
    /// Use `root` as the record directory; created on first store
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Record directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the record file for `document`
    #[must_use]
    pub fn record_path(&self, document: &DocumentId) -> PathBuf {
        self.root.join(format!("{document}.json"))
    }

    /// Per-write temp file next to the record, unique so writers never share one
    fn staging_path(&self, document: &DocumentId) -> PathBuf {
        self.root.join(format!(".{document}.{}.tmp", Ulid::new()))
    }

    async fn read_record(&self, document: &DocumentId) -> Result<Option<RecordFile>, PersistenceError> {
        let path = self.record_path(document);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| PersistenceError::MalformedRecord(format!("{}: {e}", path.display())))
    }
}

#[async_trait]
impl PersistenceGateway for DirectoryGateway {
    async fn fetch_latest(
        &self,
        document: &DocumentId,
    ) -> Result<Option<PersistedBlob>, PersistenceError> {
        Ok(self.read_record(document).await?.map(|record| PersistedBlob {
            record_id: record.record_id,
            data: record.data,
            updated_at: Some(record.updated_at),
        }))
    }

    async fn store(
        &self,
        document: &DocumentId,
        request: StoreRequest,
    ) -> Result<RecordId, PersistenceError> {
        tokio::fs::create_dir_all(&self.root).await?;

        // A record that no longer parses is replaced under a fresh id.
        let record_id = match self.read_record(document).await {
            Ok(Some(existing)) => existing.record_id,
            Ok(None) | Err(PersistenceError::MalformedRecord(_)) => RecordId::generate(),
            Err(e) => return Err(e),
        };

        let record = RecordFile {
            record_id: record_id.clone(),
            title: request.title,
            data: request.data,
            updated_at: Utc::now(),
        };
        let bytes = serde_json::to_vec_pretty(&record)
            .map_err(|e| PersistenceError::MalformedRecord(e.to_string()))?;

        let path = self.record_path(document);
        let staging = self.staging_path(document);
        tokio::fs::write(&staging, bytes).await?;
        if let Err(error) = tokio::fs::rename(&staging, &path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(error.into());
        }

        tracing::debug!(path = %path.display(), record = %record_id, "wrote storyboard record");
        Ok(record_id)
    }

    fn name(&self) -> &'static str {
        "directory"
    }
}
