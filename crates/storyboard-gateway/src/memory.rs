//! In-process gateway

use crate::error::PersistenceError;
use crate::gateway::PersistenceGateway;
use crate::types::{DocumentId, PersistedBlob, RecordId, StoreRequest};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
struct MemoryRecord {
    title: String,
    blob: PersistedBlob,
}

/// Gateway holding records in a map; each store replaces the previous record
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    records: Mutex<HashMap<DocumentId, MemoryRecord>>,
    stores: AtomicUsize,
}

impl InMemoryGateway {
    /// Create an empty gateway
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, bypassing the store counter
    pub fn insert_raw(&self, document: &DocumentId, data: impl Into<String>) {
        let record = MemoryRecord {
            title: String::new(),
            blob: PersistedBlob {
                record_id: RecordId::generate(),
                data: data.into(),
                updated_at: Some(Utc::now()),
            },
        };
        self.records.lock().insert(document.clone(), record);
    }

    /// Number of successful `store` calls so far
    #[inline]
    #[must_use]
    pub fn store_count(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    /// Number of documents held
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Nothing stored yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Title of the stored record
    #[must_use]
    pub fn title(&self, document: &DocumentId) -> Option<String> {
        self.records
            .lock()
            .get(document)
            .map(|record| record.title.clone())
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn fetch_latest(
        &self,
        document: &DocumentId,
    ) -> Result<Option<PersistedBlob>, PersistenceError> {
        Ok(self
            .records
            .lock()
            .get(document)
            .map(|record| record.blob.clone()))
    }

    async fn store(
        &self,
        document: &DocumentId,
        request: StoreRequest,
    ) -> Result<RecordId, PersistenceError> {
        let mut records = self.records.lock();
        let record_id = records
            .get(document)
            .map_or_else(RecordId::generate, |existing| existing.blob.record_id.clone());
        records.insert(
            document.clone(),
            MemoryRecord {
                title: request.title,
                blob: PersistedBlob {
                    record_id: record_id.clone(),
                    data: request.data,
                    updated_at: Some(Utc::now()),
                },
            },
        );
        self.stores.fetch_add(1, Ordering::SeqCst);
        Ok(record_id)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
