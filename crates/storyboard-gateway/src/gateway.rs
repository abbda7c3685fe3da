//! The persistence contract the session depends on

use crate::error::PersistenceError;
use crate::types::{DocumentId, PersistedBlob, RecordId, StoreRequest};
use async_trait::async_trait;
use std::sync::Arc;

/// Dumb opaque blob store
///
/// Implementations promise nothing beyond "the last successful `store` for a
/// document is what `fetch_latest` returns". No atomicity, versioning or
/// conflict detection is assumed: concurrent writers simply overwrite each
/// other.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Most recently written blob for `document`, if any
    async fn fetch_latest(
        &self,
        document: &DocumentId,
    ) -> Result<Option<PersistedBlob>, PersistenceError>;

    /// Upsert the blob for `document`
    async fn store(
        &self,
        document: &DocumentId,
        request: StoreRequest,
    ) -> Result<RecordId, PersistenceError>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<G: PersistenceGateway + ?Sized> PersistenceGateway for Arc<G> {
    async fn fetch_latest(
        &self,
        document: &DocumentId,
    ) -> Result<Option<PersistedBlob>, PersistenceError> {
        (**self).fetch_latest(document).await
    }

    async fn store(
        &self,
        document: &DocumentId,
        request: StoreRequest,
    ) -> Result<RecordId, PersistenceError> {
        (**self).store(document, request).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
