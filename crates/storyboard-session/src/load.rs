//! Opening a document: fetch, decrypt, rebuild
//!
//! Loading never fails. Whatever goes wrong, the caller gets an editable
//! document and a [`LoadReport`] saying how it was obtained.

use std::fmt;
use storyboard_codec::{CryptoCodec, DecodeError};
use storyboard_gateway::{DocumentId, PersistenceError, PersistenceGateway, RecordId};
use storyboard_graph::{GraphDocument, LoadWarning, ValidationError};

/// How the initial document was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    /// Nothing stored yet
    Fresh,
    /// Decrypted and rebuilt from the stored record
    Restored {
        /// Record the document came from
        record: RecordId,
    },
    /// Stored blob could not be decrypted
    Undecodable(DecodeError),
    /// Blob decrypted but is not a usable document
    Malformed(ValidationError),
    /// Gateway could not be read
    FetchFailed(PersistenceError),
}

impl LoadSource {
    /// Whether the stored copy could not be used and an empty document was
    /// substituted
    #[inline]
    #[must_use]
    pub fn is_recovery(&self) -> bool {
        matches!(
            self,
            Self::Undecodable(_) | Self::Malformed(_) | Self::FetchFailed(_)
        )
    }
}

impl fmt::Display for LoadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fresh => f.write_str("new storyboard"),
            Self::Restored { record } => write!(f, "restored from record {record}"),
            Self::Undecodable(e) => {
                write!(f, "stored storyboard could not be decrypted ({e}); starting empty")
            }
            Self::Malformed(e) => {
                write!(f, "stored storyboard is unreadable ({e}); starting empty")
            }
            Self::FetchFailed(e) => {
                write!(f, "could not load storyboard ({e}); starting empty")
            }
        }
    }
}

/// Outcome of opening a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Where the document came from
    pub source: LoadSource,
    /// Entries dropped while rebuilding a restored document
    pub warnings: Vec<LoadWarning>,
}

impl LoadReport {
    /// Lines worth showing to the user, empty for a clean load
    #[must_use]
    pub fn notices(&self) -> Vec<String> {
        let mut notices = Vec::with_capacity(self.warnings.len() + 1);
        if self.source.is_recovery() {
            notices.push(self.source.to_string());
        }
        notices.extend(self.warnings.iter().map(ToString::to_string));
        notices
    }
}

/// Fetch the latest blob for `document_id` and turn it into a document
pub async fn load_document(
    gateway: &dyn PersistenceGateway,
    codec: &CryptoCodec,
    document_id: &DocumentId,
) -> (GraphDocument, LoadReport) {
    let blob = match gateway.fetch_latest(document_id).await {
        Ok(Some(blob)) => blob,
        Ok(None) => {
            tracing::info!(document = %document_id, gateway = gateway.name(), "no stored storyboard, starting fresh");
            return (GraphDocument::new(), report(LoadSource::Fresh));
        }
        Err(error) => {
            tracing::warn!(document = %document_id, %error, "fetch failed, starting empty");
            return (GraphDocument::new(), report(LoadSource::FetchFailed(error)));
        }
    };

    let value: serde_json::Value = match codec.decrypt(&blob.data) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(document = %document_id, %error, "stored blob undecodable, starting empty");
            return (GraphDocument::new(), report(LoadSource::Undecodable(error)));
        }
    };

    match GraphDocument::from_value(value) {
        Ok(restored) => {
            tracing::info!(
                document = %document_id,
                record = %blob.record_id,
                nodes = restored.document.node_count(),
                edges = restored.document.edge_count(),
                dropped = restored.warnings.len(),
                "storyboard restored"
            );
            (
                restored.document,
                LoadReport {
                    source: LoadSource::Restored {
                        record: blob.record_id,
                    },
                    warnings: restored.warnings,
                },
            )
        }
        Err(error) => {
            tracing::warn!(document = %document_id, %error, "stored document malformed, starting empty");
            (GraphDocument::new(), report(LoadSource::Malformed(error)))
        }
    }
}

fn report(source: LoadSource) -> LoadReport {
    LoadReport {
        source,
        warnings: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use storyboard_codec::StoryboardKey;
    use storyboard_gateway::InMemoryGateway;
    use storyboard_graph::NodeKind;

    fn setup() -> (InMemoryGateway, CryptoCodec, DocumentId) {
        (
            InMemoryGateway::new(),
            CryptoCodec::new(StoryboardKey::generate()),
            DocumentId::parse("case-7").unwrap(),
        )
    }

    #[tokio::test]
    async fn empty_store_is_fresh() {
        let (gateway, codec, id) = setup();
        let (doc, report) = load_document(&gateway, &codec, &id).await;
        assert!(doc.is_empty());
        assert_eq!(report.source, LoadSource::Fresh);
        assert!(report.notices().is_empty());
    }

    #[tokio::test]
    async fn garbage_blob_recovers_empty() {
        let (gateway, codec, id) = setup();
        gateway.insert_raw(&id, "not-valid-ciphertext");

        let (doc, report) = load_document(&gateway, &codec, &id).await;

        assert!(doc.is_empty());
        assert!(matches!(report.source, LoadSource::Undecodable(_)));
        assert_eq!(report.notices().len(), 1);
    }

    #[tokio::test]
    async fn wrong_shape_is_malformed() {
        let (gateway, codec, id) = setup();
        let blob = codec.encrypt(&json!({"nodes": "nope"})).unwrap();
        gateway.insert_raw(&id, blob.into_string());

        let (doc, report) = load_document(&gateway, &codec, &id).await;
        assert!(doc.is_empty());
        assert!(matches!(report.source, LoadSource::Malformed(_)));
    }

    #[tokio::test]
    async fn restored_document_reports_dropped_edges() {
        let (gateway, codec, id) = setup();
        let stored = json!({
            "nodes": [{"id": "n1", "label": "Ferry log", "kind": "evidence", "notes": "", "createdAt": "2024-03-01T10:00:00Z"}],
            "edges": [{"id": "e1", "source": "n1", "target": "ghost", "label": "mentions"}]
        });
        gateway.insert_raw(&id, codec.encrypt(&stored).unwrap().into_string());

        let (doc, report) = load_document(&gateway, &codec, &id).await;

        assert!(matches!(report.source, LoadSource::Restored { .. }));
        assert_eq!(doc.node_count(), 1);
        assert_eq!(doc.node("n1").unwrap().kind, NodeKind::Evidence);
        assert_eq!(doc.edge_count(), 0);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.notices().len(), 1);
    }
}
