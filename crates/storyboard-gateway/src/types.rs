//! Records exchanged with a gateway

use crate::error::PersistenceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Stable identifier of one storyboard, the upsert key
///
/// Restricted to ASCII alphanumerics, `-` and `_` so it is safe as a file
/// name and as a URL path segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    const MAX_LEN: usize = 128;

    /// Validate and wrap an identifier
    ///
    /// # Errors
    /// `PersistenceError::InvalidDocumentId` if empty, too long or containing other characters
    pub fn parse(raw: impl Into<String>) -> Result<Self, PersistenceError> {
        let raw = raw.into();
        let valid = !raw.is_empty()
            && raw.len() <= Self::MAX_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(raw))
        } else {
            Err(PersistenceError::InvalidDocumentId(raw))
        }
    }

    /// Fresh random identifier
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string().to_lowercase())
    }

    /// Borrow the raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::generate()
    }
}

impl FromStr for DocumentId {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = PersistenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<DocumentId> for String {
    fn from(value: DocumentId) -> Self {
        value.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backend-assigned identifier of a stored record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    /// Fresh random record identifier
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The most recent record stored for a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedBlob {
    /// Record identifier
    pub record_id: RecordId,
    /// Opaque ciphertext; never interpreted by the gateway
    pub data: String,
    /// When the record was last written, if the backend reports it
    pub updated_at: Option<DateTime<Utc>>,
}

/// A write of one opaque blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRequest {
    /// Human-readable record title (plaintext, visible to the backend)
    pub title: String,
    /// Opaque ciphertext
    pub data: String,
}

impl StoreRequest {
    /// Create a store request
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            data: data.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_id_validation() {
        assert!(DocumentId::parse("board-1_A").is_ok());
        assert!(DocumentId::parse("").is_err());
        assert!(DocumentId::parse("../etc/passwd").is_err());
        assert!(DocumentId::parse("a b").is_err());
        assert!(DocumentId::parse("x".repeat(129)).is_err());
    }

    #[test]
    fn generated_document_ids_are_valid() {
        let id = DocumentId::generate();
        assert!(DocumentId::parse(id.as_str()).is_ok());
    }

    #[test]
    fn document_id_deserialization_validates() {
        assert!(serde_json::from_str::<DocumentId>("\"ok-id\"").is_ok());
        assert!(serde_json::from_str::<DocumentId>("\"bad/id\"").is_err());
    }
}
