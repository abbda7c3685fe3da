//! Key material
//!
//! Keys are supplied by the caller, one per user or per document. Nothing in
//! this crate embeds a shared secret.

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;

/// Key length in bytes (AES-256)
pub const KEY_LEN: usize = 32;

const PASSPHRASE_DOMAIN: &[u8] = b"storyboard.key.v1";

/// Invalid key material
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// Not a hex string
    #[error("key is not valid hex: {0}")]
    InvalidHex(String),

    /// Decoded to the wrong number of bytes
    #[error("key must be {KEY_LEN} bytes, got {0}")]
    InvalidLength(usize),

    /// Empty passphrase
    #[error("passphrase must not be empty")]
    EmptyPassphrase,
}

/// 256-bit symmetric key
#[derive(Clone, PartialEq, Eq)]
pub struct StoryboardKey {
    bytes: [u8; KEY_LEN],
}

impl StoryboardKey {
    /// Wrap raw key bytes
    #[inline]
    #[must_use]
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Fresh random key from the OS generator
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Parse a 64-character hex string
    ///
    /// # Errors
    /// `KeyError` if the string is not hex or has the wrong length
    pub fn from_hex(encoded: &str) -> Result<Self, KeyError> {
        let decoded =
            hex::decode(encoded.trim()).map_err(|e| KeyError::InvalidHex(e.to_string()))?;
        let bytes: [u8; KEY_LEN] = decoded
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidLength(decoded.len()))?;
        Ok(Self { bytes })
    }

    /// Derive a key from a passphrase and a caller-chosen salt
    ///
    /// The salt is typically the principal or document identifier so that
    /// equal passphrases still yield distinct keys across tenants.
    ///
    /// # Errors
    /// `KeyError::EmptyPassphrase` if `passphrase` is empty
    pub fn from_passphrase(passphrase: &str, salt: &str) -> Result<Self, KeyError> {
        if passphrase.is_empty() {
            return Err(KeyError::EmptyPassphrase);
        }
        let mut hasher = Sha256::new();
        hasher.update(PASSPHRASE_DOMAIN);
        hasher.update((salt.len() as u64).to_le_bytes());
        hasher.update(salt.as_bytes());
        hasher.update(passphrase.as_bytes());
        Ok(Self {
            bytes: hasher.finalize().into(),
        })
    }

    /// Lowercase hex encoding
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for StoryboardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StoryboardKey(<redacted>)")
    }
}
