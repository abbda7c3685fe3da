//! AES-256-GCM envelope around a JSON document
//!
//! Envelope layout before base64: `MAGIC (4) || nonce (12) || ciphertext+tag`.
//! The tag authenticates the whole ciphertext, so any tampering or a wrong
//! key surfaces as [`DecodeError::Authentication`].

use crate::key::StoryboardKey;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

const ENVELOPE_MAGIC: &[u8; 4] = b"SBX1";
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Opaque encrypted blob, safe to hand to an untrusted store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CipherText(String);

impl CipherText {
    /// Borrow the encoded blob
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the encoded blob
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for CipherText {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for CipherText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encryption failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// Document could not be turned into JSON
    #[error("serialization failed: {0}")]
    Serialize(String),

    /// AEAD refused the input
    #[error("encryption failed")]
    Cipher,
}

/// Blob could not be turned back into a document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Not base64 text
    #[error("blob is not base64: {0}")]
    NotBase64(String),

    /// Decoded bytes do not start with the envelope marker
    #[error("blob is not a storyboard envelope")]
    UnknownEnvelope,

    /// Envelope shorter than nonce plus tag
    #[error("blob truncated ({0} bytes)")]
    Truncated(usize),

    /// Wrong key or tampered ciphertext
    #[error("authentication failed: wrong key or tampered blob")]
    Authentication,

    /// Plaintext is not the expected JSON
    #[error("decrypted payload is not valid JSON: {0}")]
    InvalidJson(String),
}

/// Encrypts and decrypts documents under one key
#[derive(Debug, Clone)]
pub struct CryptoCodec {
    key: StoryboardKey,
}

impl CryptoCodec {
    /// Create a codec for `key`
    #[inline]
    #[must_use]
    pub fn new(key: StoryboardKey) -> Self {
        Self { key }
    }

    /// See [`encrypt`]
    ///
    /// # Errors
    /// See [`encrypt`]
    pub fn encrypt<T: Serialize>(&self, document: &T) -> Result<CipherText, EncodeError> {
        encrypt(document, &self.key)
    }

    /// See [`decrypt`]
    ///
    /// # Errors
    /// See [`decrypt`]
    pub fn decrypt<T: DeserializeOwned>(&self, cipher: &str) -> Result<T, DecodeError> {
        decrypt(cipher, &self.key)
    }
}

/// Serialize `document` to JSON and seal it under `key`
///
/// A fresh random nonce is used for every call, so encrypting the same
/// document twice yields different blobs.
///
/// # Errors
/// `EncodeError` if serialization fails; well-formed documents always succeed
pub fn encrypt<T: Serialize>(document: &T, key: &StoryboardKey) -> Result<CipherText, EncodeError> {
    let plaintext =
        serde_json::to_vec(document).map_err(|e| EncodeError::Serialize(e.to_string()))?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_ref())
        .map_err(|_| EncodeError::Cipher)?;

    let mut envelope = Vec::with_capacity(ENVELOPE_MAGIC.len() + NONCE_LEN + sealed.len());
    envelope.extend_from_slice(ENVELOPE_MAGIC);
    envelope.extend_from_slice(&nonce);
    envelope.extend_from_slice(&sealed);

    Ok(CipherText(STANDARD.encode(envelope)))
}

/// Open a blob produced by [`encrypt`] and parse its JSON
///
/// # Errors
/// `DecodeError` for anything that is not an intact envelope sealed under
/// `key` holding JSON of type `T`
pub fn decrypt<T: DeserializeOwned>(cipher: &str, key: &StoryboardKey) -> Result<T, DecodeError> {
    let envelope = STANDARD
        .decode(cipher.trim())
        .map_err(|e| DecodeError::NotBase64(e.to_string()))?;

    let body = envelope
        .strip_prefix(ENVELOPE_MAGIC.as_slice())
        .ok_or(DecodeError::UnknownEnvelope)?;
    if body.len() < NONCE_LEN + TAG_LEN {
        return Err(DecodeError::Truncated(envelope.len()));
    }
    let (nonce, sealed) = body.split_at(NONCE_LEN);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| DecodeError::Authentication)?;

    serde_json::from_slice(&plaintext).map_err(|e| {
        tracing::warn!(error = %e, "decrypted storyboard payload is not valid JSON");
        DecodeError::InvalidJson(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn key() -> StoryboardKey {
        StoryboardKey::from_bytes([0xA5; 32])
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let doc = json!({ "nodes": [], "edges": [] });
        let blob = encrypt(&doc, &key()).unwrap();
        let back: Value = decrypt(blob.as_str(), &key()).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn nonces_differ_between_calls() {
        let doc = json!({ "nodes": [] });
        let a = encrypt(&doc, &key()).unwrap();
        let b = encrypt(&doc, &key()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_is_not_base64() {
        let result = decrypt::<Value>("not-valid-ciphertext", &key());
        assert!(matches!(result, Err(DecodeError::NotBase64(_))));
    }

    #[test]
    fn foreign_base64_is_unknown_envelope() {
        let foreign = STANDARD.encode(b"Salted__0123456789abcdef");
        assert_eq!(
            decrypt::<Value>(&foreign, &key()),
            Err(DecodeError::UnknownEnvelope)
        );
    }

    #[test]
    fn short_envelope_is_truncated() {
        let short = STANDARD.encode(b"SBX1abc");
        assert!(matches!(
            decrypt::<Value>(&short, &key()),
            Err(DecodeError::Truncated(_))
        ));
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let blob = encrypt(&json!({ "nodes": [] }), &key()).unwrap();
        let other = StoryboardKey::from_bytes([0x5A; 32]);
        assert_eq!(
            decrypt::<Value>(blob.as_str(), &other),
            Err(DecodeError::Authentication)
        );
    }

    #[test]
    fn tampering_fails_authentication() {
        let blob = encrypt(&json!({ "nodes": [1, 2, 3] }), &key()).unwrap();
        let mut raw = STANDARD.decode(blob.as_str()).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = STANDARD.encode(raw);
        assert_eq!(
            decrypt::<Value>(&tampered, &key()),
            Err(DecodeError::Authentication)
        );
    }

    #[test]
    fn non_json_plaintext_is_invalid_json() {
        #[derive(Serialize)]
        struct Raw(&'static str);
        // A JSON string decodes fine as Value but not as an object type.
        let blob = encrypt(&Raw("plain"), &key()).unwrap();
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Shape {
            nodes: Vec<Value>,
        }
        assert!(matches!(
            decrypt::<Shape>(blob.as_str(), &key()),
            Err(DecodeError::InvalidJson(_))
        ));
    }
}
