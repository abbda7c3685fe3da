//! HTTP gateway configuration

use crate::error::PersistenceError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for [`crate::HttpGateway`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// API root, e.g. `http://localhost:5000/api`
    pub base_url: String,
    /// Bearer token attached to every request, if any
    pub bearer_token: Option<String>,
    /// Per-request timeout
    pub timeout_ms: u64,
}

impl GatewayConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With API root
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// With bearer token
    #[inline]
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Parse from TOML text; missing keys take defaults
    ///
    /// # Errors
    /// `PersistenceError::Config` on invalid TOML
    pub fn from_toml_str(text: &str) -> Result<Self, PersistenceError> {
        toml::from_str(text).map_err(|e| PersistenceError::Config(e.to_string()))
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// `PersistenceError::Io` if unreadable, `PersistenceError::Config` if invalid
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            bearer_token: None,
            timeout_ms: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_uses_defaults() {
        let config = GatewayConfig::from_toml_str("bearer_token = \"abc\"").unwrap();
        assert_eq!(config.bearer_token.as_deref(), Some("abc"));
        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.base_url, GatewayConfig::default().base_url);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        assert!(matches!(
            GatewayConfig::from_toml_str("timeout_ms = \"soon\""),
            Err(PersistenceError::Config(_))
        ));
    }
}
