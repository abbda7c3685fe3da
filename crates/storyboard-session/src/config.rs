//! Session configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use storyboard_gateway::DocumentId;

/// Settings for one editing session
///
/// Every field has a default so a partial TOML file is enough:
///
/// ```toml
/// document_id = "case-1042"
/// title = "Harbour fire"
/// debounce_ms = 1500
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Document to open and save
    pub document_id: DocumentId,
    /// Title stored alongside each save
    pub title: String,
    /// Quiescence window before an autosave fires
    pub debounce_ms: u64,
    /// Capacity of the command channel between handles and the session task
    pub command_buffer: usize,
    /// Save unsaved changes when the session closes
    pub flush_on_close: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            document_id: DocumentId::default(),
            title: "Storyboard".to_string(),
            debounce_ms: 2000,
            command_buffer: 64,
            flush_on_close: true,
        }
    }
}

impl SessionConfig {
    /// Create default config
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document to open
    #[inline]
    #[must_use]
    pub fn with_document_id(mut self, document_id: DocumentId) -> Self {
        self.document_id = document_id;
        self
    }

    /// Set the stored title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the debounce window
    #[inline]
    #[must_use]
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Enable or disable the flush on close
    #[inline]
    #[must_use]
    pub fn with_flush_on_close(mut self, flush: bool) -> Self {
        self.flush_on_close = flush;
        self
    }

    /// Debounce window as a duration
    #[inline]
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Reject values the session cannot run with
    ///
    /// # Errors
    /// `ConfigError::Invalid` for an empty title or a zero-sized command buffer
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command_buffer == 0 {
            return Err(ConfigError::Invalid("command_buffer must be at least 1".into()));
        }
        if self.title.trim().is_empty() {
            return Err(ConfigError::Invalid("title must not be empty".into()));
        }
        Ok(())
    }

    /// Parse and validate from TOML text
    ///
    /// # Errors
    /// `ConfigError::Parse` or `ConfigError::Invalid`
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
