//! Config file for the command-line tools
//!
//! ```toml
//! store = "/var/lib/storyboard"
//!
//! [session]
//! document_id = "case-1042"
//! title = "Harbour fire"
//!
//! [gateway]
//! base_url = "https://boards.example.org/api"
//! ```

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use storyboard_gateway::GatewayConfig;
use storyboard_session::SessionConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CliConfig {
    /// Directory for the local record store
    pub(crate) store: Option<PathBuf>,
    /// Remote backend, used instead of `store` when present
    pub(crate) gateway: Option<GatewayConfig>,
    /// Session settings
    pub(crate) session: Option<SessionConfig>,
}

impl CliConfig {
    pub(crate) fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text).context("invalid config file")?;
        if let Some(session) = &config.session {
            session.validate()?;
        }
        Ok(config)
    }

    pub(crate) fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        Self::from_toml_str(&text)
    }
}
