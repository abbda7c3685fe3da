//! Error types for the editing session

use storyboard_codec::EncodeError;
use storyboard_gateway::PersistenceError;
use storyboard_graph::GraphError;

/// Why a save did not reach the store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaveError {
    /// Document could not be sealed
    #[error("encode failed: {0}")]
    Encode(#[from] EncodeError),

    /// Gateway rejected or could not complete the store
    #[error("store failed: {0}")]
    Persistence(#[from] PersistenceError),

    /// Store task ended without an answer
    #[error("store task aborted: {0}")]
    Aborted(String),

    /// Session closed before the changes were stored
    #[error("session closed with unsaved changes")]
    Closed,
}

/// Configuration loading failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Could not read the file
    #[error("cannot read config: {0}")]
    Io(String),

    /// File is not valid TOML for this schema
    #[error("cannot parse config: {0}")]
    Parse(String),

    /// Values parsed but are unusable
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Umbrella error for session operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Gesture was rejected by the document
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Save failed
    #[error(transparent)]
    Save(#[from] SaveError),

    /// Configuration problem
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Session task is gone
    #[error("session is closed")]
    Closed,
}

/// Result alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
