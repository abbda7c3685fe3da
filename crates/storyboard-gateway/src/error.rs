//! Error types for persistence

/// Store or fetch failure
///
/// Every variant is recoverable from the session's point of view: the
/// document stays in memory and the next save retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    /// Local filesystem failure
    #[error("i/o error: {0}")]
    Io(String),

    /// Could not reach the backend
    #[error("transport error: {0}")]
    Transport(String),

    /// Backend answered with a non-success status
    #[error("backend returned status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Backend record did not have the expected fields
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// Document identifier is unusable as a storage key
    #[error("invalid document id: {0:?}")]
    InvalidDocumentId(String),

    /// Gateway configuration is unusable
    #[error("configuration error: {0}")]
    Config(String),
}

impl PersistenceError {
    /// Whether retrying later may succeed
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Io(_) | Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            Self::MalformedRecord(_) | Self::InvalidDocumentId(_) | Self::Config(_) => false,
        }
    }
}

impl From<std::io::Error> for PersistenceError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<reqwest::Error> for PersistenceError {
    fn from(value: reqwest::Error) -> Self {
        match value.status() {
            Some(status) => Self::Status {
                status: status.as_u16(),
                message: value.to_string(),
            },
            None if value.is_decode() => Self::MalformedRecord(value.to_string()),
            None => Self::Transport(value.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(PersistenceError::Transport("reset".into()).is_transient());
        assert!(PersistenceError::Status { status: 503, message: String::new() }.is_transient());
        assert!(!PersistenceError::Status { status: 401, message: String::new() }.is_transient());
        assert!(!PersistenceError::MalformedRecord("x".into()).is_transient());
    }

    #[test]
    fn io_errors_convert() {
        let err: PersistenceError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, PersistenceError::Io(_)));
    }
}
