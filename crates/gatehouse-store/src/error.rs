//! Store errors

use thiserror::Error;

/// Document store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport failure talking to the database
    #[error("transport error: {0}")]
    Transport(String),

    /// Database answered with an error status
    #[error("database error {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Error message from the database
        message: String,
    },

    /// Security rules rejected the request
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Document or collection not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Path does not name a collection or document
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Stored data could not be decoded into the requested type
    #[error("decode error: {0}")]
    Decode(String),

    /// Value could not be encoded as document fields
    #[error("encode error: {0}")]
    Encode(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Returns true if a later attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::PermissionDenied(_)
            | Self::NotFound(_)
            | Self::InvalidPath(_)
            | Self::Decode(_)
            | Self::Encode(_) => false,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(StoreError::Transport("reset".into()).is_retryable());
        assert!(StoreError::Status {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());
        assert!(StoreError::Status {
            status: 429,
            message: "slow down".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_non_retryable_errors() {
        assert!(!StoreError::PermissionDenied("rules".into()).is_retryable());
        assert!(!StoreError::Status {
            status: 400,
            message: "bad".into()
        }
        .is_retryable());
        assert!(!StoreError::Decode("bad".into()).is_retryable());
    }
}
