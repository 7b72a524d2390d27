//! Common error types

use thiserror::Error;

/// Errors parsing domain values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Unknown billing interval
    #[error("invalid billing interval: {0}")]
    InvalidInterval(String),

    /// Content tier name that cannot name a collection
    #[error("invalid content tier: {0:?}")]
    InvalidContentTier(String),
}
