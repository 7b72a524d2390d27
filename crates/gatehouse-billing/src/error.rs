//! Billing errors

use thiserror::Error;

/// Billing errors
#[derive(Error, Debug)]
pub enum BillingError {
    /// The remote function answered with an error
    #[error("function error ({status}): {message}")]
    Function {
        /// Canonical status, e.g. `UNAUTHENTICATED`, `INTERNAL`
        status: String,
        /// Error message
        message: String,
    },

    /// The response was not in the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Transport failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The navigator refused or failed to navigate
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl BillingError {
    /// Check if this is an error reported by the provider itself
    pub fn is_provider_error(&self) -> bool {
        matches!(self, Self::Function { .. } | Self::InvalidResponse(_))
    }

    /// Check if the caller was not signed in as far as the function could tell
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Function { status, .. } if status == "UNAUTHENTICATED")
    }
}

impl From<reqwest::Error> for BillingError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!(error = %err, "billing request failed");
        Self::Transport(err.to_string())
    }
}
