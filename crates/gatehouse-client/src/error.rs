//! Client errors

use std::time::Duration;

use gatehouse_auth::AuthError;
use gatehouse_billing::BillingError;
use gatehouse_store::StoreError;
use thiserror::Error;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// No user is signed in
    #[error("not signed in")]
    NotSignedIn,

    /// Document store error
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Session provider error
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Payment provider error
    #[error("billing error: {0}")]
    Billing(#[from] BillingError),

    /// No checkout session id arrived in time
    #[error("timed out after {0:?} waiting for the checkout session")]
    Timeout(Duration),

    /// A checkout is already in flight
    #[error("a checkout is already in progress")]
    CheckoutInProgress,

    /// Another action is still loading
    #[error("another action is in progress")]
    ActionInProgress,

    /// The provider could not create the checkout session
    #[error("checkout failed: {0}")]
    Checkout(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// The dashboard has shut down
    #[error("dashboard closed")]
    Closed,
}

impl ClientError {
    /// Returns true if trying the same action again may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            Self::Auth(AuthError::Transport(_)) => true,
            Self::Billing(BillingError::Transport(_)) => true,
            Self::Timeout(_) | Self::CheckoutInProgress | Self::ActionInProgress => true,
            _ => false,
        }
    }
}
