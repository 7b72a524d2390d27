//! Client configuration

use std::time::Duration;

use gatehouse_types::ContentTier;

use crate::ClientError;

/// Custom claim carrying the subscriber's role
pub const DEFAULT_ROLE_CLAIM: &str = "stripeRole";

/// Default bound on waiting for a checkout session id
pub const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on creating a billing portal link
pub const DEFAULT_PORTAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin users return to after checkout or the billing portal
    pub origin: String,
    /// Custom claim read from the refreshed ID token
    pub role_claim: String,
    /// How long to wait for the checkout session id
    pub checkout_timeout: Duration,
    /// How long to wait for the billing portal link
    pub portal_timeout: Duration,
    /// Content tiers fetched for a signed-in user
    pub content_tiers: Vec<ContentTier>,
}

impl ClientConfig {
    /// Create a config with defaults for everything but the origin
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            role_claim: DEFAULT_ROLE_CLAIM.to_string(),
            checkout_timeout: DEFAULT_CHECKOUT_TIMEOUT,
            portal_timeout: DEFAULT_PORTAL_TIMEOUT,
            content_tiers: ContentTier::defaults(),
        }
    }

    /// Set the role claim name
    pub fn with_role_claim(mut self, claim: impl Into<String>) -> Self {
        self.role_claim = claim.into();
        self
    }

    /// Set the checkout wait bound
    pub fn with_checkout_timeout(mut self, timeout: Duration) -> Self {
        self.checkout_timeout = timeout;
        self
    }

    /// Set the portal link wait bound
    pub fn with_portal_timeout(mut self, timeout: Duration) -> Self {
        self.portal_timeout = timeout;
        self
    }

    /// Set the content tiers
    pub fn with_content_tiers(mut self, tiers: Vec<ContentTier>) -> Self {
        self.content_tiers = tiers;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ClientError> {
        if !(self.origin.starts_with("http://") || self.origin.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "origin must be an http(s) URL, got {:?}",
                self.origin
            )));
        }
        if self.role_claim.is_empty() {
            return Err(ClientError::Config("role claim must not be empty".to_string()));
        }
        if self.checkout_timeout.is_zero() {
            return Err(ClientError::Config(
                "checkout timeout must be positive".to_string(),
            ));
        }
        if self.portal_timeout.is_zero() {
            return Err(ClientError::Config("portal timeout must be positive".to_string()));
        }
        Ok(())
    }
}
