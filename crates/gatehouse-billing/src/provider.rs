//! Payment provider abstraction

use async_trait::async_trait;
use gatehouse_types::CheckoutSessionState;
use serde::{Deserialize, Serialize};

use crate::BillingError;

/// A completed navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigation {
    /// Where the user was sent
    pub url: String,
}

/// Billing portal link returned by the portal function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalSession {
    /// Portal URL
    pub url: String,
}

/// Redirects to the provider's hosted checkout for a populated session
#[async_trait]
pub trait CheckoutRedirector: Send + Sync {
    /// Redirect to checkout; `session.session_id` must be set
    async fn redirect_to_checkout(
        &self,
        session: &CheckoutSessionState,
    ) -> Result<Navigation, BillingError>;
}

/// Creates billing portal links
#[async_trait]
pub trait PortalLinks: Send + Sync {
    /// Create a portal link that returns the user to `return_url`
    async fn create_portal_link(&self, return_url: &str) -> Result<PortalSession, BillingError>;
}
