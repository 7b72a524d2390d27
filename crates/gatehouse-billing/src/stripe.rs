//! Stripe hosted checkout redirect

use std::sync::Arc;

use async_trait::async_trait;
use gatehouse_types::CheckoutSessionState;
use tracing::{debug, instrument};

use crate::config::StripeConfig;
use crate::error::BillingError;
use crate::navigator::Navigator;
use crate::provider::{CheckoutRedirector, Navigation};

/// Redirects to Stripe hosted checkout
#[derive(Clone)]
pub struct StripeCheckout {
    config: StripeConfig,
    navigator: Arc<dyn Navigator>,
}

impl StripeCheckout {
    /// Create a new redirector
    pub fn new(config: StripeConfig, navigator: Arc<dyn Navigator>) -> Result<Self, BillingError> {
        if !config.has_publishable_key() {
            return Err(BillingError::Configuration(
                "Stripe key must be a publishable key (pk_...)".to_string(),
            ));
        }
        Ok(Self { config, navigator })
    }

    /// Where a populated session should send the user
    ///
    /// The extension's `url` wins over a URL derived from the session id.
    pub fn target_url(&self, session: &CheckoutSessionState) -> Result<String, BillingError> {
        if let Some(url) = session.url.as_deref().filter(|u| !u.is_empty()) {
            return Ok(url.to_string());
        }
        match session.session_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => Ok(self.config.checkout_url(id)),
            None => Err(BillingError::InvalidResponse(
                "checkout session has no session id".to_string(),
            )),
        }
    }
}

#[async_trait]
impl CheckoutRedirector for StripeCheckout {
    #[instrument(skip(self, session), fields(session_id = ?session.session_id))]
    async fn redirect_to_checkout(
        &self,
        session: &CheckoutSessionState,
    ) -> Result<Navigation, BillingError> {
        let url = self.target_url(session)?;
        debug!(url = %url, "redirecting to checkout");
        self.navigator.assign(&url).await?;
        Ok(Navigation { url })
    }
}

impl std::fmt::Debug for StripeCheckout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeCheckout")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
