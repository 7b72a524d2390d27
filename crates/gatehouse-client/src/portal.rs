//! Billing portal redirect

use std::sync::Arc;
use std::time::Duration;

use gatehouse_billing::{BillingError, Navigation, Navigator, PortalLinks};
use gatehouse_types::Identity;
use tracing::{info, instrument, warn};

use crate::metrics::record_portal_failure;
use crate::ClientError;

/// Sends the user to the provider's billing portal
#[derive(Clone)]
pub struct BillingPortalRedirector {
    links: Arc<dyn PortalLinks>,
    navigator: Arc<dyn Navigator>,
    origin: String,
    timeout: Duration,
}

impl BillingPortalRedirector {
    /// Create a new redirector returning users to `origin`
    ///
    /// Creating the link may take at most `timeout`.
    pub fn new(
        links: Arc<dyn PortalLinks>,
        navigator: Arc<dyn Navigator>,
        origin: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            links,
            navigator,
            origin: origin.into(),
            timeout,
        }
    }

    /// Create a portal link and navigate to it
    ///
    /// No retries; on failure or timeout nothing is navigated.
    #[instrument(skip(self, identity), fields(uid = %identity.uid))]
    pub async fn open_billing_portal(&self, identity: &Identity) -> Result<Navigation, ClientError> {
        let created =
            tokio::time::timeout(self.timeout, self.links.create_portal_link(&self.origin)).await;
        let portal = match created {
            Ok(Ok(portal)) => portal,
            Err(_) => {
                warn!(timeout = ?self.timeout, "no portal link in time");
                record_portal_failure("timeout");
                return Err(ClientError::Timeout(self.timeout));
            }
            Ok(Err(e)) => {
                warn!(error = %e, "failed to create portal link");
                record_portal_failure(failure_reason(&e));
                return Err(e.into());
            }
        };

        if let Err(e) = self.navigator.assign(&portal.url).await {
            warn!(error = %e, "failed to navigate to portal");
            record_portal_failure("navigation");
            return Err(e.into());
        }

        info!(url = %portal.url, "redirected to billing portal");
        Ok(Navigation { url: portal.url })
    }
}

impl std::fmt::Debug for BillingPortalRedirector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingPortalRedirector")
            .field("origin", &self.origin)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn failure_reason(err: &BillingError) -> &'static str {
    match err {
        BillingError::Function { .. } => "function",
        BillingError::InvalidResponse(_) => "invalid_response",
        BillingError::Transport(_) => "transport",
        BillingError::Navigation(_) => "navigation",
        BillingError::Configuration(_) => "configuration",
    }
}
