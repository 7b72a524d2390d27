//! Checkout initiation
//!
//! Writes a checkout session request under the customer record, waits for
//! the payment extension to attach a session id to it, then hands the
//! populated session to the redirector.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gatehouse_billing::{CheckoutRedirector, Navigation};
use gatehouse_store::{to_fields, Document, DocumentStore, Listener};
use gatehouse_types::{CheckoutSessionRequest, CheckoutSessionState, Identity, PriceId};
use tracing::{debug, info, instrument, warn};

use crate::metrics::record_checkout_navigation;
use crate::ClientError;

/// Starts checkouts, at most one at a time
#[derive(Clone)]
pub struct CheckoutInitiator {
    store: Arc<dyn DocumentStore>,
    redirector: Arc<dyn CheckoutRedirector>,
    origin: String,
    timeout: Duration,
    in_flight: Arc<AtomicBool>,
}

/// Clears the in-flight flag when the checkout ends, however it ends
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CheckoutInitiator {
    /// Create a new checkout initiator
    pub fn new(
        store: Arc<dyn DocumentStore>,
        redirector: Arc<dyn CheckoutRedirector>,
        origin: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            redirector,
            origin: origin.into(),
            timeout,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a checkout is currently running
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Start a checkout for `price_id` and navigate to it
    #[instrument(skip(self, identity), fields(uid = %identity.uid, price_id = %price_id))]
    pub async fn start_checkout(
        &self,
        identity: &Identity,
        price_id: &PriceId,
    ) -> Result<Navigation, ClientError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("checkout already in progress");
            return Err(ClientError::CheckoutInProgress);
        }
        let _guard = InFlight(self.in_flight.clone());

        let request = CheckoutSessionRequest::new(price_id.clone(), self.origin.clone());
        let collection = format!(
            "{}/{}",
            identity.customer_path(),
            CheckoutSessionRequest::COLLECTION
        );
        let doc = self
            .store
            .add_document(&collection, to_fields(&request)?)
            .await?;
        debug!(path = %doc.path, "checkout session requested");

        let mut listener = self.store.listen_document(&doc.path).await?;
        let session = match tokio::time::timeout(self.timeout, await_session(&mut listener)).await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!(timeout = ?self.timeout, "no checkout session id in time");
                return Err(ClientError::Timeout(self.timeout));
            }
        };
        // Later snapshots of the request are of no interest
        listener.dispose();

        let navigation = self.redirector.redirect_to_checkout(&session).await?;
        record_checkout_navigation();
        info!(url = %navigation.url, "redirected to checkout");
        Ok(navigation)
    }
}

impl std::fmt::Debug for CheckoutInitiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutInitiator")
            .field("origin", &self.origin)
            .field("timeout", &self.timeout)
            .field("in_flight", &self.is_in_flight())
            .finish_non_exhaustive()
    }
}

/// Wait until the request carries a session id or an error
async fn await_session(
    listener: &mut Listener<Option<Document>>,
) -> Result<CheckoutSessionState, ClientError> {
    while let Some(item) = listener.next().await {
        let doc = match item {
            Ok(Some(doc)) => doc,
            // Not visible yet
            Ok(None) => continue,
            Err(e) if e.is_retryable() => {
                warn!(error = %e, "checkout listener error, still waiting");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let state: CheckoutSessionState = doc.decode()?;
        if let Some(error) = state.error {
            warn!(message = %error.message, "checkout session creation failed");
            return Err(ClientError::Checkout(error.message));
        }
        if state.session_id.as_deref().is_some_and(|id| !id.is_empty()) {
            return Ok(state);
        }
    }

    Err(ClientError::Checkout(
        "checkout session listener closed".to_string(),
    ))
}
