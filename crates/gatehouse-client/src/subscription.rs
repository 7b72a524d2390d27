//! Active subscription watch
//!
//! Listens to the user's active subscriptions and turns each snapshot into
//! a [`SubscriptionSnapshot`]. Resolving an active snapshot needs two more
//! round trips (the price document and a forced token refresh); if the
//! identity changes while they are in flight the result is discarded.

use std::sync::Arc;

use gatehouse_auth::SessionProvider;
use gatehouse_store::{DocumentStore, Query, QuerySnapshot};
use gatehouse_types::{BillingSummary, Identity, PriceTier, Subscription, SubscriptionStatus};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

const SNAPSHOT_BUFFER: usize = 8;

/// What the subscription watch currently sees
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionSnapshot {
    /// No active subscription
    None,
    /// An active subscription with its resolved billing summary
    Active(BillingSummary),
}

impl SubscriptionSnapshot {
    /// The billing summary, if active
    pub fn summary(&self) -> Option<&BillingSummary> {
        match self {
            Self::Active(summary) => Some(summary),
            Self::None => None,
        }
    }
}

/// Starts subscription watches
#[derive(Clone)]
pub struct SubscriptionWatcher {
    store: Arc<dyn DocumentStore>,
    session: Arc<dyn SessionProvider>,
    role_claim: String,
}

impl SubscriptionWatcher {
    /// Create a new watcher reading `role_claim` from refreshed tokens
    pub fn new(
        store: Arc<dyn DocumentStore>,
        session: Arc<dyn SessionProvider>,
        role_claim: impl Into<String>,
    ) -> Self {
        Self {
            store,
            session,
            role_claim: role_claim.into(),
        }
    }

    /// Watch the active subscription of `identity`
    ///
    /// The watch ends when the identity signs out or changes.
    pub fn watch(&self, identity: &Identity) -> SubscriptionWatch {
        let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
        let task = tokio::spawn(run_watch(self.clone(), identity.clone(), tx));
        SubscriptionWatch { rx, task }
    }

    /// Resolve one listener snapshot
    ///
    /// `None` means the snapshot could not be resolved and nothing should be
    /// emitted for it.
    #[instrument(skip(self, snapshot), fields(uid = %identity.uid))]
    async fn resolve(
        &self,
        identity: &Identity,
        snapshot: &QuerySnapshot,
    ) -> Option<SubscriptionSnapshot> {
        let Some(doc) = snapshot.first() else {
            return Some(SubscriptionSnapshot::None);
        };

        let subscription: Subscription = match doc.decode() {
            Ok(subscription) => subscription,
            Err(e) => {
                warn!(error = %e, "undecodable subscription");
                return None;
            }
        };
        if !subscription.status.is_active() {
            debug!(
                subscription_id = %subscription.id,
                status = ?subscription.status,
                "subscription not active"
            );
            return Some(SubscriptionSnapshot::None);
        }

        let price: PriceTier = match self.store.get_document(&subscription.price).await {
            Ok(Some(doc)) => match doc.decode() {
                Ok(price) => price,
                Err(e) => {
                    warn!(error = %e, "undecodable subscription price");
                    return None;
                }
            },
            Ok(None) => {
                warn!(price = %subscription.price, "subscription price not found");
                return None;
            }
            Err(e) => {
                warn!(price = %subscription.price, error = %e, "failed to load subscription price");
                return None;
            }
        };

        let claims = match self.session.refreshed_claims().await {
            Ok(claims) => claims,
            Err(e) => {
                warn!(error = %e, "failed to refresh claims");
                return None;
            }
        };
        let claim = claims.claim_str(&self.role_claim).map(str::to_string);

        debug!(subscription_id = %subscription.id, claim = ?claim, "subscription resolved");
        Some(SubscriptionSnapshot::Active(BillingSummary::new(
            subscription,
            price,
            claim,
        )))
    }
}

impl std::fmt::Debug for SubscriptionWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionWatcher")
            .field("role_claim", &self.role_claim)
            .finish_non_exhaustive()
    }
}

/// A running subscription watch
///
/// Dropping the handle stops the watch and its database listener.
#[derive(Debug)]
pub struct SubscriptionWatch {
    rx: mpsc::Receiver<SubscriptionSnapshot>,
    task: JoinHandle<()>,
}

impl SubscriptionWatch {
    /// Next snapshot; `None` once the watch has ended
    pub async fn next(&mut self) -> Option<SubscriptionSnapshot> {
        self.rx.recv().await
    }
}

impl Drop for SubscriptionWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_watch(
    watcher: SubscriptionWatcher,
    identity: Identity,
    tx: mpsc::Sender<SubscriptionSnapshot>,
) {
    let mut identity_rx = watcher.session.watch_identity();
    if identity_rx.borrow_and_update().as_ref() != Some(&identity) {
        return;
    }

    let query = Query::new(format!(
        "{}/{}",
        identity.customer_path(),
        Subscription::COLLECTION
    ))
    .where_eq("status", SubscriptionStatus::ACTIVE);

    let mut listener = match watcher.store.listen_query(query).await {
        Ok(listener) => listener,
        Err(e) => {
            warn!(uid = %identity.uid, error = %e, "failed to listen for subscriptions");
            return;
        }
    };

    loop {
        let snapshot = tokio::select! {
            () = identity_left(&mut identity_rx, &identity) => break,
            item = listener.next() => match item {
                Some(Ok(snapshot)) => snapshot,
                Some(Err(e)) if e.is_retryable() => {
                    warn!(
                        uid = %identity.uid,
                        error = %e,
                        "subscription listener error, still watching"
                    );
                    continue;
                }
                Some(Err(e)) => {
                    warn!(uid = %identity.uid, error = %e, "subscription listener failed");
                    break;
                }
                None => break,
            },
        };

        let resolved = tokio::select! {
            biased;
            () = identity_left(&mut identity_rx, &identity) => {
                debug!(uid = %identity.uid, "identity changed, discarding resolution");
                break;
            }
            resolved = watcher.resolve(&identity, &snapshot) => resolved,
        };

        // A change that landed as the resolution finished still wins
        if identity_rx.borrow().as_ref() != Some(&identity) {
            break;
        }

        if let Some(resolved) = resolved {
            if tx.send(resolved).await.is_err() {
                break;
            }
        }
    }

    debug!(uid = %identity.uid, "subscription watch ended");
}

/// Completes once the observed identity is no longer `identity`
async fn identity_left(rx: &mut watch::Receiver<Option<Identity>>, identity: &Identity) {
    loop {
        if rx.changed().await.is_err() {
            return;
        }
        if rx.borrow_and_update().as_ref() != Some(identity) {
            return;
        }
    }
}
