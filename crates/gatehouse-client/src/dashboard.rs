//! Dashboard actor
//!
//! Owns the view state of one page. It follows the session's identity:
//! when a user appears the catalog, subscription and content workers start
//! in a `JoinSet`; when the user leaves or changes, the set is aborted and
//! the generation counter moves on so any late event from the old session
//! is dropped. User actions arrive as commands and run through the shared
//! [`ActionState`]. Every change is published on a watch channel.

use std::sync::Arc;

use futures::StreamExt;
use gatehouse_auth::SessionProvider;
use gatehouse_billing::{CheckoutRedirector, Navigation, Navigator, PortalLinks};
use gatehouse_store::DocumentStore;
use gatehouse_types::{BillingSummary, ContentBlock, ContentTier, Identity, PlanListing, PriceId};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::action::{ActionKind, ActionState};
use crate::{
    BillingPortalRedirector, CatalogReader, CheckoutInitiator, ClientConfig, ClientError,
    ContentGateway, SubscriptionSnapshot, SubscriptionWatcher,
};

const COMMAND_BUFFER: usize = 16;
const EVENT_BUFFER: usize = 64;

/// Everything the page shows, at one point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewState {
    /// Signed-in identity
    pub identity: Option<Identity>,
    /// Plans in the order they arrived
    pub plans: Vec<PlanListing>,
    /// Billing summary of the active subscription
    pub billing: Option<BillingSummary>,
    /// Content per tier, in the order it arrived
    pub content: Vec<(ContentTier, Vec<ContentBlock>)>,
    /// Current user action
    pub action: ActionState,
    /// Session generation this state belongs to
    pub generation: u64,
}

impl ViewState {
    /// Plans to offer; empty while a subscription is active
    pub fn visible_plans(&self) -> &[PlanListing] {
        if self.billing.is_some() {
            &[]
        } else {
            &self.plans
        }
    }

    /// Whether the catalog is shown instead of the billing summary
    pub fn shows_catalog(&self) -> bool {
        self.billing.is_none()
    }
}

/// The components a dashboard drives
#[derive(Clone)]
pub struct Services {
    /// Session provider
    pub session: Arc<dyn SessionProvider>,
    /// Plan catalog
    pub catalog: CatalogReader,
    /// Subscription watches
    pub subscriptions: SubscriptionWatcher,
    /// Tier content
    pub content: ContentGateway,
    /// Checkout action
    pub checkout: CheckoutInitiator,
    /// Billing portal action
    pub portal: BillingPortalRedirector,
}

impl Services {
    /// Wire every component from its boundaries
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn DocumentStore>,
        session: Arc<dyn SessionProvider>,
        redirector: Arc<dyn CheckoutRedirector>,
        portal_links: Arc<dyn PortalLinks>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            catalog: CatalogReader::new(store.clone()),
            subscriptions: SubscriptionWatcher::new(
                store.clone(),
                session.clone(),
                config.role_claim.clone(),
            ),
            content: ContentGateway::new(store.clone(), config.content_tiers.clone()),
            checkout: CheckoutInitiator::new(
                store,
                redirector,
                config.origin.clone(),
                config.checkout_timeout,
            ),
            portal: BillingPortalRedirector::new(
                portal_links,
                navigator,
                config.origin,
                config.portal_timeout,
            ),
            session,
        }
    }
}

enum Command {
    Subscribe {
        price: PriceId,
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
    OpenPortal {
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
    SignOut {
        reply: oneshot::Sender<()>,
    },
}

enum EventKind {
    Plan(PlanListing),
    Subscription(SubscriptionSnapshot),
    Content(ContentTier, Vec<ContentBlock>),
    ActionFinished(Result<Navigation, ClientError>),
}

struct Event {
    generation: u64,
    kind: EventKind,
}

/// Handle to a running dashboard
///
/// Dropping the handle stops the dashboard and every worker it started.
pub struct Dashboard {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<ViewState>,
    task: JoinHandle<()>,
}

impl Dashboard {
    /// Start the dashboard actor
    pub fn spawn(services: Services) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(ViewState::default());
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);

        let actor = Actor {
            services,
            view: ViewState::default(),
            state: state_tx,
            events: events_tx,
            workers: JoinSet::new(),
        };
        let task = tokio::spawn(actor.run(commands_rx, events_rx));

        Self {
            commands: commands_tx,
            state: state_rx,
            task,
        }
    }

    /// Observe the view state
    pub fn watch(&self) -> watch::Receiver<ViewState> {
        self.state.clone()
    }

    /// Current view state
    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// Start a checkout for a price tier
    ///
    /// Returns once the action is accepted; the outcome shows up in
    /// [`ViewState::action`].
    pub async fn subscribe(&self, price: PriceId) -> Result<(), ClientError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Subscribe { price, reply }).await?;
        rx.await.map_err(|_| ClientError::Closed)?
    }

    /// Open the billing portal
    pub async fn open_portal(&self) -> Result<(), ClientError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::OpenPortal { reply }).await?;
        rx.await.map_err(|_| ClientError::Closed)?
    }

    /// Sign out and reset the view
    pub async fn sign_out(&self) -> Result<(), ClientError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SignOut { reply }).await?;
        rx.await.map_err(|_| ClientError::Closed)
    }

    async fn send(&self, command: Command) -> Result<(), ClientError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ClientError::Closed)
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("generation", &self.state.borrow().generation)
            .finish_non_exhaustive()
    }
}

struct Actor {
    services: Services,
    view: ViewState,
    state: watch::Sender<ViewState>,
    events: mpsc::Sender<Event>,
    workers: JoinSet<()>,
}

impl Actor {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut events: mpsc::Receiver<Event>,
    ) {
        let mut identity_rx = self.services.session.watch_identity();
        let initial = identity_rx.borrow_and_update().clone();
        self.set_identity(initial);

        loop {
            tokio::select! {
                changed = identity_rx.changed() => {
                    if changed.is_err() {
                        debug!("session provider gone");
                        break;
                    }
                    let identity = identity_rx.borrow_and_update().clone();
                    self.set_identity(identity);
                }
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                Some(event) = events.recv() => self.handle_event(event),
                Some(joined) = self.workers.join_next(), if !self.workers.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            warn!(error = %e, "dashboard worker panicked");
                        }
                    }
                }
            }
        }

        self.workers.shutdown().await;
    }

    /// Reset for a new identity and start its workers
    fn set_identity(&mut self, identity: Option<Identity>) {
        if identity == self.view.identity {
            return;
        }

        self.workers.abort_all();
        let generation = self.view.generation + 1;
        self.view = ViewState {
            identity: identity.clone(),
            generation,
            ..ViewState::default()
        };

        match identity {
            Some(identity) => {
                info!(uid = %identity.uid, generation, "session started");
                self.start_workers(identity, generation);
            }
            None => info!(generation, "signed out"),
        }
        self.publish();
    }

    fn start_workers(&mut self, identity: Identity, generation: u64) {
        let events = self.events.clone();
        let mut plans = self.services.catalog.stream_active_plans();
        self.workers.spawn(async move {
            while let Some(listing) = plans.next().await {
                if send(&events, generation, EventKind::Plan(listing)).await.is_err() {
                    break;
                }
            }
        });

        let events = self.events.clone();
        let mut subscription = self.services.subscriptions.watch(&identity);
        self.workers.spawn(async move {
            while let Some(snapshot) = subscription.next().await {
                if send(&events, generation, EventKind::Subscription(snapshot))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        });

        let events = self.events.clone();
        let mut content = self.services.content.stream_all();
        self.workers.spawn(async move {
            while let Some((tier, blocks)) = content.next().await {
                if send(&events, generation, EventKind::Content(tier, blocks))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        });
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Subscribe { price, reply } => {
                let result = self.begin_action(ActionKind::Checkout).map(|identity| {
                    let checkout = self.services.checkout.clone();
                    self.spawn_action(async move { checkout.start_checkout(&identity, &price).await });
                });
                let _ = reply.send(result);
            }
            Command::OpenPortal { reply } => {
                let result = self.begin_action(ActionKind::Portal).map(|identity| {
                    let portal = self.services.portal.clone();
                    self.spawn_action(async move { portal.open_billing_portal(&identity).await });
                });
                let _ = reply.send(result);
            }
            Command::SignOut { reply } => {
                self.services.session.sign_out().await;
                self.set_identity(None);
                let _ = reply.send(());
            }
        }
    }

    /// Enter `Loading` for a signed-in user
    fn begin_action(&mut self, kind: ActionKind) -> Result<Identity, ClientError> {
        let identity = self.view.identity.clone().ok_or(ClientError::NotSignedIn)?;
        if let Err(e) = self.view.action.begin(kind) {
            warn!(action = kind.as_str(), "action rejected while another is loading");
            return Err(e);
        }
        debug!(action = kind.as_str(), "action started");
        self.publish();
        Ok(identity)
    }

    fn spawn_action<F>(&mut self, action: F)
    where
        F: std::future::Future<Output = Result<Navigation, ClientError>> + Send + 'static,
    {
        let events = self.events.clone();
        let generation = self.view.generation;
        self.workers.spawn(async move {
            let outcome = action.await;
            let _ = send(&events, generation, EventKind::ActionFinished(outcome)).await;
        });
    }

    fn handle_event(&mut self, event: Event) {
        if event.generation != self.view.generation {
            debug!(
                stale = event.generation,
                current = self.view.generation,
                "dropping event from an earlier session"
            );
            return;
        }

        match event.kind {
            EventKind::Plan(listing) => self.view.plans.push(listing),
            EventKind::Subscription(snapshot) => {
                self.view.billing = match snapshot {
                    SubscriptionSnapshot::Active(summary) => Some(summary),
                    SubscriptionSnapshot::None => None,
                };
            }
            EventKind::Content(tier, blocks) => self.view.content.push((tier, blocks)),
            EventKind::ActionFinished(outcome) => {
                if let Err(e) = &outcome {
                    warn!(error = %e, "action failed");
                }
                self.view
                    .action
                    .finish(outcome.map(|nav| nav.url).map_err(|e| e.to_string()));
            }
        }
        self.publish();
    }

    fn publish(&self) {
        self.state.send_replace(self.view.clone());
    }
}

async fn send(
    events: &mpsc::Sender<Event>,
    generation: u64,
    kind: EventKind,
) -> Result<(), mpsc::error::SendError<Event>> {
    events.send(Event { generation, kind }).await
}
