//! Dashboard lifecycle: identity changes, passive workers and user actions

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    fields, seed_catalog, seed_subscription, spawn_checkout_extension, FailingPortalLinks,
    FlakyStore, HangingPortalLinks, MockSession, RecordingNavigator, StaticPortalLinks, WAIT,
};
use gatehouse_billing::{PortalLinks, StripeCheckout, StripeConfig};
use gatehouse_client::{
    render, ActionKind, ActionState, ClientConfig, ClientError, Dashboard, Services, ViewState,
};
use gatehouse_store::MemoryStore;
use gatehouse_types::{ContentTier, PriceId};
use serde_json::json;
use tokio::sync::watch;
use tokio::time::timeout;

struct Harness {
    memory: MemoryStore,
    store: FlakyStore,
    session: Arc<MockSession>,
    navigator: Arc<RecordingNavigator>,
}

impl Harness {
    fn new() -> Self {
        let memory = MemoryStore::new();
        seed_catalog(&memory);
        Self {
            store: FlakyStore::new(memory.clone()),
            memory,
            session: Arc::new(MockSession::new()),
            navigator: Arc::new(RecordingNavigator::new()),
        }
    }

    fn dashboard(&self, portal: Arc<dyn PortalLinks>) -> Dashboard {
        let redirector =
            StripeCheckout::new(StripeConfig::new("pk_test_1"), self.navigator.clone()).unwrap();
        let config = ClientConfig::new("https://app.example.com")
            .with_checkout_timeout(Duration::from_secs(2))
            .with_portal_timeout(Duration::from_millis(300));
        Dashboard::spawn(Services::new(
            config,
            Arc::new(self.store.clone()),
            self.session.clone(),
            Arc::new(redirector),
            portal,
            self.navigator.clone(),
        ))
    }
}

async fn wait_for(
    rx: &mut watch::Receiver<ViewState>,
    mut done: impl FnMut(&ViewState) -> bool,
) -> ViewState {
    timeout(WAIT, async {
        loop {
            {
                let view = rx.borrow_and_update();
                if done(&view) {
                    return view.clone();
                }
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("view never reached the expected state")
}

fn fully_loaded(view: &ViewState) -> bool {
    view.plans.len() == 2 && view.content.len() == 2
}

#[tokio::test]
async fn test_signed_out_view_is_empty() {
    let harness = Harness::new();
    let dashboard = harness.dashboard(Arc::new(FailingPortalLinks));

    let view = dashboard.snapshot();
    assert!(view.identity.is_none());
    assert!(view.plans.is_empty());
    assert_eq!(render(&view), "Not signed in.\n");
}

#[tokio::test]
async fn test_sign_in_loads_catalog_and_content() {
    let harness = Harness::new();
    let dashboard = harness.dashboard(Arc::new(FailingPortalLinks));
    let mut rx = dashboard.watch();

    harness.session.sign_in("u1");
    let view = wait_for(&mut rx, fully_loaded).await;

    assert!(view.shows_catalog());
    assert!(view.plans.iter().all(|p| p.is_ordered()));
    let pro = view.plans.iter().find(|p| p.plan.name == "Pro").unwrap();
    assert_eq!(pro.tiers[0].display, "$19.99 per month");

    let text = render(&view);
    assert!(text.contains("[basic_month] $4.99 per month"));
    assert!(text.contains("  - Welcome"));
}

#[tokio::test]
async fn test_failed_price_fetch_keeps_other_plans() {
    let harness = Harness::new();
    harness.store.fail_collection("product/prod_basic/prices");
    let dashboard = harness.dashboard(Arc::new(FailingPortalLinks));
    let mut rx = dashboard.watch();

    harness.session.sign_in("u1");
    let view = wait_for(&mut rx, fully_loaded).await;

    let basic = view.plans.iter().find(|p| p.plan.name == "Basic").unwrap();
    assert!(basic.tiers.is_empty());
    let pro = view.plans.iter().find(|p| p.plan.name == "Pro").unwrap();
    assert_eq!(pro.tiers.len(), 2);
}

#[tokio::test]
async fn test_active_subscription_hides_catalog() {
    let harness = Harness::new();
    seed_subscription(&harness.memory, "u1");
    harness.session.set_role(Some("premium"));
    let dashboard = harness.dashboard(Arc::new(FailingPortalLinks));
    let mut rx = dashboard.watch();

    harness.session.sign_in("u1");
    let view = wait_for(&mut rx, |v| v.billing.is_some() && fully_loaded(v)).await;

    assert!(view.visible_plans().is_empty());
    assert!(!view.shows_catalog());
    let text = render(&view);
    assert!(text.contains("You are paying $19.99 per month, giving you the role: premium."));
    assert!(!text.contains("== Plans =="));
}

#[tokio::test]
async fn test_subscribe_navigates_to_checkout() {
    let harness = Harness::new();
    let _extension = spawn_checkout_extension(
        harness.memory.clone(),
        "u1",
        Duration::from_millis(20),
        None,
    );
    let dashboard = harness.dashboard(Arc::new(FailingPortalLinks));
    let mut rx = dashboard.watch();

    harness.session.sign_in("u1");
    wait_for(&mut rx, fully_loaded).await;

    dashboard.subscribe(PriceId::new("pro_month")).await.unwrap();
    let view = wait_for(&mut rx, |v| matches!(v.action, ActionState::Navigated(_))).await;

    let ActionState::Navigated(url) = view.action else {
        unreachable!()
    };
    assert_eq!(harness.navigator.visited(), vec![url]);
}

#[tokio::test]
async fn test_action_rejected_while_loading() {
    let harness = Harness::new();
    // No extension: the checkout stays loading until its timeout
    let dashboard = harness.dashboard(Arc::new(FailingPortalLinks));
    let mut rx = dashboard.watch();

    harness.session.sign_in("u1");
    wait_for(&mut rx, |v| v.identity.is_some()).await;

    dashboard.subscribe(PriceId::new("pro_month")).await.unwrap();
    assert_eq!(
        dashboard.snapshot().action,
        ActionState::Loading(ActionKind::Checkout)
    );

    assert!(matches!(
        dashboard.subscribe(PriceId::new("pro_month")).await,
        Err(ClientError::ActionInProgress)
    ));
    assert!(matches!(
        dashboard.open_portal().await,
        Err(ClientError::ActionInProgress)
    ));
}

#[tokio::test]
async fn test_portal_failure_is_visible() {
    let harness = Harness::new();
    let dashboard = harness.dashboard(Arc::new(FailingPortalLinks));
    let mut rx = dashboard.watch();

    harness.session.sign_in("u1");
    wait_for(&mut rx, |v| v.identity.is_some()).await;

    dashboard.open_portal().await.unwrap();
    let view = wait_for(&mut rx, |v| matches!(v.action, ActionState::Failed(_))).await;

    let ActionState::Failed(message) = &view.action else {
        unreachable!()
    };
    assert!(message.contains("portal unavailable"));
    assert!(render(&view).contains("Error: "));
    assert!(harness.navigator.visited().is_empty());

    // Failed is not terminal
    dashboard.open_portal().await.unwrap();
}

#[tokio::test]
async fn test_portal_navigates() {
    let harness = Harness::new();
    let links = Arc::new(StaticPortalLinks::new("https://billing.stripe.com/p/session/test"));
    let dashboard = harness.dashboard(links);
    let mut rx = dashboard.watch();

    harness.session.sign_in("u1");
    wait_for(&mut rx, |v| v.identity.is_some()).await;

    dashboard.open_portal().await.unwrap();
    wait_for(&mut rx, |v| matches!(v.action, ActionState::Navigated(_))).await;
    assert_eq!(
        harness.navigator.visited(),
        vec!["https://billing.stripe.com/p/session/test".to_string()]
    );
}

#[tokio::test]
async fn test_actions_require_identity() {
    let harness = Harness::new();
    let dashboard = harness.dashboard(Arc::new(FailingPortalLinks));

    assert!(matches!(
        dashboard.open_portal().await,
        Err(ClientError::NotSignedIn)
    ));
}

#[tokio::test]
async fn test_sign_out_resets_view() {
    let harness = Harness::new();
    seed_subscription(&harness.memory, "u1");
    let dashboard = harness.dashboard(Arc::new(FailingPortalLinks));
    let mut rx = dashboard.watch();

    harness.session.sign_in("u1");
    let before = wait_for(&mut rx, |v| v.billing.is_some() && fully_loaded(v)).await;

    dashboard.sign_out().await.unwrap();
    let after = wait_for(&mut rx, |v| v.identity.is_none()).await;

    assert!(after.generation > before.generation);
    assert!(after.plans.is_empty());
    assert!(after.billing.is_none());
    assert!(after.content.is_empty());

    // Nothing from the old session shows up later
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(dashboard.snapshot(), after);
}

#[tokio::test]
async fn test_switching_users_starts_a_new_generation() {
    let harness = Harness::new();
    seed_subscription(&harness.memory, "u1");
    let dashboard = harness.dashboard(Arc::new(FailingPortalLinks));
    let mut rx = dashboard.watch();

    harness.session.sign_in("u1");
    let first = wait_for(&mut rx, |v| v.billing.is_some()).await;

    harness.session.sign_in("u2");
    let second = wait_for(&mut rx, |v| {
        v.identity.as_ref().is_some_and(|i| i.uid.as_str() == "u2") && fully_loaded(v)
    })
    .await;

    assert!(second.generation > first.generation);
    // u2 has no subscription
    assert!(second.billing.is_none());
    assert_eq!(second.plans.len(), 2);
}

#[tokio::test]
async fn test_unanswered_portal_call_does_not_strand_loading() {
    let harness = Harness::new();
    let dashboard = harness.dashboard(Arc::new(HangingPortalLinks));
    let mut rx = dashboard.watch();

    harness.session.sign_in("u1");
    wait_for(&mut rx, |v| v.identity.is_some()).await;

    dashboard.open_portal().await.unwrap();
    assert_eq!(dashboard.snapshot().action, ActionState::Loading(ActionKind::Portal));

    let view = wait_for(&mut rx, |v| matches!(v.action, ActionState::Failed(_))).await;
    assert!(!view.action.is_loading());
    assert!(harness.navigator.visited().is_empty());

    // The next action is accepted again
    dashboard.open_portal().await.unwrap();
}

#[tokio::test]
async fn test_failed_content_tier_is_isolated() {
    let harness = Harness::new();
    harness
        .memory
        .set_document("content-premium/deep", fields(json!({"title": "Deep dive"})))
        .unwrap();
    harness.store.fail_collection("content-premium");
    let dashboard = harness.dashboard(Arc::new(FailingPortalLinks));
    let mut rx = dashboard.watch();

    harness.session.sign_in("u1");
    let view = wait_for(&mut rx, fully_loaded).await;

    let blocks = |tier: ContentTier| {
        view.content
            .iter()
            .find(|(t, _)| *t == tier)
            .map(|(_, blocks)| blocks.clone())
            .unwrap()
    };
    let basic = blocks(ContentTier::basic());
    assert_eq!(basic.len(), 1);
    assert_eq!(basic[0].summary(), "Welcome");
    assert!(blocks(ContentTier::premium()).is_empty());
}
