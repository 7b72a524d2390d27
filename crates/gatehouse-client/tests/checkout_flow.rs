//! Checkout initiation against the in-memory store and a stand-in extension

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{fields, spawn_checkout_extension, RecordingNavigator};
use gatehouse_billing::{StripeConfig, StripeCheckout};
use gatehouse_client::{CheckoutInitiator, ClientError};
use gatehouse_store::MemoryStore;
use gatehouse_types::{Identity, PriceId};
use serde_json::json;

const ORIGIN: &str = "https://app.example.com";

fn initiator(
    store: &MemoryStore,
    navigator: Arc<RecordingNavigator>,
    timeout: Duration,
) -> CheckoutInitiator {
    let redirector = StripeCheckout::new(StripeConfig::new("pk_test_1"), navigator).unwrap();
    CheckoutInitiator::new(Arc::new(store.clone()), Arc::new(redirector), ORIGIN, timeout)
}

fn identity() -> Identity {
    Identity::new("u1", Some("u1@example.com".to_string()))
}

#[tokio::test]
async fn test_checkout_navigates_once_session_id_arrives() {
    let store = MemoryStore::new();
    let navigator = Arc::new(RecordingNavigator::new());
    let _extension = spawn_checkout_extension(store.clone(), "u1", Duration::from_millis(20), None);

    let checkout = initiator(&store, navigator.clone(), Duration::from_secs(2));
    let navigation = checkout
        .start_checkout(&identity(), &PriceId::new("pro_month"))
        .await
        .unwrap();

    assert!(navigation
        .url
        .starts_with("https://checkout.stripe.com/pay/cs_test_"));
    assert_eq!(navigator.visited(), vec![navigation.url]);
    assert!(!checkout.is_in_flight());

    // The request carries the price and both return URLs
    let requests = store.collection("customer/u1/checkout_sessions");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].get("price"), Some(&json!("pro_month")));
    assert_eq!(requests[0].get("success_url"), Some(&json!(ORIGIN)));
    assert_eq!(requests[0].get("cancel_url"), Some(&json!(ORIGIN)));
}

#[tokio::test]
async fn test_back_to_back_checkouts_navigate_at_most_once() {
    let store = MemoryStore::new();
    let navigator = Arc::new(RecordingNavigator::new());
    let _extension = spawn_checkout_extension(store.clone(), "u1", Duration::from_millis(50), None);

    let checkout = initiator(&store, navigator.clone(), Duration::from_secs(2));
    let identity = identity();
    let price = PriceId::new("pro_month");

    let (first, second) = tokio::join!(
        checkout.start_checkout(&identity, &price),
        checkout.start_checkout(&identity, &price),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|o| matches!(o, Err(ClientError::CheckoutInProgress))));
    assert_eq!(navigator.visited().len(), 1);
    assert_eq!(store.collection("customer/u1/checkout_sessions").len(), 1);
}

#[tokio::test]
async fn test_later_snapshots_are_ignored() {
    let store = MemoryStore::new();
    let navigator = Arc::new(RecordingNavigator::new());
    let _extension = spawn_checkout_extension(store.clone(), "u1", Duration::ZERO, None);

    let checkout = initiator(&store, navigator.clone(), Duration::from_secs(2));
    checkout
        .start_checkout(&identity(), &PriceId::new("pro_month"))
        .await
        .unwrap();

    // The extension rewrites the session after the redirect
    let path = store.collection("customer/u1/checkout_sessions")[0].path.clone();
    store
        .merge_document(&path, fields(json!({"sessionId": "cs_rewritten"})))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(navigator.visited().len(), 1);
}

#[tokio::test]
async fn test_checkout_times_out_without_session_id() {
    let store = MemoryStore::new();
    let navigator = Arc::new(RecordingNavigator::new());

    let checkout = initiator(&store, navigator.clone(), Duration::from_millis(100));
    let err = checkout
        .start_checkout(&identity(), &PriceId::new("pro_month"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Timeout(d) if d == Duration::from_millis(100)));
    assert!(navigator.visited().is_empty());
    assert!(!checkout.is_in_flight());
}

#[tokio::test]
async fn test_extension_error_fails_checkout() {
    let store = MemoryStore::new();
    let navigator = Arc::new(RecordingNavigator::new());
    let _extension = spawn_checkout_extension(
        store.clone(),
        "u1",
        Duration::from_millis(10),
        Some("No such price: 'pro_month'"),
    );

    let checkout = initiator(&store, navigator.clone(), Duration::from_secs(2));
    let err = checkout
        .start_checkout(&identity(), &PriceId::new("pro_month"))
        .await
        .unwrap_err();

    match err {
        ClientError::Checkout(message) => assert_eq!(message, "No such price: 'pro_month'"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(navigator.visited().is_empty());
}
