//! Seed data and a stand-in for the payment extension

use std::time::Duration;

use gatehouse_store::{DocumentStore, MemoryStore, Query};
use serde_json::json;
use tokio::task::JoinHandle;

use super::fields;

/// Two plans, prices written out of order
#[allow(dead_code)]
pub fn seed_catalog(store: &MemoryStore) {
    store
        .set_document(
            "product/prod_pro",
            fields(json!({"active": true, "name": "Pro", "role": "premium"})),
        )
        .unwrap();
    store
        .set_document(
            "product/prod_basic",
            fields(json!({"active": true, "name": "Basic", "role": "basic"})),
        )
        .unwrap();
    store
        .set_document(
            "product/prod_retired",
            fields(json!({"active": false, "name": "Retired"})),
        )
        .unwrap();
    store
        .set_document(
            "product/prod_pro/prices/pro_year",
            fields(json!({"currency": "usd", "unit_amount": 19900, "interval": "year"})),
        )
        .unwrap();
    store
        .set_document(
            "product/prod_pro/prices/pro_month",
            fields(json!({"currency": "usd", "unit_amount": 1999, "interval": "month"})),
        )
        .unwrap();
    store
        .set_document(
            "product/prod_basic/prices/basic_month",
            fields(json!({"currency": "usd", "unit_amount": 499, "interval": "month"})),
        )
        .unwrap();
    store
        .set_document("content-basic/welcome", fields(json!({"title": "Welcome"})))
        .unwrap();
}

/// An active subscription to the monthly Pro price
#[allow(dead_code)]
pub fn seed_subscription(store: &MemoryStore, uid: &str) {
    store
        .set_document(
            &format!("customer/{uid}/subscriptions/sub_1"),
            fields(json!({
                "status": "active",
                "price": "product/prod_pro/prices/pro_month",
                "role": "premium"
            })),
        )
        .unwrap();
}

/// Answer every new checkout session request of `uid` after `delay`
///
/// Writes `sessionId` (or `error.message` when `error` is set) the way the
/// payment extension does.
#[allow(dead_code)]
pub fn spawn_checkout_extension(
    store: MemoryStore,
    uid: &str,
    delay: Duration,
    error: Option<&str>,
) -> JoinHandle<()> {
    let collection = format!("customer/{uid}/checkout_sessions");
    let error = error.map(String::from);

    tokio::spawn(async move {
        let mut listener = store
            .listen_query(Query::new(collection))
            .await
            .unwrap();
        let mut answered = std::collections::HashSet::new();

        while let Some(Ok(snapshot)) = listener.next().await {
            for doc in snapshot.documents {
                if !answered.insert(doc.path.clone()) {
                    continue;
                }
                let store = store.clone();
                let error = error.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let patch = match error {
                        Some(message) => json!({"error": {"message": message}}),
                        None => json!({"sessionId": format!("cs_test_{}", doc.id())}),
                    };
                    store.merge_document(&doc.path, fields(patch)).unwrap();
                });
            }
        }
    })
}
