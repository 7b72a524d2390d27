//! Common test utilities for gatehouse-client integration tests

pub mod fake_extension;
pub mod mock_billing;
pub mod mock_session;
pub mod mock_store;

use std::time::Duration;

use serde_json::{Map, Value};

#[allow(unused_imports)]
pub use fake_extension::{seed_catalog, seed_subscription, spawn_checkout_extension};
#[allow(unused_imports)]
pub use mock_billing::{
    FailingPortalLinks, HangingPortalLinks, RecordingNavigator, StaticPortalLinks,
};
#[allow(unused_imports)]
pub use mock_session::MockSession;
#[allow(unused_imports)]
pub use mock_store::FlakyStore;

/// Upper bound for anything a test waits on
#[allow(dead_code)]
pub const WAIT: Duration = Duration::from_secs(2);

/// Turn a JSON object literal into document fields
#[allow(dead_code)]
pub fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
