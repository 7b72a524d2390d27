//! Payment boundary doubles

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use gatehouse_billing::{BillingError, Navigator, PortalLinks, PortalSession};

/// Navigator that records every target
#[derive(Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl Navigator for RecordingNavigator {
    async fn assign(&self, url: &str) -> Result<(), BillingError> {
        self.visited.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// Portal function that always answers with the same link
pub struct StaticPortalLinks {
    pub url: String,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl StaticPortalLinks {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PortalLinks for StaticPortalLinks {
    async fn create_portal_link(&self, _return_url: &str) -> Result<PortalSession, BillingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(PortalSession {
            url: self.url.clone(),
        })
    }
}

/// Portal function that always fails
#[derive(Default)]
pub struct FailingPortalLinks;

#[async_trait]
impl PortalLinks for FailingPortalLinks {
    async fn create_portal_link(&self, _return_url: &str) -> Result<PortalSession, BillingError> {
        Err(BillingError::Function {
            status: "INTERNAL".to_string(),
            message: "portal unavailable".to_string(),
        })
    }
}

/// Portal function that never answers
#[derive(Default)]
pub struct HangingPortalLinks;

#[async_trait]
impl PortalLinks for HangingPortalLinks {
    async fn create_portal_link(&self, _return_url: &str) -> Result<PortalSession, BillingError> {
        std::future::pending().await
    }
}
