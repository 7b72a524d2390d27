//! In-memory session provider

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gatehouse_auth::{AuthError, IdTokenClaims, SessionProvider};
use gatehouse_types::Identity;
use serde_json::{Map, Value};
use tokio::sync::{watch, Notify};

/// Session provider with scripted claims
pub struct MockSession {
    identity: watch::Sender<Option<Identity>>,
    role: Mutex<Option<String>>,
    fail_refresh: Mutex<bool>,
    gate: Mutex<Option<Arc<Notify>>>,
    refresh_calls: AtomicUsize,
}

#[allow(dead_code)]
impl MockSession {
    pub fn new() -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            identity,
            role: Mutex::new(None),
            fail_refresh: Mutex::new(false),
            gate: Mutex::new(None),
            refresh_calls: AtomicUsize::new(0),
        }
    }

    pub fn signed_in(uid: &str) -> Self {
        let session = Self::new();
        session.sign_in(uid);
        session
    }

    pub fn sign_in(&self, uid: &str) -> Identity {
        let identity = Identity::new(uid, Some(format!("{uid}@example.com")));
        self.identity.send_replace(Some(identity.clone()));
        identity
    }

    pub fn identity(&self) -> Identity {
        self.identity
            .borrow()
            .clone()
            .expect("test session is signed in")
    }

    /// Role carried by refreshed tokens
    pub fn set_role(&self, role: Option<&str>) {
        *self.role.lock().unwrap() = role.map(String::from);
    }

    pub fn fail_refresh(&self, fail: bool) {
        *self.fail_refresh.lock().unwrap() = fail;
    }

    /// Block refreshes until the returned gate is notified
    pub fn hold_refresh(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for MockSession {
    fn current_identity(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    fn watch_identity(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }

    async fn sign_out(&self) {
        self.identity.send_replace(None);
    }

    async fn refreshed_claims(&self) -> Result<IdTokenClaims, AuthError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if *self.fail_refresh.lock().unwrap() {
            return Err(AuthError::Transport("refresh unavailable".to_string()));
        }
        let identity = self.current_identity().ok_or(AuthError::NotSignedIn)?;

        let mut custom = Map::new();
        if let Some(role) = self.role.lock().unwrap().clone() {
            custom.insert("stripeRole".to_string(), Value::String(role));
        }
        Ok(IdTokenClaims {
            sub: identity.uid.to_string(),
            email: identity.email,
            iat: 0,
            exp: i64::MAX,
            custom,
        })
    }
}
