//! Firebase Authentication over the REST APIs
//!
//! Email/password sign-in goes through the Identity Toolkit API and token
//! refresh through the Secure Token API. The current identity is published
//! on a watch channel so observers see sign-in and sign-out as they happen.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use gatehouse_store::TokenSource;
use gatehouse_types::Identity;
use serde::Deserialize;
use tokio::sync::{watch, RwLock};

use crate::{AuthConfig, AuthError, IdTokenClaims, SessionProvider, TokenSet};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Identity Toolkit sign-in response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

/// Secure Token refresh response
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Session provider backed by Firebase Authentication
///
/// The token lock is never held across a network call. Every sign-in and
/// sign-out bumps the session epoch, and a refresh that finishes in a later
/// epoch than it started in is discarded.
pub struct FirebaseAuth {
    client: reqwest::Client,
    config: AuthConfig,
    tokens: RwLock<Option<TokenSet>>,
    epoch: AtomicU64,
    identity: watch::Sender<Option<Identity>>,
}

impl FirebaseAuth {
    /// Create a signed-out provider
    pub fn new(config: AuthConfig) -> Self {
        let (identity, _) = watch::channel(None);
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config,
            tokens: RwLock::new(None),
            epoch: AtomicU64::new(0),
            identity,
        }
    }

    /// Sign in with email and password
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let response = self
            .client
            .post(self.config.sign_in_url())
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        let body: SignInResponse = response.json().await?;
        let tokens = TokenSet::new(body.id_token, body.refresh_token, parse_expiry(&body.expires_in));
        let identity = Identity::new(body.local_id, body.email);

        self.start_session(tokens, identity.clone()).await;
        tracing::info!(uid = %identity.uid, "signed in");
        Ok(identity)
    }

    /// Resume a session from a stored refresh token
    pub async fn restore_session(&self, refresh_token: &str) -> Result<Identity, AuthError> {
        let (tokens, uid) = self.exchange_refresh_token(refresh_token).await?;

        // The refresh response carries no email; take it from the token itself
        let email = IdTokenClaims::decode(&tokens.id_token)
            .ok()
            .and_then(|claims| claims.email);
        let identity = Identity::new(uid, email);

        self.start_session(tokens, identity.clone()).await;
        tracing::info!(uid = %identity.uid, "session restored");
        Ok(identity)
    }

    /// Current refresh token, for persisting the session
    pub async fn refresh_token(&self) -> Option<String> {
        self.tokens
            .read()
            .await
            .as_ref()
            .map(|tokens| tokens.refresh_token.clone())
    }

    /// A valid ID token, refreshed first when close to expiry
    pub async fn id_token(&self) -> Result<String, AuthError> {
        {
            let tokens = self.tokens.read().await;
            match tokens.as_ref() {
                None => return Err(AuthError::NotSignedIn),
                Some(tokens) if !tokens.expires_within(self.config.refresh_margin) => {
                    return Ok(tokens.id_token.clone());
                }
                Some(_) => {}
            }
        }

        Ok(self.force_refresh().await?.id_token)
    }

    /// Refresh the ID token unconditionally
    ///
    /// A refresh rejected as revoked or disabled ends the local session. If
    /// the session ends or changes while the request is out, the result is
    /// dropped and `NotSignedIn` returned.
    pub async fn force_refresh(&self) -> Result<TokenSet, AuthError> {
        let (refresh_token, epoch) = {
            let tokens = self.tokens.read().await;
            let refresh_token = tokens
                .as_ref()
                .map(|tokens| tokens.refresh_token.clone())
                .ok_or(AuthError::NotSignedIn)?;
            (refresh_token, self.epoch.load(Ordering::SeqCst))
        };

        let outcome = self.exchange_refresh_token(&refresh_token).await;

        let mut guard = self.tokens.write().await;
        if self.epoch.load(Ordering::SeqCst) != epoch || guard.is_none() {
            tracing::debug!("session changed during refresh, discarding result");
            return Err(AuthError::NotSignedIn);
        }

        match outcome {
            Ok((tokens, _)) => {
                *guard = Some(tokens.clone());
                tracing::debug!(expires_at = %tokens.expires_at, "id token refreshed");
                Ok(tokens)
            }
            Err(e) if e.ends_session() => {
                tracing::warn!(code = e.error_code(), "refresh rejected, signing out");
                self.epoch.fetch_add(1, Ordering::SeqCst);
                *guard = None;
                drop(guard);
                self.identity.send_replace(None);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    async fn start_session(&self, tokens: TokenSet, identity: Identity) {
        let mut guard = self.tokens.write().await;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        *guard = Some(tokens);
        drop(guard);
        self.identity.send_replace(Some(identity));
    }

    async fn exchange_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<(TokenSet, String), AuthError> {
        let response = self
            .client
            .post(self.config.refresh_url())
            .form(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        let body: RefreshResponse = response.json().await?;
        let tokens = TokenSet::new(body.id_token, body.refresh_token, parse_expiry(&body.expires_in));
        Ok((tokens, body.user_id))
    }
}

impl std::fmt::Debug for FirebaseAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseAuth")
            .field("config", &self.config)
            .field("identity", &*self.identity.borrow())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionProvider for FirebaseAuth {
    fn current_identity(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    fn watch_identity(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }

    async fn sign_out(&self) {
        // Dependents reset before the token lock is taken
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let was_signed_in = self.identity.send_replace(None).is_some();
        *self.tokens.write().await = None;
        if was_signed_in {
            tracing::info!("signed out");
        }
    }

    async fn refreshed_claims(&self) -> Result<IdTokenClaims, AuthError> {
        let tokens = self.force_refresh().await?;
        IdTokenClaims::decode(&tokens.id_token)
    }
}

#[async_trait]
impl TokenSource for FirebaseAuth {
    async fn bearer_token(&self) -> Option<String> {
        match self.id_token().await {
            Ok(token) => Some(token),
            Err(AuthError::NotSignedIn) => None,
            Err(e) => {
                tracing::warn!(error = %e, "no bearer token available");
                None
            }
        }
    }
}

/// Map a non-success response to an error from its `error.message` code
async fn provider_error(response: reqwest::Response) -> AuthError {
    let status = response.status();
    match response.json::<ErrorEnvelope>().await {
        Ok(envelope) => AuthError::from_provider_code(&envelope.error.message),
        Err(_) => AuthError::Provider(format!("HTTP {status}")),
    }
}

fn parse_expiry(expires_in: &str) -> i64 {
    expires_in.parse().unwrap_or(3600)
}
