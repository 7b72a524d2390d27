//! Callable remote functions
//!
//! Speaks the Firebase callable-function HTTP protocol: the request body is
//! `{"data": ...}`, a success is `{"result": ...}` and a failure is
//! `{"error": {"status", "message"}}`, usually with a non-2xx status.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gatehouse_store::TokenSource;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::config::FunctionsConfig;
use crate::error::BillingError;
use crate::provider::{PortalLinks, PortalSession};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for callable remote functions
#[derive(Clone)]
pub struct CallableFunctions {
    client: Client,
    config: FunctionsConfig,
    tokens: Option<Arc<dyn TokenSource>>,
}

#[derive(Serialize)]
struct CallRequest<'a, T: Serialize> {
    data: &'a T,
}

#[derive(Deserialize)]
struct CallResponse<R> {
    result: Option<R>,
    #[serde(default)]
    error: Option<CallError>,
}

#[derive(Deserialize)]
struct CallError {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PortalLinkRequest<'a> {
    return_url: &'a str,
}

impl CallableFunctions {
    /// Create a new client
    pub fn new(config: FunctionsConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            config,
            tokens: None,
        }
    }

    /// Attach the signed-in user's ID token to calls
    pub fn with_token_source(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Call a function by its full name
    #[instrument(skip(self, data))]
    pub async fn call<T, R>(&self, name: &str, data: &T) -> Result<R, BillingError>
    where
        T: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.config.function_url(name);
        let mut request = self.client.post(&url).json(&CallRequest { data });

        if let Some(tokens) = &self.tokens {
            if let Some(token) = tokens.bearer_token().await {
                request = request.bearer_auth(token);
            }
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        let parsed: CallResponse<R> = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => {
                error!(error = %e, "unparseable function response");
                return Err(BillingError::InvalidResponse(e.to_string()));
            }
            Err(_) => {
                error!(status = %status, "function call failed");
                return Err(BillingError::Function {
                    status: canonical_status(status).to_string(),
                    message: format!("HTTP {status}"),
                });
            }
        };

        if let Some(err) = parsed.error {
            let function_error = BillingError::Function {
                status: err
                    .status
                    .unwrap_or_else(|| canonical_status(status).to_string()),
                message: err.message.unwrap_or_default(),
            };
            error!(error = %function_error, "function returned an error");
            return Err(function_error);
        }

        if !status.is_success() {
            return Err(BillingError::Function {
                status: canonical_status(status).to_string(),
                message: format!("HTTP {status}"),
            });
        }

        parsed.result.ok_or_else(|| {
            BillingError::InvalidResponse("response has neither result nor error".to_string())
        })
    }
}

#[async_trait]
impl PortalLinks for CallableFunctions {
    #[instrument(skip(self))]
    async fn create_portal_link(&self, return_url: &str) -> Result<PortalSession, BillingError> {
        debug!(function = %self.config.portal_function, "creating portal link");

        let session: PortalSession = self
            .call(&self.config.portal_function, &PortalLinkRequest { return_url })
            .await?;

        if session.url.is_empty() {
            return Err(BillingError::InvalidResponse("empty portal url".to_string()));
        }
        Ok(session)
    }
}

impl std::fmt::Debug for CallableFunctions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallableFunctions")
            .field("config", &self.config)
            .field("authenticated", &self.tokens.is_some())
            .finish()
    }
}

/// Canonical status for an HTTP status, used when the body names none
fn canonical_status(status: reqwest::StatusCode) -> &'static str {
    match status.as_u16() {
        200..=299 => "OK",
        400 => "INVALID_ARGUMENT",
        401 => "UNAUTHENTICATED",
        403 => "PERMISSION_DENIED",
        404 => "NOT_FOUND",
        409 => "ABORTED",
        429 => "RESOURCE_EXHAUSTED",
        499 => "CANCELLED",
        501 => "UNIMPLEMENTED",
        503 => "UNAVAILABLE",
        504 => "DEADLINE_EXCEEDED",
        _ => "INTERNAL",
    }
}
