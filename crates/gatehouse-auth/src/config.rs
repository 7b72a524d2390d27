//! Configuration types for the session provider

use std::time::Duration;

use gatehouse_types::FirebaseConfig;

const IDENTITY_TOOLKIT_BASE: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_BASE: &str = "https://securetoken.googleapis.com/v1";

/// Firebase Authentication configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// Web API key
    pub api_key: String,
    /// Identity Toolkit base URL
    pub identity_toolkit_base: String,
    /// Secure Token base URL
    pub secure_token_base: String,
    /// Refresh the ID token when it expires within this margin
    pub refresh_margin: Duration,
}

impl AuthConfig {
    /// Create a new auth config
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            identity_toolkit_base: IDENTITY_TOOLKIT_BASE.to_string(),
            secure_token_base: SECURE_TOKEN_BASE.to_string(),
            refresh_margin: Duration::from_secs(5 * 60),
        }
    }

    /// Point both auth APIs at one base URL (emulator or test server)
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        self.identity_toolkit_base = base.clone();
        self.secure_token_base = base;
        self
    }

    /// Set refresh margin
    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// Email/password sign-in endpoint
    pub fn sign_in_url(&self) -> String {
        format!(
            "{}/accounts:signInWithPassword?key={}",
            self.identity_toolkit_base, self.api_key
        )
    }

    /// Token refresh endpoint
    pub fn refresh_url(&self) -> String {
        format!("{}/token?key={}", self.secure_token_base, self.api_key)
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key", &"[REDACTED]")
            .field("identity_toolkit_base", &self.identity_toolkit_base)
            .field("secure_token_base", &self.secure_token_base)
            .field("refresh_margin", &self.refresh_margin)
            .finish()
    }
}

impl From<&FirebaseConfig> for AuthConfig {
    fn from(config: &FirebaseConfig) -> Self {
        Self::new(config.api_key.clone())
    }
}
