//! ID tokens and their claims
//!
//! Claims are read from the token payload without signature verification,
//! the same way the web SDK exposes them to the page. Anything that grants
//! access is enforced server-side by the database's security rules.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::AuthError;

/// Claims carried by a Firebase ID token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Subject (Firebase user ID)
    pub sub: String,
    /// Email
    #[serde(default)]
    pub email: Option<String>,
    /// Issued at timestamp
    #[serde(default)]
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// All other claims, including custom claims such as `stripeRole`
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl IdTokenClaims {
    /// Decode the payload segment of a JWT
    pub fn decode(token: &str) -> Result<Self, AuthError> {
        let mut parts = token.split('.');
        let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => return Err(AuthError::InvalidToken("expected three segments".to_string())),
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    /// Read a custom claim as a string
    pub fn claim_str(&self, name: &str) -> Option<&str> {
        self.custom.get(name).and_then(Value::as_str)
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Tokens held for the signed-in user
#[derive(Clone)]
pub struct TokenSet {
    /// ID token (JWT)
    pub id_token: String,
    /// Refresh token
    pub refresh_token: String,
    /// When the ID token expires
    pub expires_at: DateTime<Utc>,
}

impl TokenSet {
    /// Create a token set from a lifetime in seconds, as the REST APIs report it
    pub fn new(id_token: String, refresh_token: String, expires_in_secs: i64) -> Self {
        Self {
            id_token,
            refresh_token,
            expires_at: Utc::now() + ChronoDuration::seconds(expires_in_secs),
        }
    }

    /// Whether the ID token expires within `margin`
    pub fn expires_within(&self, margin: std::time::Duration) -> bool {
        let margin = ChronoDuration::from_std(margin).unwrap_or_else(|_| ChronoDuration::zero());
        Utc::now() + margin >= self.expires_at
    }
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSet")
            .field("id_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn unsigned_token(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}
