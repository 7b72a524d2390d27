//! Identity types

use serde::{Deserialize, Serialize};

/// Unique user identifier, as issued by the auth provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Create a user ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw ID
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// The signed-in user
///
/// Immutable for the lifetime of a session; a new sign-in produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User ID
    pub uid: UserId,
    /// Email address, if the provider has one
    pub email: Option<String>,
}

impl Identity {
    /// Create a new identity
    pub fn new(uid: impl Into<String>, email: Option<String>) -> Self {
        Self {
            uid: UserId::new(uid),
            email,
        }
    }

    /// Document path of this user's customer record
    pub fn customer_path(&self) -> String {
        format!("customer/{}", self.uid)
    }
}
