//! Auth errors

use thiserror::Error;

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// No user is signed in
    #[error("not signed in")]
    NotSignedIn,

    /// Invalid credentials (unknown email, wrong password)
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The session can no longer be refreshed (revoked, disabled, deleted)
    #[error("session revoked: {0}")]
    SessionRevoked(String),

    /// Invalid token (malformed, undecodable payload)
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Provider rejected the request for another reason
    #[error("provider error: {0}")]
    Provider(String),

    /// Transport failure talking to the provider
    #[error("transport error: {0}")]
    Transport(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AuthError {
    /// Map a Firebase Auth REST error code to an error
    pub fn from_provider_code(code: &str) -> Self {
        // Codes may carry a detail suffix: "TOO_MANY_ATTEMPTS_TRY_LATER : ..."
        let code = code.split(" : ").next().unwrap_or(code).trim();
        match code {
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS"
            | "INVALID_EMAIL" => Self::InvalidCredentials,
            "TOKEN_EXPIRED" | "USER_DISABLED" | "USER_NOT_FOUND" | "INVALID_REFRESH_TOKEN" => {
                Self::SessionRevoked(code.to_string())
            }
            "INVALID_API_KEY" | "API_KEY_INVALID" => Self::Configuration(code.to_string()),
            other => Self::Provider(other.to_string()),
        }
    }

    /// Whether the local session must be dropped after this error
    pub fn ends_session(&self) -> bool {
        matches!(self, Self::SessionRevoked(_))
    }

    /// Get error code for logs and UI
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotSignedIn => "NOT_SIGNED_IN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::SessionRevoked(_) => "SESSION_REVOKED",
            Self::InvalidToken(_) => "INVALID_TOKEN",
            Self::Provider(_) => "PROVIDER_ERROR",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!(error = %err, "auth request failed");
        Self::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_codes() {
        assert!(matches!(
            AuthError::from_provider_code("INVALID_PASSWORD"),
            AuthError::InvalidCredentials
        ));
        assert!(AuthError::from_provider_code("USER_DISABLED").ends_session());
        assert!(matches!(
            AuthError::from_provider_code("TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled"),
            AuthError::Provider(code) if code == "TOO_MANY_ATTEMPTS_TRY_LATER"
        ));
        assert!(!AuthError::InvalidCredentials.ends_session());
    }
}
