//! Firebase project configuration

/// The four values identifying a Firebase web app
///
/// All four are required; there are no defaults.
#[derive(Clone, PartialEq, Eq)]
pub struct FirebaseConfig {
    /// Web API key
    pub api_key: String,
    /// Auth domain, e.g. `my-app.firebaseapp.com`
    pub auth_domain: String,
    /// Realtime database URL
    pub database_url: String,
    /// Project ID
    pub project_id: String,
}

impl FirebaseConfig {
    /// Create a new Firebase config
    pub fn new(
        api_key: impl Into<String>,
        auth_domain: impl Into<String>,
        database_url: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            auth_domain: auth_domain.into(),
            database_url: database_url.into(),
            project_id: project_id.into(),
        }
    }
}

impl std::fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("api_key", &"[REDACTED]")
            .field("auth_domain", &self.auth_domain)
            .field("database_url", &self.database_url)
            .field("project_id", &self.project_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_api_key() {
        let config = FirebaseConfig::new("AIza-secret", "app.firebaseapp.com", "https://db", "app");
        let debug = format!("{config:?}");
        assert!(!debug.contains("AIza-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
