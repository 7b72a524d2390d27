//! Configuration for the content app.

use std::time::Duration;

use gatehouse_billing::{FunctionsConfig, StripeConfig};
use gatehouse_client::ClientConfig;
use gatehouse_types::FirebaseConfig;

/// Content app configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Firebase project settings
    pub firebase: FirebaseConfig,
    /// Workflow settings
    pub client: ClientConfig,
    /// Hosted checkout settings
    pub stripe: StripeConfig,
    /// Remote function settings
    pub functions: FunctionsConfig,
    /// How often live listeners poll the database
    pub poll_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        // Firebase project
        let firebase = FirebaseConfig::new(
            required("FIREBASE_API_KEY")?,
            required("FIREBASE_AUTH_DOMAIN")?,
            required("FIREBASE_DATABASE_URL")?,
            required("FIREBASE_PROJECT_ID")?,
        );

        // Where users come back to
        let origin = required("APP_ORIGIN")?;

        // Stripe
        let stripe = StripeConfig::new(required("STRIPE_PUBLISHABLE_KEY")?);
        if !stripe.has_publishable_key() {
            return Err(ConfigError::Invalid("STRIPE_PUBLISHABLE_KEY"));
        }

        // Checkout wait bound
        let checkout_timeout_secs: u64 = lookup("CHECKOUT_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("CHECKOUT_TIMEOUT_SECS"))?;

        // Portal link wait bound
        let portal_timeout_secs: u64 = lookup("PORTAL_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("PORTAL_TIMEOUT_SECS"))?;

        // Listener polling
        let poll_millis: u64 = lookup("SNAPSHOT_POLL_MILLIS")
            .unwrap_or_else(|| "2000".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("SNAPSHOT_POLL_MILLIS"))?;
        if poll_millis == 0 {
            return Err(ConfigError::Invalid("SNAPSHOT_POLL_MILLIS"));
        }

        let mut client = ClientConfig::new(origin)
            .with_checkout_timeout(Duration::from_secs(checkout_timeout_secs))
            .with_portal_timeout(Duration::from_secs(portal_timeout_secs));
        if let Some(claim) = lookup("STRIPE_ROLE_CLAIM") {
            client = client.with_role_claim(claim);
        }
        client
            .validate()
            .map_err(|_| ConfigError::Invalid("APP_ORIGIN, STRIPE_ROLE_CLAIM or a timeout"))?;

        // Remote functions
        let mut functions = FunctionsConfig::new(firebase.project_id.clone());
        if let Some(region) = lookup("FUNCTIONS_REGION") {
            functions = functions.with_region(region);
        }
        if let Some(name) = lookup("PORTAL_FUNCTION_NAME") {
            functions = functions.with_portal_function(name);
        }

        Ok(Self {
            firebase,
            client,
            stripe,
            functions,
            poll_interval: Duration::from_millis(poll_millis),
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("FIREBASE_API_KEY", "AIza-test"),
        ("FIREBASE_AUTH_DOMAIN", "demo.firebaseapp.com"),
        ("FIREBASE_DATABASE_URL", "https://demo.firebaseio.com"),
        ("FIREBASE_PROJECT_ID", "demo"),
        ("APP_ORIGIN", "http://localhost:3000"),
        ("STRIPE_PUBLISHABLE_KEY", "pk_test_123"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(env(BASE)).unwrap();
        assert_eq!(config.firebase.project_id, "demo");
        assert_eq!(config.client.checkout_timeout, Duration::from_secs(30));
        assert_eq!(config.client.portal_timeout, Duration::from_secs(30));
        assert_eq!(config.client.role_claim, "stripeRole");
        assert_eq!(config.functions.region, "us-central1");
        assert_eq!(config.poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_each_firebase_value_is_required() {
        for key in [
            "FIREBASE_API_KEY",
            "FIREBASE_AUTH_DOMAIN",
            "FIREBASE_DATABASE_URL",
            "FIREBASE_PROJECT_ID",
        ] {
            let pairs: Vec<_> = BASE.iter().copied().filter(|(k, _)| *k != key).collect();
            match Config::from_lookup(env(&pairs)) {
                Err(ConfigError::Missing(missing)) => assert_eq!(missing, key),
                other => panic!("expected {key} to be required, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_overrides() {
        let mut pairs = BASE.to_vec();
        pairs.extend([
            ("CHECKOUT_TIMEOUT_SECS", "5"),
            ("PORTAL_TIMEOUT_SECS", "10"),
            ("STRIPE_ROLE_CLAIM", "plan"),
            ("FUNCTIONS_REGION", "europe-west1"),
            ("PORTAL_FUNCTION_NAME", "createPortalLink"),
            ("SNAPSHOT_POLL_MILLIS", "250"),
        ]);
        let config = Config::from_lookup(env(&pairs)).unwrap();
        assert_eq!(config.client.checkout_timeout, Duration::from_secs(5));
        assert_eq!(config.client.portal_timeout, Duration::from_secs(10));
        assert_eq!(config.client.role_claim, "plan");
        assert_eq!(
            config.functions.function_url(&config.functions.portal_function),
            "https://europe-west1-demo.cloudfunctions.net/createPortalLink"
        );
        assert_eq!(config.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_values() {
        let mut pairs = BASE.to_vec();
        pairs.push(("CHECKOUT_TIMEOUT_SECS", "soon"));
        assert!(matches!(
            Config::from_lookup(env(&pairs)),
            Err(ConfigError::Invalid("CHECKOUT_TIMEOUT_SECS"))
        ));

        let pairs: Vec<_> = BASE
            .iter()
            .map(|&(k, v)| if k == "STRIPE_PUBLISHABLE_KEY" { (k, "sk_live_1") } else { (k, v) })
            .collect();
        assert!(matches!(
            Config::from_lookup(env(&pairs)),
            Err(ConfigError::Invalid("STRIPE_PUBLISHABLE_KEY"))
        ));
    }
}
