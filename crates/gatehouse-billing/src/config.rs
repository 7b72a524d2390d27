//! Billing configuration

const STRIPE_CHECKOUT_BASE: &str = "https://checkout.stripe.com/pay";
const DEFAULT_REGION: &str = "us-central1";
const DEFAULT_PORTAL_FUNCTION: &str = "ext-firestore-stripe-subscriptions-createPortalLink";

/// Stripe hosted checkout configuration
#[derive(Clone)]
pub struct StripeConfig {
    /// Publishable key (`pk_test_...` or `pk_live_...`)
    pub publishable_key: String,
    /// Base URL of hosted checkout pages
    pub checkout_base: String,
}

impl StripeConfig {
    /// Create a new Stripe config
    pub fn new(publishable_key: impl Into<String>) -> Self {
        Self {
            publishable_key: publishable_key.into(),
            checkout_base: STRIPE_CHECKOUT_BASE.to_string(),
        }
    }

    /// Override the hosted checkout base URL
    pub fn with_checkout_base(mut self, base: impl Into<String>) -> Self {
        self.checkout_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether the key has the shape of a publishable key
    ///
    /// Secret keys must never reach a client.
    pub fn has_publishable_key(&self) -> bool {
        self.publishable_key.starts_with("pk_")
    }

    /// Hosted checkout URL for a session id
    pub fn checkout_url(&self, session_id: &str) -> String {
        format!("{}/{}", self.checkout_base, session_id)
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = if self.publishable_key.starts_with("pk_live_") {
            "live"
        } else {
            "test"
        };
        f.debug_struct("StripeConfig")
            .field("mode", &mode)
            .field("checkout_base", &self.checkout_base)
            .finish()
    }
}

/// Remote (callable) functions configuration
#[derive(Debug, Clone)]
pub struct FunctionsConfig {
    /// Firebase project ID
    pub project_id: String,
    /// Deployment region
    pub region: String,
    /// Full name of the portal link function
    pub portal_function: String,
    /// Base URL override (emulator or test server)
    pub base_url: Option<String>,
}

impl FunctionsConfig {
    /// Create a config with the default region and function name
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            region: DEFAULT_REGION.to_string(),
            portal_function: DEFAULT_PORTAL_FUNCTION.to_string(),
            base_url: None,
        }
    }

    /// Set region
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set the portal function name
    pub fn with_portal_function(mut self, name: impl Into<String>) -> Self {
        self.portal_function = name.into();
        self
    }

    /// Send calls to a fixed base URL instead of the regional host
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = Some(base.into().trim_end_matches('/').to_string());
        self
    }

    /// HTTPS endpoint of a function
    pub fn function_url(&self, name: &str) -> String {
        match &self.base_url {
            Some(base) => format!("{base}/{name}"),
            None => format!(
                "https://{}-{}.cloudfunctions.net/{}",
                self.region, self.project_id, name
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_url_defaults() {
        let config = FunctionsConfig::new("demo");
        assert_eq!(
            config.function_url(&config.portal_function),
            "https://us-central1-demo.cloudfunctions.net/ext-firestore-stripe-subscriptions-createPortalLink"
        );

        let config = config.with_region("europe-west1").with_base_url("http://localhost:5001/");
        assert_eq!(config.function_url("f"), "http://localhost:5001/f");
    }

    #[test]
    fn test_stripe_config() {
        let config = StripeConfig::new("pk_test_123");
        assert!(config.has_publishable_key());
        assert_eq!(
            config.checkout_url("cs_test_1"),
            "https://checkout.stripe.com/pay/cs_test_1"
        );
        assert!(!StripeConfig::new("sk_test_123").has_publishable_key());
        assert!(!format!("{config:?}").contains("pk_test_123"));
    }
}
