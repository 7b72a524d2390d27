//! Subscription and checkout session types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{PriceId, PriceTier};

/// Subscription status as written by the Stripe extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Subscription is active
    Active,
    /// In trial period
    Trialing,
    /// Payment is past due
    PastDue,
    /// Subscription was canceled
    Canceled,
    /// First payment has not completed
    Incomplete,
    /// First payment never completed
    IncompleteExpired,
    /// Payment attempts exhausted
    Unpaid,
    /// Any status this client does not know about
    #[serde(other)]
    Other,
}

impl SubscriptionStatus {
    /// Status value used when querying for the active subscription
    pub const ACTIVE: &'static str = "active";

    /// Whether this status grants access
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// A customer's subscription record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscription ID
    pub id: String,
    /// Subscription status
    pub status: SubscriptionStatus,
    /// Document path of the subscribed price, e.g. `product/prod_1/prices/price_1`
    pub price: String,
    /// Claim the subscription grants
    #[serde(default)]
    pub role: Option<String>,
    /// Current billing period start
    #[serde(default)]
    pub current_period_start: Option<DateTime<Utc>>,
    /// Current billing period end
    #[serde(default)]
    pub current_period_end: Option<DateTime<Utc>>,
    /// Whether the subscription ends with the current period
    #[serde(default)]
    pub cancel_at_period_end: bool,
}

impl Subscription {
    /// Subcollection name under `customer/{uid}`
    pub const COLLECTION: &'static str = "subscriptions";
}

/// Billing summary shown once a subscription is active
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingSummary {
    /// The active subscription
    pub subscription: Subscription,
    /// The subscribed price
    pub price: PriceTier,
    /// The access-tier claim read from a freshly refreshed token
    pub claim: Option<String>,
    /// Composed message
    pub message: String,
}

impl BillingSummary {
    /// Compose the summary for a subscription
    pub fn new(subscription: Subscription, price: PriceTier, claim: Option<String>) -> Self {
        let message = format!(
            "You are paying {}, giving you the role: {}.",
            price.display(),
            claim.as_deref().unwrap_or("none")
        );
        Self {
            subscription,
            price,
            claim,
            message,
        }
    }
}

/// Checkout session request written to `customer/{uid}/checkout_sessions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSessionRequest {
    /// Price ID to subscribe to
    pub price: PriceId,
    /// Success redirect URL
    pub success_url: String,
    /// Cancel redirect URL
    pub cancel_url: String,
}

impl CheckoutSessionRequest {
    /// Subcollection name under `customer/{uid}`
    pub const COLLECTION: &'static str = "checkout_sessions";

    /// Request a session that returns to `origin` either way
    pub fn new(price: PriceId, origin: impl Into<String>) -> Self {
        let origin = origin.into();
        Self {
            price,
            success_url: origin.clone(),
            cancel_url: origin,
        }
    }
}

/// Fields the payment provider writes back onto a checkout session request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSessionState {
    /// Checkout session ID, once created
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
    /// Hosted checkout URL, when the provider supplies one
    #[serde(default)]
    pub url: Option<String>,
    /// Error written when session creation failed
    #[serde(default)]
    pub error: Option<CheckoutSessionError>,
}

/// Error written by the provider onto a checkout session request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSessionError {
    /// Error message
    pub message: String,
}
