//! Plan and price catalog types

use serde::{Deserialize, Serialize};

use crate::money::format_currency;
use crate::ParseError;

/// Stripe product ID (document ID under `product`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(pub String);

impl PlanId {
    /// Create a new plan ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stripe price ID (document ID under `product/{id}/prices`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceId(pub String);

impl PriceId {
    /// Create a new price ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw ID
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PriceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A sellable product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Plan ID
    pub id: PlanId,
    /// Whether the plan is currently sold
    #[serde(default)]
    pub active: bool,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Marketing description
    #[serde(default)]
    pub description: Option<String>,
    /// Claim granted to subscribers of this plan
    #[serde(default)]
    pub role: Option<String>,
}

impl Plan {
    /// Collection holding all plans
    pub const COLLECTION: &'static str = "product";

    /// Path of the price subcollection for this plan
    pub fn prices_path(&self) -> String {
        format!("{}/{}/prices", Self::COLLECTION, self.id)
    }
}

/// Recurring billing interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingInterval {
    /// Billed daily
    Day,
    /// Billed weekly
    Week,
    /// Billed monthly
    Month,
    /// Billed yearly
    Year,
}

impl BillingInterval {
    /// Interval name as used in display strings
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl std::fmt::Display for BillingInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BillingInterval {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" | "daily" => Ok(Self::Day),
            "week" | "weekly" => Ok(Self::Week),
            "month" | "monthly" => Ok(Self::Month),
            "year" | "yearly" | "annual" => Ok(Self::Year),
            _ => Err(ParseError::InvalidInterval(s.to_string())),
        }
    }
}

/// A price option under a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTier {
    /// Price ID
    pub id: PriceId,
    /// Whether the price is currently sold
    #[serde(default = "default_true")]
    pub active: bool,
    /// ISO currency code, lowercase as Stripe writes it
    pub currency: String,
    /// Amount in minor currency units
    pub unit_amount: i64,
    /// Billing interval; `None` for one-time prices
    #[serde(default)]
    pub interval: Option<BillingInterval>,
    /// Number of intervals between bills
    #[serde(default)]
    pub interval_count: Option<u32>,
    /// Price description
    #[serde(default)]
    pub description: Option<String>,
}

fn default_true() -> bool {
    true
}

impl PriceTier {
    /// Display string: `$19.99 per month`
    ///
    /// One-time prices render the amount alone.
    pub fn display(&self) -> String {
        let amount = format_currency(self.unit_amount, &self.currency);
        match self.interval {
            Some(interval) => format!("{amount} per {interval}"),
            None => amount,
        }
    }
}

/// A price tier paired with its display string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTierListing {
    /// The price tier
    pub tier: PriceTier,
    /// Rendered price
    pub display: String,
}

impl From<PriceTier> for PriceTierListing {
    fn from(tier: PriceTier) -> Self {
        let display = tier.display();
        Self { tier, display }
    }
}

/// A plan with its price tiers, ordered by unit amount ascending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanListing {
    /// The plan
    pub plan: Plan,
    /// Price tiers, cheapest first
    pub tiers: Vec<PriceTierListing>,
}

impl PlanListing {
    /// Build a listing, ordering tiers by unit amount
    ///
    /// The sort is stable, so tiers with equal amounts keep the order the
    /// store returned them in.
    pub fn new(plan: Plan, tiers: impl IntoIterator<Item = PriceTier>) -> Self {
        let mut tiers: Vec<PriceTier> = tiers.into_iter().collect();
        tiers.sort_by_key(|t| t.unit_amount);
        Self {
            plan,
            tiers: tiers.into_iter().map(PriceTierListing::from).collect(),
        }
    }

    /// Whether tiers are non-decreasing by unit amount
    pub fn is_ordered(&self) -> bool {
        self.tiers
            .windows(2)
            .all(|w| w[0].tier.unit_amount <= w[1].tier.unit_amount)
    }
}
