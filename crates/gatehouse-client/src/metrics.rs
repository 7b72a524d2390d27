//! Client metrics for observability.
//!
//! Counters are recorded through the `metrics` facade and are no-ops until
//! the host application installs a recorder.
//!
//! # Metrics
//!
//! - `gatehouse_catalog_fetch_failures_total` - Plan or price reads that failed, by stage
//! - `gatehouse_checkout_navigations_total` - Redirects to hosted checkout
//! - `gatehouse_portal_failures_total` - Billing portal actions that failed

use metrics::counter;

/// Metric name for failed catalog reads.
pub const CATALOG_FETCH_FAILURES_TOTAL: &str = "gatehouse_catalog_fetch_failures_total";

/// Metric name for checkout redirects.
pub const CHECKOUT_NAVIGATIONS_TOTAL: &str = "gatehouse_checkout_navigations_total";

/// Metric name for failed billing portal actions.
pub const PORTAL_FAILURES_TOTAL: &str = "gatehouse_portal_failures_total";

/// Catalog read stage for metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogStage {
    Plans,
    Prices,
}

impl CatalogStage {
    /// Get the stage as a string for metrics labels.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plans => "plans",
            Self::Prices => "prices",
        }
    }
}

/// Record a failed catalog read.
pub fn record_catalog_failure(stage: CatalogStage) {
    counter!(CATALOG_FETCH_FAILURES_TOTAL, "stage" => stage.as_str()).increment(1);
}

/// Record a redirect to hosted checkout.
pub fn record_checkout_navigation() {
    counter!(CHECKOUT_NAVIGATIONS_TOTAL).increment(1);
}

/// Record a failed billing portal action.
///
/// `reason` is a short error code such as `function` or `navigation`.
pub fn record_portal_failure(reason: &'static str) {
    counter!(PORTAL_FAILURES_TOTAL, "reason" => reason).increment(1);
}

/// Describe all metrics for registration with a recorder.
pub fn describe_metrics() {
    use metrics::{describe_counter, Unit};

    describe_counter!(
        CATALOG_FETCH_FAILURES_TOTAL,
        Unit::Count,
        "Plan and price reads that failed and were degraded to empty"
    );

    describe_counter!(
        CHECKOUT_NAVIGATIONS_TOTAL,
        Unit::Count,
        "Navigations to hosted checkout"
    );

    describe_counter!(
        PORTAL_FAILURES_TOTAL,
        Unit::Count,
        "Billing portal actions that ended in an error"
    );
}
