//! Gatehouse Client - Subscription-gated content workflow
//!
//! Composes the session provider, the document store and the payment
//! boundaries into the workflow of a subscription-gated page:
//!
//! - [`CatalogReader`] lists active plans with their ordered price tiers
//! - [`SubscriptionWatcher`] observes the active subscription and derives
//!   the billing summary and access claim
//! - [`ContentGateway`] reads tier-scoped content
//! - [`CheckoutInitiator`] and [`BillingPortalRedirector`] run the two user
//!   actions that leave the page
//! - [`Dashboard`] owns the lifecycle and publishes a [`ViewState`]
//!
//! # Example
//!
//! ```rust,ignore
//! use gatehouse_client::{ClientConfig, Dashboard, Services};
//!
//! let services = Services::new(
//!     ClientConfig::new("https://app.example.com"),
//!     store,
//!     session,
//!     redirector,
//!     portal_links,
//!     navigator,
//! );
//! let dashboard = Dashboard::spawn(services);
//!
//! let mut view = dashboard.watch();
//! while view.changed().await.is_ok() {
//!     println!("{}", gatehouse_client::render(&view.borrow()));
//! }
//! ```

pub mod action;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod content;
pub mod dashboard;
pub mod error;
pub mod metrics;
pub mod portal;
pub mod subscription;
pub mod view;

pub use action::{ActionKind, ActionState};
pub use catalog::CatalogReader;
pub use checkout::CheckoutInitiator;
pub use config::ClientConfig;
pub use content::ContentGateway;
pub use dashboard::{Dashboard, Services, ViewState};
pub use error::ClientError;
pub use portal::BillingPortalRedirector;
pub use subscription::{SubscriptionSnapshot, SubscriptionWatch, SubscriptionWatcher};
pub use view::render;
