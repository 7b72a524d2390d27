//! Gatehouse Billing - Payment provider boundaries
//!
//! The hosted checkout redirect, the billing portal link function, and the
//! navigation seam both of them end in.
//!
//! # Example
//!
//! ```rust,ignore
//! use gatehouse_billing::{CallableFunctions, FunctionsConfig, PortalLinks};
//!
//! let functions = CallableFunctions::new(FunctionsConfig::new("my-project"))
//!     .with_token_source(auth.clone());
//!
//! let portal = functions.create_portal_link("https://app.example.com").await?;
//! navigator.assign(&portal.url).await?;
//! ```

pub mod config;
pub mod error;
pub mod functions;
pub mod navigator;
pub mod provider;
pub mod stripe;

pub use config::{FunctionsConfig, StripeConfig};
pub use error::BillingError;
pub use functions::CallableFunctions;
pub use navigator::Navigator;
pub use provider::{CheckoutRedirector, Navigation, PortalLinks, PortalSession};
pub use stripe::StripeCheckout;
