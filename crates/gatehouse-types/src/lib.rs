//! Gatehouse Types - Shared domain types
//!
//! This crate contains domain types used across Gatehouse crates:
//! - Signed-in identity
//! - Plans, price tiers and their display strings
//! - Subscriptions and checkout session requests
//! - Tier-scoped content blocks
//! - Firebase project configuration

pub mod catalog;
pub mod config;
pub mod content;
pub mod error;
pub mod identity;
pub mod money;
pub mod subscription;

pub use catalog::*;
pub use config::*;
pub use content::*;
pub use error::*;
pub use identity::*;
pub use money::format_currency;
pub use subscription::*;
