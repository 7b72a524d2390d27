//! Gatehouse Auth - Session provider
//!
//! Supplies the signed-in identity, sign-out, and freshly refreshed token
//! claims. `FirebaseAuth` implements the provider over the Firebase
//! Authentication REST APIs and doubles as the bearer-token source for the
//! document store and remote functions.

pub mod config;
pub mod error;
pub mod firebase;
pub mod provider;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use firebase::FirebaseAuth;
pub use provider::SessionProvider;
pub use token::{IdTokenClaims, TokenSet};
