//! Session provider abstraction

use async_trait::async_trait;
use gatehouse_types::Identity;
use tokio::sync::watch;

use crate::{AuthError, IdTokenClaims};

/// Session provider trait
///
/// No identity is the signed-out state, not an error.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The signed-in identity, if any
    fn current_identity(&self) -> Option<Identity>;

    /// Observe identity changes; the receiver starts at the current value
    fn watch_identity(&self) -> watch::Receiver<Option<Identity>>;

    /// Invalidate the local session
    async fn sign_out(&self);

    /// Force a token refresh and return the refreshed token's claims
    async fn refreshed_claims(&self) -> Result<IdTokenClaims, AuthError>;
}
