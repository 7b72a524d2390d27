//! Navigation seam

use async_trait::async_trait;

use crate::BillingError;

/// Sends the user to an external page
///
/// In a browser this replaces the current location. Implementations decide
/// what "leaving" means for their front end.
#[async_trait]
pub trait Navigator: Send + Sync {
    /// Navigate to `url`
    async fn assign(&self, url: &str) -> Result<(), BillingError>;
}
