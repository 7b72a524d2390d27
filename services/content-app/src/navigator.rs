//! Terminal navigation

use async_trait::async_trait;
use gatehouse_billing::{BillingError, Navigator};
use tracing::info;

/// Navigator for a terminal: the user opens the link themselves
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNavigator;

#[async_trait]
impl Navigator for TerminalNavigator {
    async fn assign(&self, url: &str) -> Result<(), BillingError> {
        if url.is_empty() {
            return Err(BillingError::Navigation("empty url".to_string()));
        }
        info!(url = %url, "navigating");
        println!("Open this link to continue: {url}");
        Ok(())
    }
}
