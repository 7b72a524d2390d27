//! Catalog of active plans and their price tiers
//!
//! Plans are read first, then every plan's prices are fetched at once and
//! each listing is yielded as soon as its prices arrive. A failed price
//! fetch degrades that one plan to an empty tier list.

use std::sync::Arc;

use futures::future::join_all;
use futures::stream::{self, BoxStream, FuturesUnordered, StreamExt};
use gatehouse_store::{Document, DocumentStore, Query};
use gatehouse_types::{Plan, PlanListing, PriceTier};
use tracing::{debug, instrument, warn};

use crate::metrics::{record_catalog_failure, CatalogStage};

/// Reads the plan catalog
#[derive(Clone)]
pub struct CatalogReader {
    store: Arc<dyn DocumentStore>,
}

impl CatalogReader {
    /// Create a new catalog reader
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// All active plans with ordered tiers, in plan query order
    ///
    /// Never fails: a failed plan query yields an empty catalog.
    #[instrument(skip(self))]
    pub async fn list_active_plans(&self) -> Vec<PlanListing> {
        let plans = load_plans(self.store.as_ref()).await;
        join_all(
            plans
                .into_iter()
                .map(|plan| load_listing(self.store.clone(), plan)),
        )
        .await
    }

    /// Active plans, each yielded as soon as its prices resolve
    pub fn stream_active_plans(&self) -> BoxStream<'static, PlanListing> {
        let store = self.store.clone();
        stream::once(async move {
            let plans = load_plans(store.as_ref()).await;
            plans
                .into_iter()
                .map(|plan| load_listing(store.clone(), plan))
                .collect::<FuturesUnordered<_>>()
        })
        .flatten()
        .boxed()
    }
}

impl std::fmt::Debug for CatalogReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogReader").finish_non_exhaustive()
    }
}

async fn load_plans(store: &dyn DocumentStore) -> Vec<Plan> {
    let query = Query::new(Plan::COLLECTION).where_eq("active", true);
    match store.run_query(&query).await {
        Ok(docs) => decode_all(&docs),
        Err(e) => {
            warn!(error = %e, "failed to load plans");
            record_catalog_failure(CatalogStage::Plans);
            Vec::new()
        }
    }
}

async fn load_listing(store: Arc<dyn DocumentStore>, plan: Plan) -> PlanListing {
    let query = Query::new(plan.prices_path()).order_by("unit_amount");
    let tiers: Vec<PriceTier> = match store.run_query(&query).await {
        Ok(docs) => decode_all(&docs),
        Err(e) => {
            warn!(plan_id = %plan.id, error = %e, "failed to load prices");
            record_catalog_failure(CatalogStage::Prices);
            Vec::new()
        }
    };

    debug!(plan_id = %plan.id, tiers = tiers.len(), "plan listing loaded");
    PlanListing::new(plan, tiers)
}

/// Decode every document, skipping the ones that do not fit
fn decode_all<T: serde::de::DeserializeOwned>(docs: &[Document]) -> Vec<T> {
    docs.iter()
        .filter_map(|doc| match doc.decode() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %doc.path, error = %e, "skipping undecodable document");
                None
            }
        })
        .collect()
}
