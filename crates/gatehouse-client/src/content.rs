//! Tier-scoped content
//!
//! Each tier reads its own flat collection. What a user may read is decided
//! by the database's security rules, so a tier the user is not entitled to
//! simply comes back empty (or denied, which is logged and treated the same).

use std::sync::Arc;

use futures::stream::{BoxStream, FuturesUnordered, StreamExt};
use gatehouse_store::{DocumentStore, Query};
use gatehouse_types::{ContentBlock, ContentTier};
use tracing::{debug, instrument, warn};

/// Reads content blocks per tier
#[derive(Clone)]
pub struct ContentGateway {
    store: Arc<dyn DocumentStore>,
    tiers: Vec<ContentTier>,
}

impl ContentGateway {
    /// Create a gateway over the given tiers
    pub fn new(store: Arc<dyn DocumentStore>, tiers: Vec<ContentTier>) -> Self {
        Self { store, tiers }
    }

    /// Configured tiers
    pub fn tiers(&self) -> &[ContentTier] {
        &self.tiers
    }

    /// Content of one tier; failures yield an empty list
    #[instrument(skip(self), fields(tier = %tier))]
    pub async fn fetch_tier_content(&self, tier: &ContentTier) -> Vec<ContentBlock> {
        fetch_tier(self.store.as_ref(), tier).await
    }

    /// Content of every configured tier, in configured order
    pub async fn fetch_all(&self) -> Vec<(ContentTier, Vec<ContentBlock>)> {
        let results = futures::future::join_all(
            self.tiers
                .iter()
                .map(|tier| fetch_tier(self.store.as_ref(), tier)),
        )
        .await;
        self.tiers.iter().cloned().zip(results).collect()
    }

    /// Content of every configured tier, each yielded as it arrives
    pub fn stream_all(&self) -> BoxStream<'static, (ContentTier, Vec<ContentBlock>)> {
        self.tiers
            .iter()
            .cloned()
            .map(|tier| {
                let store = self.store.clone();
                async move {
                    let blocks = fetch_tier(store.as_ref(), &tier).await;
                    (tier, blocks)
                }
            })
            .collect::<FuturesUnordered<_>>()
            .boxed()
    }
}

impl std::fmt::Debug for ContentGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentGateway")
            .field("tiers", &self.tiers)
            .finish_non_exhaustive()
    }
}

async fn fetch_tier(store: &dyn DocumentStore, tier: &ContentTier) -> Vec<ContentBlock> {
    match store.run_query(&Query::new(tier.collection())).await {
        Ok(docs) => {
            debug!(tier = %tier, count = docs.len(), "content loaded");
            docs.into_iter()
                .map(|doc| ContentBlock {
                    id: doc.id().to_string(),
                    fields: doc.fields,
                })
                .collect()
        }
        Err(e) => {
            warn!(tier = %tier, error = %e, "failed to load content");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_store::MemoryStore;
    use serde_json::{json, Map, Value};

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[tokio::test]
    async fn test_fetch_all_keeps_tier_order() {
        let store = MemoryStore::new();
        store
            .set_document("content-basic/a", fields(json!({"title": "Welcome"})))
            .unwrap();
        store
            .set_document("content-premium/b", fields(json!({"content": "Deep dive"})))
            .unwrap();

        let gateway = ContentGateway::new(Arc::new(store), ContentTier::defaults());
        let all = gateway.fetch_all().await;

        assert_eq!(all.len(), 2);
        assert_eq!(all[0].0, ContentTier::basic());
        assert_eq!(all[0].1[0].summary(), "Welcome");
        assert_eq!(all[1].1[0].id, "b");
    }

    #[tokio::test]
    async fn test_empty_tier() {
        let gateway = ContentGateway::new(Arc::new(MemoryStore::new()), ContentTier::defaults());
        assert!(gateway.fetch_tier_content(&ContentTier::premium()).await.is_empty());
    }
}
