//! Document store with injectable failures

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gatehouse_store::{
    Document, DocumentStore, Listener, MemoryStore, Query, QuerySnapshot, StoreError, StoreResult,
};
use serde_json::{Map, Value};
use tokio::sync::mpsc;

/// Wraps a `MemoryStore`, failing reads of selected collections
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    failing: Arc<Mutex<Vec<String>>>,
    denied_listeners: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            failing: Arc::default(),
            denied_listeners: Arc::default(),
        }
    }

    /// Fail queries on `collection` and gets of documents inside it
    pub fn fail_collection(&self, collection: &str) {
        self.failing.lock().unwrap().push(collection.to_string());
    }

    /// Query listeners report a permission error once, then stay silent
    pub fn deny_listeners(&self) {
        self.denied_listeners.store(true, Ordering::SeqCst);
    }

    fn check(&self, path: &str) -> StoreResult<()> {
        let failing = self.failing.lock().unwrap();
        if failing
            .iter()
            .any(|c| path == c || path.starts_with(&format!("{c}/")))
        {
            return Err(StoreError::Status {
                status: 500,
                message: format!("injected failure for {path}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn run_query(&self, query: &Query) -> StoreResult<Vec<Document>> {
        self.check(&query.collection)?;
        self.inner.run_query(query).await
    }

    async fn get_document(&self, path: &str) -> StoreResult<Option<Document>> {
        self.check(path)?;
        self.inner.get_document(path).await
    }

    async fn add_document(
        &self,
        collection: &str,
        fields: Map<String, Value>,
    ) -> StoreResult<Document> {
        self.inner.add_document(collection, fields).await
    }

    async fn listen_query(&self, query: Query) -> StoreResult<Listener<QuerySnapshot>> {
        if !self.denied_listeners.load(Ordering::SeqCst) {
            return self.inner.listen_query(query).await;
        }

        let (tx, rx) = mpsc::channel(1);
        let task = tokio::spawn(async move {
            let _ = tx
                .send(Err(StoreError::PermissionDenied(query.collection)))
                .await;
            std::future::pending::<()>().await;
        });
        Ok(Listener::new(rx, task))
    }

    async fn listen_document(&self, path: &str) -> StoreResult<Listener<Option<Document>>> {
        self.inner.listen_document(path).await
    }
}
