//! In-memory document store
//!
//! Keeps documents in a `DashMap` and broadcasts the path of every write so
//! live listeners can re-evaluate. Used by tests and local runs.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::document::{check_collection_path, check_document_path};
use crate::listener::LISTENER_BUFFER;
use crate::{Document, DocumentStore, Listener, Query, QuerySnapshot, StoreResult};

const CHANGE_BUFFER: usize = 256;

/// In-memory document store
#[derive(Clone)]
pub struct MemoryStore {
    docs: Arc<DashMap<String, Map<String, Value>>>,
    changes: broadcast::Sender<String>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("documents", &self.docs.len())
            .finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            docs: Arc::new(DashMap::new()),
            changes,
        }
    }

    /// Create or replace a document
    pub fn set_document(&self, path: &str, fields: Map<String, Value>) -> StoreResult<()> {
        check_document_path(path)?;
        self.docs.insert(path.to_string(), fields);
        self.notify(path);
        Ok(())
    }

    /// Merge fields into a document, creating it if missing
    pub fn merge_document(&self, path: &str, patch: Map<String, Value>) -> StoreResult<()> {
        check_document_path(path)?;
        self.docs.entry(path.to_string()).or_default().extend(patch);
        self.notify(path);
        Ok(())
    }

    /// Delete a document; returns whether it existed
    pub fn delete_document(&self, path: &str) -> bool {
        let existed = self.docs.remove(path).is_some();
        if existed {
            self.notify(path);
        }
        existed
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Documents of a collection, in document-ID order
    pub fn collection(&self, collection: &str) -> Vec<Document> {
        Query::new(collection).apply(self.snapshot_all())
    }

    fn notify(&self, path: &str) {
        trace!(path = %path, "document changed");
        // No receivers just means nobody is listening
        let _ = self.changes.send(path.to_string());
    }

    fn snapshot_all(&self) -> Vec<Document> {
        self.docs
            .iter()
            .map(|entry| Document::new(entry.key().clone(), entry.value().clone()))
            .collect()
    }

    fn evaluate(&self, query: &Query) -> Vec<Document> {
        query.apply(self.snapshot_all())
    }

    fn read(&self, path: &str) -> Option<Document> {
        self.docs
            .get(path)
            .map(|fields| Document::new(path, fields.value().clone()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn run_query(&self, query: &Query) -> StoreResult<Vec<Document>> {
        check_collection_path(&query.collection)?;
        Ok(self.evaluate(query))
    }

    async fn get_document(&self, path: &str) -> StoreResult<Option<Document>> {
        check_document_path(path)?;
        Ok(self.read(path))
    }

    async fn add_document(
        &self,
        collection: &str,
        fields: Map<String, Value>,
    ) -> StoreResult<Document> {
        check_collection_path(collection)?;
        let id = Uuid::new_v4().simple().to_string();
        let path = format!("{collection}/{id}");
        self.set_document(&path, fields.clone())?;
        debug!(path = %path, "document added");
        Ok(Document::new(path, fields))
    }

    async fn listen_query(&self, query: Query) -> StoreResult<Listener<QuerySnapshot>> {
        check_collection_path(&query.collection)?;

        // Subscribe before the first read so no write slips between them
        let mut changes = self.changes.subscribe();
        let (tx, rx) = mpsc::channel(LISTENER_BUFFER);
        let store = self.clone();

        let task = tokio::spawn(async move {
            let mut last = store.evaluate(&query);
            if tx.send(Ok(QuerySnapshot::new(last.clone()))).await.is_err() {
                return;
            }

            loop {
                match changes.recv().await {
                    Ok(path) if !affects(&query.collection, &path) => continue,
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => return,
                }

                let current = store.evaluate(&query);
                if current != last {
                    last = current.clone();
                    if tx.send(Ok(QuerySnapshot::new(current))).await.is_err() {
                        return;
                    }
                }
            }
        });

        Ok(Listener::new(rx, task))
    }

    async fn listen_document(&self, path: &str) -> StoreResult<Listener<Option<Document>>> {
        check_document_path(path)?;

        let mut changes = self.changes.subscribe();
        let (tx, rx) = mpsc::channel(LISTENER_BUFFER);
        let store = self.clone();
        let path = path.to_string();

        let task = tokio::spawn(async move {
            let mut last = store.read(&path);
            if tx.send(Ok(last.clone())).await.is_err() {
                return;
            }

            loop {
                match changes.recv().await {
                    Ok(changed) if changed != path => continue,
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => return,
                }

                let current = store.read(&path);
                if current != last {
                    last = current.clone();
                    if tx.send(Ok(current)).await.is_err() {
                        return;
                    }
                }
            }
        });

        Ok(Listener::new(rx, task))
    }
}

/// Whether a write to `path` can change the result of a query on `collection`
fn affects(collection: &str, path: &str) -> bool {
    path.rsplit_once('/')
        .is_some_and(|(parent, _)| parent == collection)
}
