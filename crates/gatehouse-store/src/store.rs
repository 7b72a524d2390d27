//! Store traits
//!
//! Define the async document interface the client is written against.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{Document, Listener, Query, QuerySnapshot, StoreResult};

/// Document store trait
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run a query once
    async fn run_query(&self, query: &Query) -> StoreResult<Vec<Document>>;

    /// Read a document by path; `None` if it does not exist
    async fn get_document(&self, path: &str) -> StoreResult<Option<Document>>;

    /// Add a document with a generated ID to a collection
    async fn add_document(
        &self,
        collection: &str,
        fields: Map<String, Value>,
    ) -> StoreResult<Document>;

    /// Listen to a query
    ///
    /// The first snapshot reflects the current state; later snapshots are
    /// delivered only when the result changes.
    async fn listen_query(&self, query: Query) -> StoreResult<Listener<QuerySnapshot>>;

    /// Listen to a single document
    ///
    /// Yields `None` while the document does not exist.
    async fn listen_document(&self, path: &str) -> StoreResult<Listener<Option<Document>>>;
}

/// Source of bearer tokens for authenticated requests
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Current ID token, or `None` when signed out
    async fn bearer_token(&self) -> Option<String>;
}
