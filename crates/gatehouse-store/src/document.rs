//! Documents, paths and snapshots

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{StoreError, StoreResult};

/// A stored document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Slash-separated path relative to the database root, e.g. `product/prod_1`
    pub path: String,
    /// Document fields
    pub fields: Map<String, Value>,
}

impl Document {
    /// Create a document
    pub fn new(path: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            path: path.into(),
            fields,
        }
    }

    /// Document ID (last path segment)
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Path of the collection containing this document
    pub fn collection(&self) -> &str {
        parent_of(&self.path).unwrap_or_default()
    }

    /// Get a single field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Decode the document into a typed value
    ///
    /// The document ID is made available as the `id` field unless the
    /// document already stores one.
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        let mut fields = self.fields.clone();
        fields
            .entry("id")
            .or_insert_with(|| Value::String(self.id().to_string()));
        serde_json::from_value(Value::Object(fields))
            .map_err(|e| StoreError::Decode(format!("{}: {e}", self.path)))
    }
}

/// Result of a query at one point in time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySnapshot {
    /// Matching documents in query order
    pub documents: Vec<Document>,
}

impl QuerySnapshot {
    /// Create a snapshot
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Whether no document matched
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of matching documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// First document in query order
    pub fn first(&self) -> Option<&Document> {
        self.documents.first()
    }
}

/// Encode a serializable value as document fields
pub fn to_fields<T: Serialize>(value: &T) -> StoreResult<Map<String, Value>> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Encode(format!(
            "expected an object, got {other}"
        ))),
        Err(e) => Err(StoreError::Encode(e.to_string())),
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Whether `path` names a collection (odd number of segments)
pub fn is_collection_path(path: &str) -> bool {
    let count = segments(path).count();
    count % 2 == 1 && !path.contains("//")
}

/// Whether `path` names a document (even, non-zero number of segments)
pub fn is_document_path(path: &str) -> bool {
    let count = segments(path).count();
    count > 0 && count % 2 == 0 && !path.contains("//")
}

/// Parent path: the collection of a document, or the document of a subcollection
pub fn parent_of(path: &str) -> Option<&str> {
    path.trim_end_matches('/').rsplit_once('/').map(|(parent, _)| parent)
}

/// Validate a collection path
pub fn check_collection_path(path: &str) -> StoreResult<()> {
    if is_collection_path(path) {
        Ok(())
    } else {
        Err(StoreError::InvalidPath(path.to_string()))
    }
}

/// Validate a document path
pub fn check_document_path(path: &str) -> StoreResult<()> {
    if is_document_path(path) {
        Ok(())
    } else {
        Err(StoreError::InvalidPath(path.to_string()))
    }
}
