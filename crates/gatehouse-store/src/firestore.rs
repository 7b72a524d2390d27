//! Firestore REST backend
//!
//! Talks to the Firestore v1 REST API. The REST surface has no streaming
//! listen, so live listeners poll and deliver a snapshot only when the
//! result differs from the previous one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Number, Value};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, instrument, warn};

use crate::document::{check_collection_path, check_document_path, parent_of};
use crate::listener::LISTENER_BUFFER;
use crate::{
    Direction, Document, DocumentStore, Listener, Query, QuerySnapshot, StoreError, StoreResult,
    TokenSource,
};

const FIRESTORE_API_BASE: &str = "https://firestore.googleapis.com/v1";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Firestore REST document store
#[derive(Clone)]
pub struct FirestoreRestStore {
    client: Client,
    api_base: String,
    database_path: String,
    tokens: Option<Arc<dyn TokenSource>>,
    poll_interval: Duration,
}

impl std::fmt::Debug for FirestoreRestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreRestStore")
            .field("api_base", &self.api_base)
            .field("database_path", &self.database_path)
            .field("authenticated", &self.tokens.is_some())
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl FirestoreRestStore {
    /// Create a store for the default database of a project
    pub fn new(project_id: &str) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_base: FIRESTORE_API_BASE.to_string(),
            database_path: format!("projects/{project_id}/databases/(default)/documents"),
            tokens: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Point the store at another API base (emulator or test server)
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Authenticate requests with tokens from `tokens`
    #[must_use]
    pub fn with_token_source(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Set how often live listeners poll
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.api_base, resource)
    }

    fn resource_name(&self, path: &str) -> String {
        format!("{}/{}", self.database_path, path.trim_matches('/'))
    }

    /// Make an authenticated request; `Ok(None)` on 404
    async fn request(
        &self,
        method: Method,
        resource: &str,
        body: Option<&Value>,
    ) -> StoreResult<Option<Value>> {
        let mut request = self.client.request(method, self.url(resource));
        if let Some(tokens) = &self.tokens {
            if let Some(token) = tokens.bearer_token().await {
                request = request.bearer_auth(token);
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Firestore request failed");
            StoreError::from(e)
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GoogleErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            warn!(status = %status, message = %message, "Firestore API error");
            return Err(match status {
                StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
                    StoreError::PermissionDenied(message)
                }
                _ => StoreError::Status {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let value = response.json::<Value>().await.map_err(|e| {
            error!(error = %e, "Failed to parse Firestore response");
            StoreError::Decode(e.to_string())
        })?;
        Ok(Some(value))
    }

    fn decode_document(&self, raw: &Value) -> StoreResult<Document> {
        let name = raw
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Decode("document without name".to_string()))?;
        let path = relative_path(name).to_string();
        let fields = match raw.get("fields") {
            Some(Value::Object(fields)) => decode_fields(fields)?,
            _ => Map::new(),
        };
        Ok(Document::new(path, fields))
    }

    fn structured_query(query: &Query) -> Value {
        let collection_id = query
            .collection
            .rsplit('/')
            .next()
            .unwrap_or(&query.collection);

        let mut structured = json!({ "from": [{ "collectionId": collection_id }] });

        let filters: Vec<Value> = query
            .filters
            .iter()
            .map(|f| {
                json!({
                    "fieldFilter": {
                        "field": { "fieldPath": f.field },
                        "op": "EQUAL",
                        "value": encode_value(&f.value),
                    }
                })
            })
            .collect();
        match filters.len() {
            0 => {}
            1 => structured["where"] = filters.into_iter().next().unwrap_or_default(),
            _ => {
                structured["where"] = json!({
                    "compositeFilter": { "op": "AND", "filters": filters }
                });
            }
        }

        if let Some(order) = &query.order_by {
            let direction = match order.direction {
                Direction::Ascending => "ASCENDING",
                Direction::Descending => "DESCENDING",
            };
            structured["orderBy"] = json!([{
                "field": { "fieldPath": order.field },
                "direction": direction,
            }]);
        }

        json!({ "structuredQuery": structured })
    }

    /// Spawn a polling listener that sends whenever `fetch` returns something new
    fn spawn_poller<T, F, Fut>(&self, fetch: F) -> Listener<T>
    where
        T: PartialEq + Clone + Send + 'static,
        F: Fn() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = StoreResult<T>> + Send,
    {
        let (tx, rx) = mpsc::channel(LISTENER_BUFFER);
        let poll_interval = self.poll_interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last: Option<T> = None;

            loop {
                ticker.tick().await;
                match fetch().await {
                    Ok(current) => {
                        if last.as_ref() != Some(&current) {
                            last = Some(current.clone());
                            if tx.send(Ok(current)).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) if e.is_retryable() => {
                        warn!(error = %e, "transient listener error, polling again");
                    }
                    Err(e) => {
                        error!(error = %e, "listener stopped");
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                }
            }
        });

        Listener::new(rx, task)
    }
}

#[async_trait]
impl DocumentStore for FirestoreRestStore {
    #[instrument(skip(self, query), fields(collection = %query.collection))]
    async fn run_query(&self, query: &Query) -> StoreResult<Vec<Document>> {
        check_collection_path(&query.collection)?;

        let parent = match parent_of(&query.collection) {
            Some(parent_doc) => self.resource_name(parent_doc),
            None => self.database_path.clone(),
        };
        let body = Self::structured_query(query);

        let response = self
            .request(Method::POST, &format!("{parent}:runQuery"), Some(&body))
            .await?
            .ok_or_else(|| StoreError::NotFound(query.collection.clone()))?;

        let rows = response
            .as_array()
            .ok_or_else(|| StoreError::Decode("runQuery response is not an array".to_string()))?;

        let documents = rows
            .iter()
            .filter_map(|row| row.get("document"))
            .map(|raw| self.decode_document(raw))
            .collect::<StoreResult<Vec<_>>>()?;

        debug!(count = documents.len(), "query returned");
        Ok(documents)
    }

    #[instrument(skip(self))]
    async fn get_document(&self, path: &str) -> StoreResult<Option<Document>> {
        check_document_path(path)?;
        let resource = self.resource_name(path);
        match self.request(Method::GET, &resource, None).await? {
            Some(raw) => self.decode_document(&raw).map(Some),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, fields))]
    async fn add_document(
        &self,
        collection: &str,
        fields: Map<String, Value>,
    ) -> StoreResult<Document> {
        check_collection_path(collection)?;
        let body = json!({ "fields": encode_fields(&fields) });
        let resource = self.resource_name(collection);

        let raw = self
            .request(Method::POST, &resource, Some(&body))
            .await?
            .ok_or_else(|| StoreError::NotFound(collection.to_string()))?;

        let doc = self.decode_document(&raw)?;
        debug!(path = %doc.path, "document added");
        Ok(doc)
    }

    async fn listen_query(&self, query: Query) -> StoreResult<Listener<QuerySnapshot>> {
        check_collection_path(&query.collection)?;
        let store = self.clone();
        let query = Arc::new(query);
        Ok(self.spawn_poller(move || {
            let store = store.clone();
            let query = Arc::clone(&query);
            async move { store.run_query(&query).await.map(QuerySnapshot::new) }
        }))
    }

    async fn listen_document(&self, path: &str) -> StoreResult<Listener<Option<Document>>> {
        check_document_path(path)?;
        let store = self.clone();
        let path: Arc<str> = Arc::from(path);
        Ok(self.spawn_poller(move || {
            let store = store.clone();
            let path = Arc::clone(&path);
            async move { store.get_document(&path).await }
        }))
    }
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    message: String,
}

/// Strip the `projects/.../documents/` prefix from a resource name
fn relative_path(name: &str) -> &str {
    name.split_once("/documents/").map_or(name, |(_, path)| path)
}

/// Encode plain JSON as Firestore typed values
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect()
}

/// Decode Firestore typed values into plain JSON
///
/// References become relative document paths and timestamps stay RFC 3339
/// strings.
pub fn decode_value(value: &Value) -> StoreResult<Value> {
    let (kind, inner) = value
        .as_object()
        .and_then(|m| m.iter().next())
        .ok_or_else(|| StoreError::Decode(format!("untyped value: {value}")))?;

    let decoded = match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or_default()),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                other => other.as_i64(),
            };
            let i = parsed
                .ok_or_else(|| StoreError::Decode(format!("bad integerValue: {inner}")))?;
            Value::Number(Number::from(i))
        }
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map_or(Value::Null, Value::Number),
        "stringValue" | "timestampValue" | "bytesValue" => inner.clone(),
        "referenceValue" => {
            Value::String(relative_path(inner.as_str().unwrap_or_default()).to_string())
        }
        "geoPointValue" => inner.clone(),
        "arrayValue" => {
            let items = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect::<StoreResult<Vec<_>>>())
                .transpose()?
                .unwrap_or_default();
            Value::Array(items)
        }
        "mapValue" => match inner.get("fields") {
            Some(Value::Object(fields)) => Value::Object(decode_fields(fields)?),
            _ => Value::Object(Map::new()),
        },
        other => return Err(StoreError::Decode(format!("unknown value type {other}"))),
    };
    Ok(decoded)
}

fn decode_fields(fields: &Map<String, Value>) -> StoreResult<Map<String, Value>> {
    fields
        .iter()
        .map(|(k, v)| decode_value(v).map(|d| (k.clone(), d)))
        .collect()
}
