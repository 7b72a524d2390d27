//! Gatehouse Store - Document database abstractions
//!
//! A narrow, schema-less document interface: equality-filtered and ordered
//! queries, single document reads and inserts, and live listeners.
//!
//! # Example
//!
//! ```rust,ignore
//! use gatehouse_store::{DocumentStore, FirestoreRestStore, Query};
//!
//! let store = FirestoreRestStore::new("my-project").with_token_source(auth);
//!
//! let plans = store
//!     .run_query(&Query::new("product").where_eq("active", true))
//!     .await?;
//!
//! let mut listener = store
//!     .listen_query(Query::new("customer/uid/subscriptions").where_eq("status", "active"))
//!     .await?;
//! while let Some(snapshot) = listener.next().await {
//!     println!("{} active", snapshot?.len());
//! }
//! ```

pub mod document;
pub mod error;
pub mod firestore;
pub mod listener;
pub mod memory;
pub mod query;
pub mod store;

pub use document::{to_fields, Document, QuerySnapshot};
pub use error::{StoreError, StoreResult};
pub use firestore::FirestoreRestStore;
pub use listener::Listener;
pub use memory::MemoryStore;
pub use query::{Direction, FieldFilter, OrderBy, Query};
pub use store::{DocumentStore, TokenSource};
