//! Query model
//!
//! Queries support what the catalog and subscription reads need: equality
//! filters combined with AND, and ordering on a single field. Without an
//! explicit ordering, results are ordered by document ID.

use std::cmp::Ordering;

use serde_json::Value;

use crate::Document;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Smallest first
    #[default]
    Ascending,
    /// Largest first
    Descending,
}

/// Equality filter on a field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    /// Field name
    pub field: String,
    /// Value the field must equal
    pub value: Value,
}

/// Ordering on a field
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// Field name
    pub field: String,
    /// Sort direction
    pub direction: Direction,
}

/// A collection query
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Collection path, e.g. `product/prod_1/prices`
    pub collection: String,
    /// Equality filters, all of which must hold
    pub filters: Vec<FieldFilter>,
    /// Optional ordering
    pub order_by: Option<OrderBy>,
}

impl Query {
    /// Query every document of a collection
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: None,
        }
    }

    /// Add an equality filter
    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Order ascending by a field
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction: Direction::Ascending,
        });
        self
    }

    /// Order descending by a field
    #[must_use]
    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction: Direction::Descending,
        });
        self
    }

    /// Whether a document satisfies the filters and has the ordered field
    ///
    /// Documents missing the order-by field are excluded, as in Firestore.
    pub fn matches(&self, doc: &Document) -> bool {
        if doc.collection() != self.collection {
            return false;
        }
        let filters_hold = self
            .filters
            .iter()
            .all(|f| doc.get(&f.field).is_some_and(|v| values_equal(v, &f.value)));
        let has_order_field = self
            .order_by
            .as_ref()
            .map_or(true, |o| doc.get(&o.field).is_some());
        filters_hold && has_order_field
    }

    /// Filter and order a set of candidate documents
    pub fn apply(&self, docs: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut matched: Vec<Document> = docs.into_iter().filter(|d| self.matches(d)).collect();
        matched.sort_by(|a, b| a.id().cmp(b.id()));
        if let Some(order) = &self.order_by {
            // Stable sort keeps document-ID order for ties
            matched.sort_by(|a, b| {
                let ord = compare_values(
                    a.get(&order.field).unwrap_or(&Value::Null),
                    b.get(&order.field).unwrap_or(&Value::Null),
                );
                match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }
        matched
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: type first, then value
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
