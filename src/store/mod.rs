//! Entity store abstraction
//!
//! Forum posts, comments and expert profiles live in an external entity
//! store. This module defines the generic CRUD contract the orchestrators
//! depend on; records travel as JSON objects so one trait serves every
//! entity kind, and [`decode`] / [`encode`] convert to and from the typed
//! models in [`crate::types`].
//!
//! # Example
//!
//! ```rust,ignore
//! use mindful::store::{EntityKind, EntityStore, Filter, InMemoryEntityStore, OrderSpec};
//!
//! let store = InMemoryEntityStore::new();
//! let posts = store
//!     .filter(
//!         EntityKind::ForumPost,
//!         &Filter::new().eq("category", "anxiety"),
//!         &OrderSpec::parse("-created_date"),
//!     )
//!     .await?;
//! ```

pub mod memory;

pub use memory::InMemoryEntityStore;

use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;

/// A stored record: a JSON object carrying at least `id` and `created_date`.
pub type Record = Map<String, Value>;

/// Entity kinds this application keeps in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    ForumPost,
    ForumComment,
    Expert,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::ForumPost => "ForumPost",
            EntityKind::ForumComment => "ForumComment",
            EntityKind::Expert => "Expert",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort order: a field name, descending when written with a leading `-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    pub field: String,
    pub descending: bool,
}

impl OrderSpec {
    pub fn parse(spec: &str) -> Self {
        match spec.strip_prefix('-') {
            Some(field) => Self::descending(field),
            None => Self::ascending(spec),
        }
    }

    pub fn ascending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: false,
        }
    }

    pub fn descending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: true,
        }
    }

    /// Compares two records by this order's field.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let ord = compare_values(a.get(&self.field), b.get(&self.field));
        if self.descending { ord.reverse() } else { ord }
    }
}

impl fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-{}", self.field)
        } else {
            f.write_str(&self.field)
        }
    }
}

/// Orders JSON values: missing < null < bool < number < string. Other kinds compare equal.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(_) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Conjunction of field equalities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push((field.to_string(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.conditions
            .iter()
            .all(|(field, value)| record.get(field) == Some(value))
    }

    /// The filter as a JSON object, the shape remote stores accept as a query.
    pub fn to_json(&self) -> Value {
        Value::Object(self.conditions.iter().cloned().collect())
    }
}

/// Generic CRUD over entity kinds.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// All records of `kind`, sorted by `order`.
    async fn list(&self, kind: EntityKind, order: &OrderSpec) -> Result<Vec<Record>>;

    /// Records of `kind` matching `filter`, sorted by `order`.
    async fn filter(
        &self,
        kind: EntityKind,
        filter: &Filter,
        order: &OrderSpec,
    ) -> Result<Vec<Record>>;

    /// A single record; `NotFound` when absent.
    async fn get(&self, kind: EntityKind, id: &str) -> Result<Record>;

    /// Create a record. The store assigns `id`, `created_date` and `version`.
    async fn create(&self, kind: EntityKind, fields: Record) -> Result<Record>;

    /// Merge `fields` into a record.
    ///
    /// With `expected_version`, the write only happens if the stored version
    /// still matches; otherwise `Conflict` is returned.
    async fn update(
        &self,
        kind: EntityKind,
        id: &str,
        fields: Record,
        expected_version: Option<u64>,
    ) -> Result<Record>;

    /// Atomically add `delta` to a numeric field. `field` may be a dotted
    /// path one level deep (`reactions.heart`).
    ///
    /// Stores without server-side increments return `Unsupported`.
    async fn increment_field(
        &self,
        kind: EntityKind,
        id: &str,
        field: &str,
        delta: u64,
    ) -> Result<Record> {
        let _ = (id, delta);
        Err(AppError::Unsupported(format!(
            "increment of {}.{} is not available on this store",
            kind, field
        )))
    }
}

/// Converts a stored record into a typed model.
pub fn decode<T: DeserializeOwned>(kind: EntityKind, record: Record) -> Result<T> {
    serde_json::from_value(Value::Object(record))
        .map_err(|e| AppError::Store(format!("Malformed {} record: {}", kind, e)))
}

pub fn decode_all<T: DeserializeOwned>(kind: EntityKind, records: Vec<Record>) -> Result<Vec<T>> {
    records.into_iter().map(|r| decode(kind, r)).collect()
}

/// Converts a value into the field map sent to the store.
pub fn encode<T: Serialize>(value: &T) -> Result<Record> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(AppError::Internal(format!(
            "Expected an object to store, got {}",
            other
        ))),
        Err(e) => Err(AppError::Internal(format!("Failed to encode record: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_order_spec_parse() {
        assert_eq!(
            OrderSpec::parse("-created_date"),
            OrderSpec::descending("created_date")
        );
        assert_eq!(OrderSpec::parse("rating"), OrderSpec::ascending("rating"));
        assert_eq!(OrderSpec::parse("-rating").to_string(), "-rating");
    }

    #[test]
    fn test_order_spec_compare() {
        let a = record(json!({"created_date": "2024-01-01T00:00:00.000000Z", "rating": 4.5}));
        let b = record(json!({"created_date": "2024-02-01T00:00:00.000000Z", "rating": 3}));

        assert_eq!(OrderSpec::parse("created_date").compare(&a, &b), Ordering::Less);
        assert_eq!(OrderSpec::parse("-created_date").compare(&a, &b), Ordering::Greater);
        assert_eq!(OrderSpec::parse("-rating").compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_missing_field_sorts_first() {
        let with = record(json!({"rating": 1}));
        let without = record(json!({}));
        assert_eq!(
            OrderSpec::parse("rating").compare(&without, &with),
            Ordering::Less
        );
    }

    #[test]
    fn test_filter_matches() {
        let post = record(json!({"category": "anxiety", "post_id": "p1"}));
        assert!(Filter::new().matches(&post));
        assert!(Filter::new().eq("category", "anxiety").matches(&post));
        assert!(!Filter::new().eq("category", "general").matches(&post));
        assert!(!Filter::new().eq("missing", "x").matches(&post));
        assert_eq!(
            Filter::new().eq("post_id", "p1").to_json(),
            json!({"post_id": "p1"})
        );
    }

    #[test]
    fn test_encode_rejects_non_objects() {
        assert!(encode(&"just a string").is_err());
        assert!(encode(&json!({"a": 1})).is_ok());
    }
}
