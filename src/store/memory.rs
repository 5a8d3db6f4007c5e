//! In-process entity store.
//!
//! Used for local development and tests. Writes are serialized under one
//! lock, so `increment_field` is genuinely atomic here; the store can also be
//! built without increments to exercise the optimistic-concurrency path.

use super::{EntityKind, EntityStore, Filter, OrderSpec, Record};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    records: HashMap<EntityKind, Vec<Record>>,
    last_created: Option<DateTime<Utc>>,
}

impl Tables {
    /// Creation timestamps are strictly increasing so ordering by
    /// `created_date` always reflects insertion order.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_created {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created = Some(ts);
        ts
    }

    fn find_mut(&mut self, kind: EntityKind, id: &str) -> Result<&mut Record> {
        self.records
            .get_mut(&kind)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
            })
            .ok_or_else(|| AppError::NotFound(format!("{} {}", kind, id)))
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn version_of(record: &Record) -> u64 {
    record.get("version").and_then(Value::as_u64).unwrap_or(0)
}

fn touch(record: &mut Record) {
    let version = version_of(record) + 1;
    record.insert("version".to_string(), Value::from(version));
    record.insert(
        "updated_date".to_string(),
        Value::String(format_timestamp(Utc::now())),
    );
}

pub struct InMemoryEntityStore {
    tables: RwLock<Tables>,
    atomic_increment: bool,
}

impl Default for InMemoryEntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            atomic_increment: true,
        }
    }

    /// A store that answers `increment_field` with `Unsupported`.
    pub fn without_atomic_increment() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            atomic_increment: false,
        }
    }

    /// Inserts a record as-is, keeping any `id`/`created_date` it already has.
    pub fn seed(&self, kind: EntityKind, mut record: Record) -> Record {
        let mut tables = self.tables.write();
        if !record.contains_key("id") {
            record.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        if !record.contains_key("created_date") {
            let ts = tables.next_timestamp();
            record.insert("created_date".to_string(), Value::String(format_timestamp(ts)));
        }
        record.entry("version").or_insert(Value::from(1u64));
        tables.records.entry(kind).or_default().push(record.clone());
        record
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        self.tables.read().records.get(&kind).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, kind: EntityKind) -> bool {
        self.len(kind) == 0
    }

    fn select(&self, kind: EntityKind, filter: &Filter, order: &OrderSpec) -> Vec<Record> {
        let tables = self.tables.read();
        let mut rows: Vec<Record> = tables
            .records
            .get(&kind)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| order.compare(a, b));
        rows
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn list(&self, kind: EntityKind, order: &OrderSpec) -> Result<Vec<Record>> {
        Ok(self.select(kind, &Filter::new(), order))
    }

    async fn filter(
        &self,
        kind: EntityKind,
        filter: &Filter,
        order: &OrderSpec,
    ) -> Result<Vec<Record>> {
        Ok(self.select(kind, filter, order))
    }

    async fn get(&self, kind: EntityKind, id: &str) -> Result<Record> {
        let mut tables = self.tables.write();
        tables.find_mut(kind, id).map(|r| r.clone())
    }

    async fn create(&self, kind: EntityKind, mut fields: Record) -> Result<Record> {
        let mut tables = self.tables.write();
        let ts = format_timestamp(tables.next_timestamp());

        fields.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        fields.insert("created_date".to_string(), Value::String(ts.clone()));
        fields.insert("updated_date".to_string(), Value::String(ts));
        fields.insert("version".to_string(), Value::from(1u64));

        debug!(kind = %kind, id = ?fields.get("id"), "Created record");
        tables.records.entry(kind).or_default().push(fields.clone());
        Ok(fields)
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: &str,
        fields: Record,
        expected_version: Option<u64>,
    ) -> Result<Record> {
        let mut tables = self.tables.write();
        let record = tables.find_mut(kind, id)?;

        if let Some(expected) = expected_version {
            let current = version_of(record);
            if current != expected {
                return Err(AppError::Conflict(format!(
                    "{} {} is at version {}, expected {}",
                    kind, id, current, expected
                )));
            }
        }

        for (key, value) in fields {
            if matches!(key.as_str(), "id" | "created_date" | "version") {
                continue;
            }
            record.insert(key, value);
        }
        touch(record);
        Ok(record.clone())
    }

    async fn increment_field(
        &self,
        kind: EntityKind,
        id: &str,
        field: &str,
        delta: u64,
    ) -> Result<Record> {
        if !self.atomic_increment {
            return Err(AppError::Unsupported(format!(
                "increment of {}.{} is not available on this store",
                kind, field
            )));
        }

        let mut tables = self.tables.write();
        let record = tables.find_mut(kind, id)?;

        let slot = match field.split_once('.') {
            Some((parent, child)) => {
                let parent = record
                    .entry(parent.to_string())
                    .or_insert_with(|| Value::Object(Record::new()));
                if parent.is_null() {
                    *parent = Value::Object(Record::new());
                }
                parent
                    .as_object_mut()
                    .ok_or_else(|| {
                        AppError::InvalidInput(format!("{}.{} is not an object", kind, field))
                    })?
                    .entry(child.to_string())
                    .or_insert(Value::from(0u64))
            }
            None => record.entry(field.to_string()).or_insert(Value::from(0u64)),
        };

        let current = if slot.is_null() {
            0
        } else {
            slot.as_u64().ok_or_else(|| {
                AppError::InvalidInput(format!("{}.{} is not a counter", kind, field))
            })?
        };
        *slot = Value::from(current.saturating_add(delta));

        touch(record);
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_identity() {
        let store = InMemoryEntityStore::new();
        let created = store
            .create(EntityKind::ForumPost, fields(json!({"title": "t"})))
            .await
            .unwrap();

        assert!(created.get("id").and_then(Value::as_str).is_some());
        assert!(created.get("created_date").is_some());
        assert_eq!(created.get("version"), Some(&json!(1)));
        assert_eq!(store.len(EntityKind::ForumPost), 1);
        assert!(store.is_empty(EntityKind::ForumComment));
    }

    #[tokio::test]
    async fn test_created_dates_strictly_increase() {
        let store = InMemoryEntityStore::new();
        for i in 0..20 {
            store
                .create(EntityKind::ForumComment, fields(json!({"n": i})))
                .await
                .unwrap();
        }

        let rows = store
            .list(EntityKind::ForumComment, &OrderSpec::parse("created_date"))
            .await
            .unwrap();
        let order: Vec<i64> = rows.iter().map(|r| r["n"].as_i64().unwrap()).collect();
        assert_eq!(order, (0..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_update_checks_version() {
        let store = InMemoryEntityStore::new();
        let created = store
            .create(EntityKind::ForumPost, fields(json!({"title": "t"})))
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let updated = store
            .update(EntityKind::ForumPost, &id, fields(json!({"title": "u"})), Some(1))
            .await
            .unwrap();
        assert_eq!(updated["title"], json!("u"));
        assert_eq!(updated["version"], json!(2));

        let stale = store
            .update(EntityKind::ForumPost, &id, fields(json!({"title": "v"})), Some(1))
            .await;
        assert!(matches!(stale, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_ignores_identity_fields() {
        let store = InMemoryEntityStore::new();
        let created = store
            .create(EntityKind::ForumPost, fields(json!({"title": "t"})))
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let updated = store
            .update(
                EntityKind::ForumPost,
                &id,
                fields(json!({"id": "other", "version": 99})),
                None,
            )
            .await
            .unwrap();
        assert_eq!(updated["id"], json!(id));
        assert_eq!(updated["version"], json!(2));
    }

    #[tokio::test]
    async fn test_increment_nested_field() {
        let store = InMemoryEntityStore::new();
        let created = store
            .create(
                EntityKind::ForumPost,
                fields(json!({"reactions": {"heart": 2, "hug": 1}})),
            )
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let updated = store
            .increment_field(EntityKind::ForumPost, &id, "reactions.heart", 1)
            .await
            .unwrap();
        assert_eq!(updated["reactions"], json!({"heart": 3, "hug": 1}));

        let updated = store
            .increment_field(EntityKind::ForumPost, &id, "reactions.same", 1)
            .await
            .unwrap();
        assert_eq!(updated["reactions"]["same"], json!(1));
    }

    #[tokio::test]
    async fn test_increment_treats_null_as_zero() {
        let store = InMemoryEntityStore::new();
        let created = store
            .create(
                EntityKind::ForumComment,
                fields(json!({"reactions": {"heart": null}})),
            )
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let updated = store
            .increment_field(EntityKind::ForumComment, &id, "reactions.heart", 1)
            .await
            .unwrap();
        assert_eq!(updated["reactions"]["heart"], json!(1));

        let bare = store
            .create(EntityKind::ForumPost, fields(json!({"reactions": null})))
            .await
            .unwrap();
        let bare_id = bare["id"].as_str().unwrap().to_string();
        let updated = store
            .increment_field(EntityKind::ForumPost, &bare_id, "reactions.hug", 1)
            .await
            .unwrap();
        assert_eq!(updated["reactions"], json!({"hug": 1}));
    }

    #[tokio::test]
    async fn test_increment_rejects_non_counter() {
        let store = InMemoryEntityStore::new();
        let created = store
            .create(EntityKind::ForumPost, fields(json!({"reactions": {"heart": "lots"}})))
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let result = store
            .increment_field(EntityKind::ForumPost, &id, "reactions.heart", 1)
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_increment_unsupported_when_disabled() {
        let store = InMemoryEntityStore::without_atomic_increment();
        let created = store
            .create(EntityKind::ForumPost, fields(json!({})))
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let result = store
            .increment_field(EntityKind::ForumPost, &id, "reactions.heart", 1)
            .await;
        assert!(matches!(result, Err(AppError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = InMemoryEntityStore::new();
        let result = store.get(EntityKind::Expert, "nope").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_seed_keeps_given_identity() {
        let store = InMemoryEntityStore::new();
        store.seed(
            EntityKind::Expert,
            fields(json!({"id": "e1", "name": "Dr. Lee"})),
        );
        let fetched = store.get(EntityKind::Expert, "e1").await.unwrap();
        assert_eq!(fetched["name"], json!("Dr. Lee"));
        assert_eq!(fetched["version"], json!(1));
    }
}
