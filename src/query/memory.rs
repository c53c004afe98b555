//! # In-Memory Store
//!
//! A [`QueryCollaborator`] backed by a concurrent map of source name to rows.
//! Every `fetch_by_ids` call is appended to a fetch log, which is how the
//! binary reports store traffic and how tests assert one fetch per key.

use super::{QueryCollaborator, RelationTarget};
use crate::error::{HydrationError, HydrationResult};
use crate::record::id_text;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

/// One logged `fetch_by_ids` call
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRecord {
    pub target: RelationTarget,
    pub ids: Vec<Value>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    sources: DashMap<String, Vec<Value>>,
    fetch_log: Mutex<Vec<FetchRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fixture object of the form `{"users": [{...}, ...], ...}`
    pub fn from_fixture(fixture: &Value) -> HydrationResult<Self> {
        let sources = fixture.as_object().ok_or_else(|| {
            HydrationError::Serialization("store fixture must be a JSON object".to_string())
        })?;

        let store = Self::new();
        for (source, rows) in sources {
            let rows = rows.as_array().ok_or_else(|| {
                HydrationError::Serialization(format!(
                    "store fixture source '{source}' must be an array of rows"
                ))
            })?;
            store.insert_rows(source, rows.clone());
        }
        Ok(store)
    }

    /// Append rows to a source
    pub fn insert_rows(&self, source: &str, rows: Vec<Value>) {
        self.sources.entry(source.to_string()).or_default().extend(rows);
    }

    /// Builder-style variant of [`insert_rows`](Self::insert_rows)
    pub fn with_rows(self, source: &str, rows: Vec<Value>) -> Self {
        self.insert_rows(source, rows);
        self
    }

    pub fn fetch_log(&self) -> Vec<FetchRecord> {
        self.fetch_log.lock().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_log.lock().len()
    }

    pub fn clear_fetch_log(&self) {
        self.fetch_log.lock().clear();
    }
}

#[async_trait]
impl QueryCollaborator for InMemoryStore {
    async fn fetch_by_ids(
        &self,
        target: &RelationTarget,
        ids: &[Value],
    ) -> HydrationResult<Vec<Value>> {
        self.fetch_log.lock().push(FetchRecord {
            target: target.clone(),
            ids: ids.to_vec(),
        });

        let rows = self.sources.get(&target.source).ok_or_else(|| {
            HydrationError::query(target.to_string(), "unknown source")
        })?;

        let wanted: HashSet<String> = ids.iter().map(id_text).collect();
        let found: Vec<Value> = rows
            .iter()
            .filter(|row| {
                row.get(&target.primary_key)
                    .map(|id| wanted.contains(&id_text(id)))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        debug!(
            source = %target.source,
            requested = ids.len(),
            found = found.len(),
            "In-memory fetch by ids"
        );

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> InMemoryStore {
        InMemoryStore::from_fixture(&json!({
            "users": [
                {"id": 100, "name": "ada"},
                {"id": 101, "name": "grace"},
                {"id": 102, "name": "barbara"}
            ],
            "accounts": [
                {"account_uuid": "a-1", "plan": "pro"}
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_by_ids() {
        let store = store();
        let rows = store
            .fetch_by_ids(&RelationTarget::new("users"), &[json!(100), json!(102), json!(999)])
            .await
            .unwrap();

        let names: Vec<_> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["ada", "barbara"]);
        assert_eq!(store.fetch_count(), 1);
        assert_eq!(store.fetch_log()[0].ids, vec![json!(100), json!(102), json!(999)]);
    }

    #[tokio::test]
    async fn test_custom_primary_key() {
        let store = store();
        let target = RelationTarget::new("accounts").with_primary_key("account_uuid");
        let rows = store.fetch_by_ids(&target, &[json!("a-1")]).await.unwrap();
        assert_eq!(rows, vec![json!({"account_uuid": "a-1", "plan": "pro"})]);
    }

    #[tokio::test]
    async fn test_unknown_source_is_query_error() {
        let store = store();
        let err = store
            .fetch_by_ids(&RelationTarget::new("venues"), &[json!(1)])
            .await
            .unwrap_err();
        assert!(matches!(err, HydrationError::Query { .. }));
    }

    #[test]
    fn test_fixture_must_be_object_of_arrays() {
        assert!(InMemoryStore::from_fixture(&json!([1, 2])).is_err());
        assert!(InMemoryStore::from_fixture(&json!({"users": {"id": 1}})).is_err());
    }
}
