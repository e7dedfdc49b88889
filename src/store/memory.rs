use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use tokio::sync::RwLock;

use super::{lookup, CollectionPath, Document, DocumentStore, Query, StoreError};

#[derive(Debug, Clone)]
struct Entry {
    version: i64,
    seq: u64,
    data: Value,
}

impl Entry {
    fn to_document(&self, id: &str) -> Document {
        Document {
            id: id.to_string(),
            version: self.version,
            data: self.data.clone(),
        }
    }
}

/// Process-local store for development and tests. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, HashMap<String, Entry>>>,
    seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Ordering used by `order_by`: missing/null first, then numbers, then strings.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &CollectionPath, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection.as_str())
            .and_then(|docs| docs.get(id))
            .map(|entry| entry.to_document(id)))
    }

    async fn create(
        &self,
        collection: &CollectionPath,
        id: &str,
        mut data: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        data.insert("id".to_string(), Value::String(id.to_string()));

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.as_str().to_string()).or_default();
        if docs.contains_key(id) {
            return Err(StoreError::AlreadyExists(collection.document(id)));
        }

        let entry = Entry {
            version: 1,
            seq: self.seq.fetch_add(1, AtomicOrdering::SeqCst),
            data: Value::Object(data),
        };
        let document = entry.to_document(id);
        docs.insert(id.to_string(), entry);
        Ok(document)
    }

    async fn update(
        &self,
        collection: &CollectionPath,
        id: &str,
        fields: Map<String, Value>,
        expected_version: Option<i64>,
    ) -> Result<Document, StoreError> {
        let mut collections = self.collections.write().await;
        let entry = collections
            .get_mut(collection.as_str())
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound(collection.document(id)))?;

        if let Some(expected) = expected_version {
            if entry.version != expected {
                return Err(StoreError::Conflict {
                    path: collection.document(id),
                    expected,
                    actual: entry.version,
                });
            }
        }

        let object = entry
            .data
            .as_object_mut()
            .ok_or_else(|| StoreError::NotAnObject(collection.document(id)))?;
        for (key, value) in fields {
            // The document key is immutable.
            if key != "id" {
                object.insert(key, value);
            }
        }
        entry.version += 1;
        Ok(entry.to_document(id))
    }

    async fn query(&self, collection: &CollectionPath, query: &Query) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection.as_str()) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<(&String, &Entry)> = docs
            .iter()
            .filter(|(_, entry)| query.filters.iter().all(|f| f.matches(&entry.data)))
            .collect();

        matched.sort_by_key(|(_, entry)| entry.seq);
        if let Some(field) = &query.order_by {
            // Stable sort keeps insertion order among equal keys.
            matched.sort_by(|(_, a), (_, b)| compare_values(lookup(&a.data, field), lookup(&b.data, field)));
        }

        Ok(matched
            .into_iter()
            .map(|(id, entry)| entry.to_document(id))
            .collect())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
