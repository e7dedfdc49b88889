//! Document store abstraction.
//!
//! Documents are JSON objects addressed by a collection path and a document
//! id, mirroring the `trips/{tripId}/events/{eventId}/tasks` hierarchy.
//! Backends give per-document atomicity only; callers that read, modify and
//! write a document pass the version they read to `update` and retry on
//! `StoreError::Conflict`.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document already exists: {0}")]
    AlreadyExists(String),

    #[error("Version conflict on {path}: expected {expected}, found {actual}")]
    Conflict {
        path: String,
        expected: i64,
        actual: i64,
    },

    #[error("Document is not a JSON object: {0}")]
    NotAnObject(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Slash-separated path of a collection, e.g. `trips/abc/events`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn trips() -> Self {
        Self("trips".to_string())
    }

    pub fn events(trip_id: &str) -> Self {
        Self(format!("trips/{}/events", trip_id))
    }

    pub fn tasks(trip_id: &str, event_id: &str) -> Self {
        Self(format!("trips/{}/events/{}/tasks", trip_id, event_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn document(&self, id: &str) -> String {
        format!("{}/{}", self.0, id)
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored document with its optimistic-concurrency version.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub version: i64,
    pub data: Value,
}

impl Document {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// Query predicate over a dotted field path (`owner.userId`).
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { field: String, value: Value },
    ArrayContains { field: String, value: Value },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn array_contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::ArrayContains {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Filter::Eq { field, .. } | Filter::ArrayContains { field, .. } => field,
        }
    }

    pub fn matches(&self, data: &Value) -> bool {
        match self {
            Filter::Eq { field, value } => lookup(data, field) == Some(value),
            Filter::ArrayContains { field, value } => lookup(data, field)
                .and_then(Value::as_array)
                .map(|items| items.contains(value))
                .unwrap_or(false),
        }
    }
}

/// Conjunction of filters with an optional ascending sort field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }
}

/// Resolve a dotted field path inside a JSON document.
pub fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(data, |current, segment| current.get(segment))
}

/// Serialize a value into a JSON object, as required for documents.
pub fn to_fields<T: Serialize>(value: &T) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::NotAnObject(other.to_string())),
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Allocate a fresh document id.
    fn generate_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    async fn get(&self, collection: &CollectionPath, id: &str) -> Result<Option<Document>, StoreError>;

    /// Insert a new document at version 1. Fails with `AlreadyExists` if the id is taken.
    async fn create(
        &self,
        collection: &CollectionPath,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError>;

    /// Merge top-level fields into an existing document and bump its version.
    ///
    /// With `expected_version`, the write only happens if the stored version
    /// still matches; otherwise `Conflict` is returned and nothing changes.
    async fn update(
        &self,
        collection: &CollectionPath,
        id: &str,
        fields: Map<String, Value>,
        expected_version: Option<i64>,
    ) -> Result<Document, StoreError>;

    /// Documents matching every filter. Without `order_by` results come back
    /// in insertion order; with it, ascending by that field with ties in
    /// insertion order.
    async fn query(&self, collection: &CollectionPath, query: &Query) -> Result<Vec<Document>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
