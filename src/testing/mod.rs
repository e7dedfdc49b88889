//! Test doubles shared by the unit tests.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::identity::{IdentityError, IdentityGateway};
use crate::models::UserProfile;
use crate::store::{CollectionPath, Document, DocumentStore, MemoryStore, Query, StoreError};

/// Profile for user `id`, registered as `{id}@example.com`.
pub fn user(id: &str) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        email: format!("{}@example.com", id),
        first_name: id.to_uppercase(),
        last_name: "Tester".to_string(),
    }
}

/// In-process identity service. Tokens are `token-{id}`.
#[derive(Debug, Default)]
pub struct FakeIdentity {
    by_email: HashMap<String, UserProfile>,
    by_token: HashMap<String, UserProfile>,
    unavailable: bool,
}

impl FakeIdentity {
    pub fn with_users<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let mut identity = Self::default();
        for id in ids {
            let profile = user(id);
            identity.by_email.insert(profile.email.clone(), profile.clone());
            identity.by_token.insert(format!("token-{}", id), profile);
        }
        identity
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl IdentityGateway for FakeIdentity {
    async fn resolve_token(&self, token: &str) -> Result<UserProfile, IdentityError> {
        if self.unavailable {
            return Err(IdentityError::Unavailable("connection refused".to_string()));
        }
        self.by_token.get(token).cloned().ok_or(IdentityError::InvalidCredential)
    }

    async fn resolve_email(&self, email: &str) -> Result<UserProfile, IdentityError> {
        if self.unavailable {
            return Err(IdentityError::Unavailable("connection refused".to_string()));
        }
        self.by_email
            .get(email)
            .cloned()
            .ok_or_else(|| IdentityError::Rejected("User not found".to_string()))
    }
}

/// Memory store that applies a competing write right before the next
/// `times` conditional updates, forcing version conflicts.
pub struct InterferingStore {
    inner: MemoryStore,
    interference: Map<String, Value>,
    remaining: Mutex<usize>,
}

impl InterferingStore {
    pub fn new(interference: Map<String, Value>, times: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            interference,
            remaining: Mutex::new(times),
        }
    }

    fn take_turn(&self) -> bool {
        let mut remaining = self.remaining.lock().unwrap();
        if *remaining == 0 {
            return false;
        }
        *remaining -= 1;
        true
    }
}

#[async_trait]
impl DocumentStore for InterferingStore {
    async fn get(&self, collection: &CollectionPath, id: &str) -> Result<Option<Document>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn create(
        &self,
        collection: &CollectionPath,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        self.inner.create(collection, id, data).await
    }

    async fn update(
        &self,
        collection: &CollectionPath,
        id: &str,
        fields: Map<String, Value>,
        expected_version: Option<i64>,
    ) -> Result<Document, StoreError> {
        if expected_version.is_some() && self.take_turn() {
            self.inner.update(collection, id, self.interference.clone(), None).await?;
        }
        self.inner.update(collection, id, fields, expected_version).await
    }

    async fn query(&self, collection: &CollectionPath, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.inner.query(collection, query).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.inner.health_check().await
    }
}
