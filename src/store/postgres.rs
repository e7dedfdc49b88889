use async_trait::async_trait;
use serde_json::{json, Map, Value};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::{debug, info};

use super::{CollectionPath, Document, DocumentStore, Filter, Query, StoreError};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        version BIGINT NOT NULL DEFAULT 1,
        seq BIGSERIAL,
        data JSONB NOT NULL,
        PRIMARY KEY (collection, id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS documents_data_gin ON documents USING GIN (data jsonb_path_ops)",
    "CREATE INDEX IF NOT EXISTS documents_collection_seq ON documents (collection, seq)",
];

/// Documents kept as JSONB rows in a single `documents` table keyed by
/// (collection path, id).
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!("Connected document store pool (max {} connections)", max_connections);
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the documents table and indexes. Safe to run repeatedly.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Document store schema is up to date");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed document store pool");
    }

    /// Dotted field path as a Postgres text[] path for `#>`.
    fn json_path(field: &str) -> Vec<String> {
        field.split('.').map(str::to_string).collect()
    }

    fn row_to_document(row: PgRow) -> Result<Document, StoreError> {
        let Json(data): Json<Value> = row.try_get("data")?;
        Ok(Document {
            id: row.try_get("id")?,
            version: row.try_get("version")?,
            data,
        })
    }

    fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
        builder.push(" AND data #> ");
        builder.push_bind(Self::json_path(filter.field()));
        match filter {
            Filter::Eq { value, .. } => {
                builder.push(" = ");
                builder.push_bind(Json(value.clone()));
            }
            Filter::ArrayContains { value, .. } => {
                builder.push(" @> ");
                builder.push_bind(Json(json!([value])));
            }
        }
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn get(&self, collection: &CollectionPath, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query("SELECT id, version, data FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_document).transpose()
    }

    async fn create(
        &self,
        collection: &CollectionPath,
        id: &str,
        mut data: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        data.insert("id".to_string(), Value::String(id.to_string()));

        let row = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, version, data)
            VALUES ($1, $2, 1, $3)
            ON CONFLICT (collection, id) DO NOTHING
            RETURNING id, version, data
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(Value::Object(data)))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                debug!("Created document {}", collection.document(id));
                Self::row_to_document(row)
            }
            None => Err(StoreError::AlreadyExists(collection.document(id))),
        }
    }

    async fn update(
        &self,
        collection: &CollectionPath,
        id: &str,
        mut fields: Map<String, Value>,
        expected_version: Option<i64>,
    ) -> Result<Document, StoreError> {
        fields.remove("id");

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE documents SET data = data || ");
        builder.push_bind(Json(Value::Object(fields)));
        builder.push(", version = version + 1 WHERE collection = ");
        builder.push_bind(collection.as_str());
        builder.push(" AND id = ");
        builder.push_bind(id);
        if let Some(expected) = expected_version {
            builder.push(" AND version = ");
            builder.push_bind(expected);
        }
        builder.push(" RETURNING id, version, data");

        if let Some(row) = builder.build().fetch_optional(&self.pool).await? {
            return Self::row_to_document(row);
        }

        // Nothing updated: either the document is gone or the version moved.
        match (self.get(collection, id).await?, expected_version) {
            (Some(current), Some(expected)) => Err(StoreError::Conflict {
                path: collection.document(id),
                expected,
                actual: current.version,
            }),
            _ => Err(StoreError::NotFound(collection.document(id))),
        }
    }

    async fn query(&self, collection: &CollectionPath, query: &Query) -> Result<Vec<Document>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT id, version, data FROM documents WHERE collection = ");
        builder.push_bind(collection.as_str());
        for filter in &query.filters {
            Self::push_filter(&mut builder, filter);
        }

        builder.push(" ORDER BY ");
        if let Some(field) = &query.order_by {
            builder.push("data #> ");
            builder.push_bind(Self::json_path(field));
            builder.push(" ASC NULLS FIRST, ");
        }
        builder.push("seq ASC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_document).collect()
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
