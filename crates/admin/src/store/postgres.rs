//! `PostgreSQL` JSONB document store.
//!
//! # Table: `documents`
//!
//! | column       | type          |
//! |--------------|---------------|
//! | `collection` | `TEXT`        |
//! | `id`         | `TEXT`        |
//! | `data`       | `JSONB`       |
//! | `inserted_at`| `TIMESTAMPTZ` |
//!
//! Primary key `(collection, id)`. Created by the migrations in
//! `crates/admin/migrations/`, run via `florist-cli migrate`.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use florist_core::{Direction, DocumentId};

use super::{Document, DocumentStore, Filter, PREFIX_SENTINEL, Query, StoreError};

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Run the bundled migrations.
///
/// # Errors
///
/// Returns `StoreError::Migration` if a migration fails to apply.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Document store over a `PostgreSQL` `documents` table.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect using a database URL.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the connection cannot be established.
    pub async fn connect(database_url: &SecretString) -> Result<Self, StoreError> {
        Ok(Self::new(create_pool(database_url).await?))
    }
}

/// Build the listing statement for `query`.
fn list_statement<'a>(collection: &'a str, query: &'a Query) -> QueryBuilder<'a, Postgres> {
    let mut builder =
        QueryBuilder::<Postgres>::new("SELECT id, data FROM documents WHERE collection = ");
    builder.push_bind(collection);

    for filter in &query.filters {
        match filter {
            Filter::Eq { field, value } => {
                builder.push(" AND data -> ");
                builder.push_bind(field.as_str());
                builder.push(" = ");
                builder.push_bind(Json(value.clone()));
            }
            Filter::Prefix { field, term } => {
                builder.push(" AND (data ->> ");
                builder.push_bind(field.as_str());
                builder.push(r#") COLLATE "C" >= "#);
                builder.push_bind(term.as_str());
                builder.push(" AND (data ->> ");
                builder.push_bind(field.as_str());
                builder.push(r#") COLLATE "C" <= "#);
                builder.push_bind(format!("{term}{PREFIX_SENTINEL}"));
            }
        }
    }

    if let Some(order) = query.order_by {
        // Kind rank, then numbers numerically, then strings in byte order,
        // matching `compare_values`.
        let direction = match order.direction {
            Direction::Ascending => " ASC",
            Direction::Descending => " DESC",
        };
        builder.push(" ORDER BY CASE COALESCE(jsonb_typeof(data -> ");
        builder.push_bind(order.field);
        builder.push("), 'null')");
        builder.push(" WHEN 'null' THEN 0 WHEN 'number' THEN 1 WHEN 'string' THEN 2 ELSE 3 END");
        builder.push(direction);
        builder.push(", CASE WHEN jsonb_typeof(data -> ");
        builder.push_bind(order.field);
        builder.push(") = 'number' THEN (data ->> ");
        builder.push_bind(order.field);
        builder.push(")::numeric END");
        builder.push(direction);
        builder.push(", CASE WHEN jsonb_typeof(data -> ");
        builder.push_bind(order.field);
        builder.push(") = 'string' THEN (data ->> ");
        builder.push_bind(order.field);
        builder.push(r#") END COLLATE "C""#);
        builder.push(direction);
        builder.push(", id");
    }

    builder
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    #[instrument(skip(self, query), fields(filters = query.filters.len()))]
    async fn list(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let mut builder = list_statement(collection, query);
        let rows: Vec<(String, Json<Map<String, Value>>)> =
            builder.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(id, Json(fields))| Document {
                id: DocumentId::from(id),
                fields,
            })
            .collect())
    }

    #[instrument(skip(self, fields))]
    async fn insert(
        &self,
        collection: &str,
        fields: Map<String, Value>,
    ) -> Result<DocumentId, StoreError> {
        let id = DocumentId::generate();
        sqlx::query("INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(id.as_str())
            .bind(Json(fields))
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    #[instrument(skip(self, fields), fields(id = %id))]
    async fn insert_if_absent(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Map<String, Value>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO NOTHING
            ",
        )
        .bind(collection)
        .bind(id.as_str())
        .bind(Json(fields))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, fields), fields(id = %id))]
    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"
            UPDATE documents SET data = data || $3
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(collection)
        .bind(id.as_str())
        .bind(Json(fields))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                collection: collection.to_owned(),
                id: id.clone(),
            });
        }
        Ok(())
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
