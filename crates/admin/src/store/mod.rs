//! Document store access.
//!
//! Every resource collection lives in one document store. Backends implement
//! [`DocumentStore`]; the rest of the crate talks to a [`StoreClient`], which
//! bounds every call with a timeout and is created once per process by a
//! [`StoreProvider`].
//!
//! # Backends
//!
//! - [`PgDocumentStore`] - `PostgreSQL` JSONB table (`documents`)
//! - [`MemoryDocumentStore`] - in-process maps, for local development and tests
//!
//! # Query caching
//!
//! [`CachedDocumentStore`] wraps a backend with a short-lived `moka` cache of
//! list results. If the cache cannot be configured the provider falls back to
//! the bare backend.

pub mod cache;
pub mod client;
pub mod memory;
pub mod postgres;

use std::cmp::Ordering;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use florist_core::{DocumentId, SortOrder};

pub use cache::{CachedDocumentStore, QueryCache};
pub use client::{StoreClient, StoreProvider};
pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

/// Upper bound appended to a prefix to form a range query.
pub const PREFIX_SENTINEL: char = '\u{f8ff}';

/// Errors that can occur during document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// No document with this ID exists in the collection.
    #[error("document {id} not found in {collection}")]
    NotFound { collection: String, id: DocumentId },

    /// The store did not answer within the configured timeout.
    #[error("store call timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The query cache could not be configured.
    #[error("query cache unavailable: {0}")]
    CacheInit(String),

    /// The store is unreachable or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A stored document: its ID and JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Map<String, Value>,
}

/// A predicate on one document field.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals the value exactly.
    Eq { field: String, value: Value },
    /// Text field lies between `term` and `term` + [`PREFIX_SENTINEL`].
    Prefix { field: String, term: String },
}

impl Filter {
    /// Equality predicate.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Prefix-range predicate.
    pub fn prefix(field: impl Into<String>, term: impl Into<String>) -> Self {
        Self::Prefix {
            field: field.into(),
            term: term.into(),
        }
    }

    /// Evaluate the predicate against a document body.
    #[must_use]
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        match self {
            Self::Eq { field, value } => fields.get(field) == Some(value),
            Self::Prefix { field, term } => {
                let Some(Value::String(text)) = fields.get(field) else {
                    return false;
                };
                let upper = format!("{term}{PREFIX_SENTINEL}");
                text.as_str() >= term.as_str() && text.as_str() <= upper.as_str()
            }
        }
    }
}

/// A collection listing: filters plus an optional ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<SortOrder>,
}

impl Query {
    /// Every document, in the given order.
    #[must_use]
    pub const fn ordered(order: SortOrder) -> Self {
        Self {
            filters: Vec::new(),
            order_by: Some(order),
        }
    }

    /// Add a predicate.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Stable key identifying this query in a cache.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("{:?}|{:?}", self.filters, self.order_by)
    }
}

/// Collection-scoped document storage.
///
/// All operations may fail with a connectivity or permission error, which is
/// returned to the caller.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List documents matching `query`, in its order.
    async fn list(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Insert a document and return its newly generated ID.
    async fn insert(
        &self,
        collection: &str,
        fields: Map<String, Value>,
    ) -> Result<DocumentId, StoreError>;

    /// Insert a document under a fixed ID unless one already exists.
    ///
    /// Returns `true` if this call created the document.
    async fn insert_if_absent(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Map<String, Value>,
    ) -> Result<bool, StoreError>;

    /// Merge `fields` into an existing document's top level.
    ///
    /// Fails with [`StoreError::NotFound`] if the document does not exist.
    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError>;

    /// Remove a document. Removing a missing document is a no-op.
    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Compare two optional JSON values the way the store orders them.
///
/// Values rank by kind: missing or null, then numbers, then strings, then
/// everything else. Numbers compare numerically and strings by byte order
/// (the "C" collation); other kinds compare equal.
#[must_use]
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    kind_rank(a).cmp(&kind_rank(b)).then_with(|| match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => Ordering::Equal,
    })
}

const fn kind_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(_) => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_prefix_filter_matches_range() {
        let filter = Filter::prefix("name", "Kim");
        assert!(filter.matches(&fields(json!({"name": "Kim"}))));
        assert!(filter.matches(&fields(json!({"name": "Kim2"}))));
        assert!(!filter.matches(&fields(json!({"name": "Lee"}))));
        assert!(!filter.matches(&fields(json!({"name": "Ki"}))));
        assert!(!filter.matches(&fields(json!({"other": "Kim"}))));
    }

    #[test]
    fn test_eq_filter() {
        let filter = Filter::eq("status", "pending");
        assert!(filter.matches(&fields(json!({"status": "pending"}))));
        assert!(!filter.matches(&fields(json!({"status": "completed"}))));
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(
            compare_values(Some(&json!(1)), Some(&json!(2))),
            Ordering::Less
        );
        assert_eq!(
            compare_values(Some(&json!("b")), Some(&json!("a"))),
            Ordering::Greater
        );
        assert_eq!(compare_values(None, Some(&json!("a"))), Ordering::Less);
        assert_eq!(
            compare_values(Some(&json!(1.5)), Some(&json!(1))),
            Ordering::Greater
        );
    }

    #[test]
    fn test_compare_values_ranks_kinds_and_uses_byte_order() {
        assert_eq!(
            compare_values(Some(&json!(10)), Some(&json!("1"))),
            Ordering::Less
        );
        assert_eq!(
            compare_values(Some(&json!("z")), Some(&json!(true))),
            Ordering::Less
        );
        assert_eq!(
            compare_values(Some(&Value::Null), Some(&json!(-5))),
            Ordering::Less
        );
        assert_eq!(
            compare_values(Some(&json!(true)), Some(&json!(false))),
            Ordering::Equal
        );
        // Byte order: '-' (0x2d) sorts before 'a' (0x61).
        assert_eq!(
            compare_values(Some(&json!("Kim-b")), Some(&json!("Kima"))),
            Ordering::Less
        );
        assert_eq!(
            compare_values(Some(&json!("Zoe")), Some(&json!("adam"))),
            Ordering::Less
        );
    }

    #[test]
    fn test_cache_key_distinguishes_queries() {
        let a = Query::ordered(SortOrder::ascending("name"));
        let b = Query::ordered(SortOrder::descending("name"));
        let c = a.clone().filter(Filter::prefix("name", "K"));
        assert_ne!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), c.cache_key());
        assert_eq!(a.cache_key(), a.clone().cache_key());
    }
}
