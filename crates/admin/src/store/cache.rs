//! Short-lived cache of collection listings.
//!
//! List results are cached under a key that includes a per-collection
//! generation number. Every write bumps the generation, so a listing taken
//! after a write never sees a result cached before it, even if the old entry
//! has not yet expired. The bump happens when the write's future completes
//! or is dropped, so a write abandoned by a timeout still invalidates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde_json::{Map, Value};
use tracing::debug;

use florist_core::DocumentId;

use super::{Document, DocumentStore, Query, StoreError};

/// Listing cache keyed by collection generation and query.
#[derive(Clone)]
pub struct QueryCache {
    entries: Cache<String, Arc<Vec<Document>>>,
    generations: Arc<Mutex<HashMap<String, u64>>>,
}

impl QueryCache {
    /// Build a cache holding at most `capacity` listings for `ttl` each.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::CacheInit` if either bound is zero.
    pub fn new(capacity: u64, ttl: Duration) -> Result<Self, StoreError> {
        if capacity == 0 {
            return Err(StoreError::CacheInit("capacity must be positive".to_owned()));
        }
        if ttl.is_zero() {
            return Err(StoreError::CacheInit("time-to-live must be positive".to_owned()));
        }

        let entries = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();

        Ok(Self {
            entries,
            generations: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    fn generation(&self, collection: &str) -> u64 {
        self.generations
            .lock()
            .map_or(0, |g| g.get(collection).copied().unwrap_or(0))
    }

    fn key(&self, collection: &str, query: &Query) -> String {
        format!(
            "{collection}#{}|{}",
            self.generation(collection),
            query.cache_key()
        )
    }

    /// Forget every listing of `collection`.
    pub fn invalidate(&self, collection: &str) {
        if let Ok(mut generations) = self.generations.lock() {
            *generations.entry(collection.to_owned()).or_insert(0) += 1;
        }
    }

    fn invalidate_on_drop<'a>(&'a self, collection: &'a str) -> InvalidateOnDrop<'a> {
        InvalidateOnDrop {
            cache: self,
            collection,
        }
    }
}

/// Bumps the collection's generation when dropped.
struct InvalidateOnDrop<'a> {
    cache: &'a QueryCache,
    collection: &'a str,
}

impl Drop for InvalidateOnDrop<'_> {
    fn drop(&mut self) {
        self.cache.invalidate(self.collection);
    }
}

/// A [`DocumentStore`] that serves repeated listings from a [`QueryCache`].
pub struct CachedDocumentStore {
    inner: Arc<dyn DocumentStore>,
    cache: QueryCache,
}

impl CachedDocumentStore {
    #[must_use]
    pub fn new(inner: Arc<dyn DocumentStore>, cache: QueryCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl DocumentStore for CachedDocumentStore {
    async fn list(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let key = self.cache.key(collection, query);
        if let Some(hit) = self.cache.entries.get(&key).await {
            debug!(collection, "listing cache hit");
            return Ok(hit.as_ref().clone());
        }

        let documents = self.inner.list(collection, query).await?;
        self.cache
            .entries
            .insert(key, Arc::new(documents.clone()))
            .await;
        Ok(documents)
    }

    async fn insert(
        &self,
        collection: &str,
        fields: Map<String, Value>,
    ) -> Result<DocumentId, StoreError> {
        let _invalidate = self.cache.invalidate_on_drop(collection);
        self.inner.insert(collection, fields).await
    }

    async fn insert_if_absent(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Map<String, Value>,
    ) -> Result<bool, StoreError> {
        let _invalidate = self.cache.invalidate_on_drop(collection);
        self.inner.insert_if_absent(collection, id, fields).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let _invalidate = self.cache.invalidate_on_drop(collection);
        self.inner.update(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError> {
        let _invalidate = self.cache.invalidate_on_drop(collection);
        self.inner.delete(collection, id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;
    use florist_core::SortOrder;
    use serde_json::json;

    fn body(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn cached() -> (Arc<MemoryDocumentStore>, CachedDocumentStore) {
        let backend = Arc::new(MemoryDocumentStore::new());
        let cache = QueryCache::new(100, Duration::from_secs(60)).unwrap();
        let store = CachedDocumentStore::new(backend.clone(), cache);
        (backend, store)
    }

    #[test]
    fn test_rejects_zero_bounds() {
        assert!(matches!(
            QueryCache::new(0, Duration::from_secs(5)),
            Err(StoreError::CacheInit(_))
        ));
        assert!(matches!(
            QueryCache::new(10, Duration::ZERO),
            Err(StoreError::CacheInit(_))
        ));
    }

    #[tokio::test]
    async fn test_serves_cached_listing_until_write() {
        let (backend, store) = cached();
        let query = Query::ordered(SortOrder::ascending("name"));
        store.insert("m", body(json!({"name": "Rose"}))).await.unwrap();
        assert_eq!(store.list("m", &query).await.unwrap().len(), 1);

        // Bypass the cache; the stale listing is still served.
        backend.insert("m", body(json!({"name": "Tulip"}))).await.unwrap();
        assert_eq!(store.list("m", &query).await.unwrap().len(), 1);

        // A write through the cache makes the next listing fresh.
        store.insert("m", body(json!({"name": "Lily"}))).await.unwrap();
        assert_eq!(store.list("m", &query).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_invalidation_is_per_collection() {
        let (backend, store) = cached();
        let query = Query::default();
        store.list("a", &query).await.unwrap();
        store.list("b", &query).await.unwrap();

        backend.insert("a", body(json!({}))).await.unwrap();
        backend.insert("b", body(json!({}))).await.unwrap();
        store.delete("a", &DocumentId::new("none")).await.unwrap();

        assert_eq!(store.list("a", &query).await.unwrap().len(), 1);
        assert_eq!(store.list("b", &query).await.unwrap().len(), 0);
    }

    /// Commits the insert, then never answers.
    struct HangsAfterInsert(MemoryDocumentStore);

    #[async_trait]
    impl DocumentStore for HangsAfterInsert {
        async fn list(
            &self,
            collection: &str,
            query: &Query,
        ) -> Result<Vec<Document>, StoreError> {
            self.0.list(collection, query).await
        }

        async fn insert(
            &self,
            collection: &str,
            fields: Map<String, Value>,
        ) -> Result<DocumentId, StoreError> {
            self.0.insert(collection, fields).await?;
            std::future::pending::<Result<DocumentId, StoreError>>().await
        }

        async fn insert_if_absent(
            &self,
            collection: &str,
            id: &DocumentId,
            fields: Map<String, Value>,
        ) -> Result<bool, StoreError> {
            self.0.insert_if_absent(collection, id, fields).await
        }

        async fn update(
            &self,
            collection: &str,
            id: &DocumentId,
            fields: Map<String, Value>,
        ) -> Result<(), StoreError> {
            self.0.update(collection, id, fields).await
        }

        async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError> {
            self.0.delete(collection, id).await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_write_still_invalidates() {
        let backend = Arc::new(HangsAfterInsert(MemoryDocumentStore::new()));
        let cache = QueryCache::new(100, Duration::from_secs(60)).unwrap();
        let store = CachedDocumentStore::new(backend, cache);
        let query = Query::default();
        assert!(store.list("m", &query).await.unwrap().is_empty());

        let write = store.insert("m", body(json!({"name": "Rose"})));
        let timed_out = tokio::time::timeout(Duration::from_secs(1), write).await;
        assert!(timed_out.is_err());

        assert_eq!(store.list("m", &query).await.unwrap().len(), 1);
    }
}
