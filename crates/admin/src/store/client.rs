//! Shared store handle.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use florist_core::DocumentId;

use super::{
    CachedDocumentStore, Document, DocumentStore, MemoryDocumentStore, PgDocumentStore, Query,
    QueryCache, StoreError,
};
use crate::config::{StoreBackend, StoreConfig};

/// Cheap-to-clone handle to the document store.
///
/// Every call is bounded by the configured timeout and fails with
/// [`StoreError::Timeout`] when it expires.
#[derive(Clone)]
pub struct StoreClient {
    inner: Arc<StoreClientInner>,
}

struct StoreClientInner {
    store: Arc<dyn DocumentStore>,
    call_timeout: Duration,
    cached: bool,
}

impl StoreClient {
    /// Wrap a backend without a listing cache.
    #[must_use]
    pub fn uncached(store: Arc<dyn DocumentStore>, call_timeout: Duration) -> Self {
        Self::build(store, call_timeout, false)
    }

    /// Wrap a backend, adding a listing cache when `config` allows one.
    ///
    /// An invalid cache configuration is logged and the backend is used
    /// uncached.
    #[must_use]
    pub fn with_config(store: Arc<dyn DocumentStore>, config: &StoreConfig) -> Self {
        match QueryCache::new(config.cache_capacity, config.cache_ttl) {
            Ok(cache) => Self::build(
                Arc::new(CachedDocumentStore::new(store, cache)),
                config.call_timeout,
                true,
            ),
            Err(e) => {
                warn!(error = %e, "query cache disabled, using uncached store");
                Self::uncached(store, config.call_timeout)
            }
        }
    }

    fn build(store: Arc<dyn DocumentStore>, call_timeout: Duration, cached: bool) -> Self {
        Self {
            inner: Arc::new(StoreClientInner {
                store,
                call_timeout,
                cached,
            }),
        }
    }

    /// Whether listings go through the query cache.
    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.inner.cached
    }

    /// Whether two clients share the same underlying handle.
    #[must_use]
    pub fn same_handle(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>> + Send,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.inner.call_timeout, call)
            .await
            .map_err(|_| StoreError::Timeout(self.inner.call_timeout))?
    }

    /// List documents matching `query`.
    ///
    /// # Errors
    ///
    /// Returns the backend error, or `StoreError::Timeout`.
    pub async fn list(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.bounded(self.inner.store.list(collection, query)).await
    }

    /// Insert a document under a generated ID.
    ///
    /// # Errors
    ///
    /// Returns the backend error, or `StoreError::Timeout`.
    pub async fn insert(
        &self,
        collection: &str,
        fields: Map<String, Value>,
    ) -> Result<DocumentId, StoreError> {
        self.bounded(self.inner.store.insert(collection, fields)).await
    }

    /// Insert a document under `id` unless it already exists.
    ///
    /// # Errors
    ///
    /// Returns the backend error, or `StoreError::Timeout`.
    pub async fn insert_if_absent(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Map<String, Value>,
    ) -> Result<bool, StoreError> {
        self.bounded(self.inner.store.insert_if_absent(collection, id, fields))
            .await
    }

    /// Merge `fields` into an existing document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the document does not exist.
    pub async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        self.bounded(self.inner.store.update(collection, id, fields))
            .await
    }

    /// Remove a document if present.
    ///
    /// # Errors
    ///
    /// Returns the backend error, or `StoreError::Timeout`.
    pub async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError> {
        self.bounded(self.inner.store.delete(collection, id)).await
    }

    /// Check that the backend answers.
    ///
    /// # Errors
    ///
    /// Returns the backend error, or `StoreError::Timeout`.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.bounded(self.inner.store.ping()).await
    }
}

/// Creates the process-wide [`StoreClient`] at most once.
///
/// Owned by the process entry point and handed to whoever needs the store.
/// The first successful [`get_or_init`](Self::get_or_init) connects; every
/// later call returns a clone of the same handle.
#[derive(Default)]
pub struct StoreProvider {
    cell: OnceCell<StoreClient>,
}

impl StoreProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared client, connecting on first use.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the backend cannot be reached. A
    /// failed attempt leaves the provider uninitialized.
    pub async fn get_or_init(&self, config: &StoreConfig) -> Result<StoreClient, StoreError> {
        self.cell
            .get_or_try_init(|| connect(config))
            .await
            .cloned()
    }

    /// The shared client, if already initialized.
    #[must_use]
    pub fn get(&self) -> Option<StoreClient> {
        self.cell.get().cloned()
    }
}

async fn connect(config: &StoreConfig) -> Result<StoreClient, StoreError> {
    let backend: Arc<dyn DocumentStore> = match &config.backend {
        StoreBackend::Postgres { database_url } => {
            let store = PgDocumentStore::connect(database_url).await?;
            info!("connected to PostgreSQL document store");
            Arc::new(store)
        }
        StoreBackend::Memory => {
            info!("using in-memory document store");
            Arc::new(MemoryDocumentStore::new())
        }
    };
    Ok(StoreClient::with_config(backend, config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Backend whose calls never finish in time.
    struct StalledStore;

    #[async_trait]
    impl DocumentStore for StalledStore {
        async fn list(&self, _: &str, _: &Query) -> Result<Vec<Document>, StoreError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }

        async fn insert(&self, _: &str, _: Map<String, Value>) -> Result<DocumentId, StoreError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(DocumentId::generate())
        }

        async fn insert_if_absent(
            &self,
            _: &str,
            _: &DocumentId,
            _: Map<String, Value>,
        ) -> Result<bool, StoreError> {
            Ok(false)
        }

        async fn update(
            &self,
            _: &str,
            _: &DocumentId,
            _: Map<String, Value>,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn delete(&self, _: &str, _: &DocumentId) -> Result<(), StoreError> {
            Ok(())
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_provider_initializes_once() {
        let provider = StoreProvider::new();
        assert!(provider.get().is_none());

        let config = StoreConfig::memory();
        let first = provider.get_or_init(&config).await.unwrap();
        let second = provider.get_or_init(&config).await.unwrap();
        assert!(first.same_handle(&second));
        assert!(provider.get().unwrap().same_handle(&first));
    }

    #[tokio::test]
    async fn test_invalid_cache_config_falls_back_to_uncached() {
        let config = StoreConfig {
            cache_capacity: 0,
            ..StoreConfig::memory()
        };
        let client = StoreProvider::new().get_or_init(&config).await.unwrap();
        assert!(!client.is_cached());

        let id = client.insert("c", Map::new()).await.unwrap();
        let docs = client.list("c", &Query::default()).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, id);
    }

    #[tokio::test]
    async fn test_valid_config_is_cached() {
        let client = StoreProvider::new()
            .get_or_init(&StoreConfig::memory())
            .await
            .unwrap();
        assert!(client.is_cached());
        client.ping().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_time_out() {
        let client = StoreClient::uncached(Arc::new(StalledStore), Duration::from_millis(50));
        let err = client.list("c", &Query::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::Timeout(d) if d == Duration::from_millis(50)));

        let err = client.insert("c", Map::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::Timeout(_)));
    }
}
