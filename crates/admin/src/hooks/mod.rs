//! Resource hooks: cached, self-resynchronizing views over one collection.
//!
//! A [`ResourceHook`] owns the last fetched list of one entity collection and a
//! loading flag. Every mutation writes to the store and then re-fetches the
//! whole collection, so the cache always reflects the backend as of the most
//! recently completed fetch.
//!
//! Reads never fail from the caller's point of view: a failed fetch is logged
//! and the previous cache is kept. Writes return their error.
//!
//! Operations on one hook are not serialized against each other. When two
//! mutations race, the cache ends up with whichever re-fetch finished last.

mod singleton;

pub use singleton::{SettingsSnapshot, SingletonHook};

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, instrument};

use florist_core::{
    DocumentId, Entity, Record, Searchable, SortOrder, Timestamp, encode_new, encode_patch,
};

use crate::store::{Document, Filter, Query, StoreClient, StoreError};

/// Errors surfaced by hook write operations.
#[derive(Debug, Error)]
pub enum HookError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The entity or patch did not serialize to a JSON object.
    #[error("failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),

    /// A stored document does not match the entity's shape.
    #[error("document {id} could not be decoded: {source}")]
    Decode {
        id: DocumentId,
        #[source]
        source: serde_json::Error,
    },
}

/// The cached list and loading flag, as handed to callers.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<E> {
    pub items: Vec<Record<E>>,
    pub loading: bool,
}

impl<E> Default for Snapshot<E> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
        }
    }
}

/// Cached CRUD access to one entity collection.
pub struct ResourceHook<E: Entity> {
    inner: Arc<HookInner<E>>,
}

struct HookInner<E> {
    store: StoreClient,
    state: RwLock<Snapshot<E>>,
}

impl<E: Entity> Clone for ResourceHook<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Entity> ResourceHook<E> {
    /// Create a hook with an empty cache.
    #[must_use]
    pub fn new(store: StoreClient) -> Self {
        Self {
            inner: Arc::new(HookInner {
                store,
                state: RwLock::new(Snapshot::default()),
            }),
        }
    }

    pub(crate) fn store(&self) -> &StoreClient {
        &self.inner.store
    }

    /// Reload the whole collection in its natural order.
    pub async fn fetch(&self) {
        self.load(&Query::ordered(E::NATURAL_ORDER)).await;
    }

    /// Replace the cache with documents whose `field` equals `value`, in the
    /// natural order.
    pub async fn filter_by(&self, field: &str, value: impl Into<Value> + Send) {
        let query = Query::ordered(E::NATURAL_ORDER).filter(Filter::eq(field, value));
        self.load(&query).await;
    }

    /// Store a new record stamped with the current time and return its ID.
    ///
    /// # Errors
    ///
    /// Returns `HookError` if the insert fails; the cache is left unchanged.
    #[instrument(skip(self, data), fields(collection = E::COLLECTION))]
    pub async fn add(&self, data: E) -> Result<DocumentId, HookError> {
        let fields = encode_new(&data, Timestamp::now()).map_err(HookError::Encode)?;
        let id = self
            .inner
            .store
            .insert(E::COLLECTION, fields)
            .await
            .inspect_err(|e| {
                error!(collection = E::COLLECTION, error = %e, "failed to add record");
            })?;

        debug!(%id, "record added");
        self.fetch().await;
        Ok(id)
    }

    /// Overwrite the fields present in `patch` and refresh `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `HookError::Store(StoreError::NotFound { .. })` if no record
    /// has this ID, or any other store error.
    #[instrument(skip(self, patch), fields(collection = E::COLLECTION, id = %id))]
    pub async fn update(&self, id: &DocumentId, patch: E::Patch) -> Result<(), HookError> {
        let at = self.next_update_time(id).await;
        let fields = encode_patch(&patch, at).map_err(HookError::Encode)?;
        self.inner
            .store
            .update(E::COLLECTION, id, fields)
            .await
            .inspect_err(|e| {
                error!(collection = E::COLLECTION, error = %e, "failed to update record");
            })?;

        self.fetch().await;
        Ok(())
    }

    /// Remove a record. Removing an unknown ID succeeds.
    ///
    /// # Errors
    ///
    /// Returns `HookError` if the store rejects the delete.
    #[instrument(skip(self), fields(collection = E::COLLECTION, id = %id))]
    pub async fn delete(&self, id: &DocumentId) -> Result<(), HookError> {
        self.inner
            .store
            .delete(E::COLLECTION, id)
            .await
            .inspect_err(|e| {
                error!(collection = E::COLLECTION, error = %e, "failed to delete record");
            })?;

        self.fetch().await;
        Ok(())
    }

    /// Copy of the cached list and loading flag.
    pub async fn snapshot(&self) -> Snapshot<E> {
        self.inner.state.read().await.clone()
    }

    /// Copy of the cached list.
    pub async fn items(&self) -> Vec<Record<E>> {
        self.inner.state.read().await.items.clone()
    }

    /// Cached record with this ID.
    pub async fn get(&self, id: &DocumentId) -> Option<Record<E>> {
        self.inner
            .state
            .read()
            .await
            .items
            .iter()
            .find(|r| &r.id == id)
            .cloned()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.state.read().await.loading
    }

    /// `updated_at` for a write: now, but never earlier than what the cache
    /// last saw for this record.
    async fn next_update_time(&self, id: &DocumentId) -> Timestamp {
        let now = Timestamp::now();
        self.get(id)
            .await
            .map_or(now, |record| now.max(record.updated_at))
    }

    #[instrument(skip(self, query), fields(collection = E::COLLECTION))]
    async fn load(&self, query: &Query) {
        self.begin_load().await;
        let result = self.read(query).await;
        self.finish_load(result).await;
    }

    pub(crate) async fn begin_load(&self) {
        self.inner.state.write().await.loading = true;
    }

    /// Store the outcome of a read. A failure keeps the previous list.
    pub(crate) async fn finish_load(&self, result: Result<Vec<Record<E>>, HookError>) {
        match result {
            Ok(items) => {
                let mut state = self.inner.state.write().await;
                debug!(count = items.len(), "cache refreshed");
                state.items = items;
                state.loading = false;
            }
            Err(e) => {
                error!(collection = E::COLLECTION, error = %e, "failed to load records");
                self.inner.state.write().await.loading = false;
            }
        }
    }

    /// Run `query` and decode every document.
    pub(crate) async fn read(&self, query: &Query) -> Result<Vec<Record<E>>, HookError> {
        let documents = self.inner.store.list(E::COLLECTION, query).await?;
        documents
            .into_iter()
            .map(|Document { id, fields }| {
                Record::decode(id.clone(), fields)
                    .map_err(|source| HookError::Decode { id, source })
            })
            .collect()
    }
}

impl<E: Searchable> ResourceHook<E> {
    /// Replace the cache with records whose search field starts with `term`,
    /// ordered by that field ascending.
    ///
    /// A blank term reloads the full collection instead.
    pub async fn search(&self, term: &str) {
        let term = term.trim();
        if term.is_empty() {
            self.fetch().await;
            return;
        }

        let query = Query::ordered(SortOrder::ascending(E::SEARCH_FIELD))
            .filter(Filter::prefix(E::SEARCH_FIELD, term));
        self.load(&query).await;
    }
}
