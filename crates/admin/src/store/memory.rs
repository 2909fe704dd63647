//! In-process document store.
//!
//! Holds every collection in memory with the same query semantics as the
//! `PostgreSQL` backend. Used when `STORE_BACKEND=memory` and by tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::{Map, Value};

use florist_core::{DocumentId, Direction};

use super::{Document, DocumentStore, Query, StoreError, compare_values};

type Collection = BTreeMap<DocumentId, Map<String, Value>>;

/// Document store backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the store lock is poisoned.
    pub fn count(&self, collection: &str) -> Result<usize, StoreError> {
        let collections = self.collections.read().map_err(|_| poisoned())?;
        Ok(collections.get(collection).map_or(0, BTreeMap::len))
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".to_owned())
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().map_err(|_| poisoned())?;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<Document> = docs
            .iter()
            .filter(|(_, fields)| query.filters.iter().all(|f| f.matches(fields)))
            .map(|(id, fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect();

        if let Some(order) = query.order_by {
            matched.sort_by(|a, b| {
                let ordering = compare_values(a.fields.get(order.field), b.fields.get(order.field));
                let ordering = match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                };
                ordering.then_with(|| a.id.cmp(&b.id))
            });
        }

        Ok(matched)
    }

    async fn insert(
        &self,
        collection: &str,
        fields: Map<String, Value>,
    ) -> Result<DocumentId, StoreError> {
        let id = DocumentId::generate();
        let mut collections = self.collections.write().map_err(|_| poisoned())?;
        collections
            .entry(collection.to_owned())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn insert_if_absent(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Map<String, Value>,
    ) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().map_err(|_| poisoned())?;
        let docs = collections.entry(collection.to_owned()).or_default();
        if docs.contains_key(id) {
            return Ok(false);
        }
        docs.insert(id.clone(), fields);
        Ok(true)
    }

    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().map_err(|_| poisoned())?;
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_owned(),
                id: id.clone(),
            })?;
        existing.extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError> {
        let mut collections = self.collections.write().map_err(|_| poisoned())?;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
