//! Single-document configuration collections.

use serde::Serialize;
use tracing::{error, info, instrument};

use florist_core::{DocumentId, Record, Singleton, Timestamp, encode_new};

use super::{HookError, ResourceHook};
use crate::store::{Query, StoreClient};

/// The current settings document, or the defaults when none is cached.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsSnapshot<E> {
    pub id: Option<DocumentId>,
    #[serde(flatten)]
    pub settings: E,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    pub loading: bool,
}

/// Hook over a collection that should hold exactly one document.
///
/// The default document lives under [`Singleton::DOCUMENT_ID`] and is created
/// with an insert-if-absent, so concurrent first fetches cannot seed twice.
pub struct SingletonHook<E: Singleton> {
    resource: ResourceHook<E>,
}

impl<E: Singleton> Clone for SingletonHook<E> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

impl<E: Singleton> SingletonHook<E> {
    #[must_use]
    pub fn new(store: StoreClient) -> Self {
        Self {
            resource: ResourceHook::new(store),
        }
    }

    fn document_id() -> DocumentId {
        DocumentId::new(E::DOCUMENT_ID)
    }

    /// Insert the default document unless one already exists under the
    /// well-known ID. Returns `true` if this call created it.
    ///
    /// # Errors
    ///
    /// Returns `HookError` if the store rejects the write.
    #[instrument(skip(self), fields(collection = E::COLLECTION))]
    pub async fn ensure_default(&self) -> Result<bool, HookError> {
        let fields = encode_new(&E::defaults(), Timestamp::now()).map_err(HookError::Encode)?;
        let created = self
            .resource
            .store()
            .insert_if_absent(E::COLLECTION, &Self::document_id(), fields)
            .await
            .inspect_err(|e| {
                error!(collection = E::COLLECTION, error = %e, "failed to seed defaults");
            })?;

        if created {
            info!(collection = E::COLLECTION, "seeded default settings");
        }
        Ok(created)
    }

    /// Load the settings, seeding the defaults first if the collection is
    /// empty. Failures are logged and the previous value kept.
    pub async fn fetch(&self) {
        self.resource.begin_load().await;
        let result = self.load_or_seed().await;
        self.resource.finish_load(result).await;
    }

    async fn load_or_seed(&self) -> Result<Vec<Record<E>>, HookError> {
        let query = Query::ordered(E::NATURAL_ORDER);
        let items = self.resource.read(&query).await?;
        if !items.is_empty() {
            return Ok(items);
        }

        self.ensure_default().await?;
        self.resource.read(&query).await
    }

    /// Merge `patch` into the settings document, creating it from the
    /// defaults first if none is known yet.
    ///
    /// # Errors
    ///
    /// Returns `HookError` if seeding or the update fails.
    #[instrument(skip(self, patch), fields(collection = E::COLLECTION))]
    pub async fn update(&self, patch: E::Patch) -> Result<(), HookError> {
        let id = match self.current().await {
            Some(record) => record.id,
            None => {
                self.ensure_default().await?;
                Self::document_id()
            }
        };
        self.resource.update(&id, patch).await
    }

    /// The cached settings document, if loaded.
    pub async fn current(&self) -> Option<Record<E>> {
        self.resource.items().await.into_iter().next()
    }

    /// The cached settings, or the defaults if nothing is loaded.
    pub async fn settings(&self) -> E {
        self.current().await.map_or_else(E::defaults, |r| r.data)
    }

    pub async fn snapshot(&self) -> SettingsSnapshot<E> {
        let snapshot = self.resource.snapshot().await;
        match snapshot.items.into_iter().next() {
            Some(record) => SettingsSnapshot {
                id: Some(record.id),
                settings: record.data,
                created_at: Some(record.created_at),
                updated_at: Some(record.updated_at),
                loading: snapshot.loading,
            },
            None => SettingsSnapshot {
                id: None,
                settings: E::defaults(),
                created_at: None,
                updated_at: None,
                loading: snapshot.loading,
            },
        }
    }
}
