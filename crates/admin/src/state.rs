//! Application state shared across handlers.

use std::sync::Arc;

use thiserror::Error;

use florist_core::{Entity, Singleton};

use crate::config::AdminConfig;
use crate::hooks::{ResourceHook, SingletonHook};
use crate::services::{GooglePhotosClient, PhotosApi, PhotosError, WeatherClient, WeatherError};
use crate::store::StoreClient;

/// Errors building the application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to build Google Photos client: {0}")]
    Photos(#[from] PhotosError),
    #[error("failed to build weather client: {0}")]
    Weather(#[from] WeatherError),
}

/// Application state shared across all handlers.
///
/// Holds the shared store client. Hooks are built per request on top of it,
/// so one client's search never shows up in another client's listing.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    store: StoreClient,
    photos: Option<GooglePhotosClient>,
    weather: WeatherClient,
}

impl AppState {
    /// Build the state around an initialized store client.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if an external service client cannot be built.
    pub fn new(config: AdminConfig, store: StoreClient) -> Result<Self, StateError> {
        let photos = config.google().map(GooglePhotosClient::new).transpose()?;
        let weather = WeatherClient::new(&config.weather)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                store,
                photos,
                weather,
                config,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &StoreClient {
        &self.inner.store
    }

    /// Album client, or `None` when Google credentials are not configured.
    #[must_use]
    pub fn photos(&self) -> Option<&dyn PhotosApi> {
        self.inner.photos.as_ref().map(|c| c as &dyn PhotosApi)
    }

    #[must_use]
    pub fn weather(&self) -> &WeatherClient {
        &self.inner.weather
    }

    /// A fresh hook over `E`'s collection with an empty cache.
    #[must_use]
    pub fn resource<E: Entity>(&self) -> ResourceHook<E> {
        ResourceHook::new(self.inner.store.clone())
    }

    /// A fresh settings hook for `E`.
    #[must_use]
    pub fn singleton<E: Singleton>(&self) -> SingletonHook<E> {
        SingletonHook::new(self.inner.store.clone())
    }
}
