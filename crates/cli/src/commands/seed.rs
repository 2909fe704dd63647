//! Seed the settings singletons.
//!
//! Writes the default shop and delivery settings documents when they are
//! missing. Existing documents are left untouched, so the command is safe to
//! run on every deploy.

use tracing::info;

use florist_admin::config::StoreConfig;
use florist_admin::hooks::SingletonHook;
use florist_admin::store::StoreProvider;
use florist_core::{DeliverySettings, ShopSettings, Singleton};

use super::CommandError;

/// Seed both settings collections.
///
/// # Errors
///
/// Returns an error if configuration is invalid or a write fails.
pub async fn run() -> Result<(), CommandError> {
    dotenvy::dotenv().ok();

    let config = StoreConfig::from_env()?;
    let provider = StoreProvider::new();
    let store = provider.get_or_init(&config).await?;

    seed::<ShopSettings>(SingletonHook::new(store.clone())).await?;
    seed::<DeliverySettings>(SingletonHook::new(store)).await?;

    Ok(())
}

async fn seed<E: Singleton>(hook: SingletonHook<E>) -> Result<(), CommandError> {
    if hook.ensure_default().await? {
        info!(collection = E::COLLECTION, "Seeded default settings");
    } else {
        info!(collection = E::COLLECTION, "Settings already present");
    }
    Ok(())
}
