//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! florist-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! Values are read from `.env` when present.
//!
//! - `FLORIST_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! Migrations live in `crates/admin/migrations/`.

use tracing::info;

use florist_admin::config::{StoreBackend, StoreConfig};
use florist_admin::store::StoreError;
use florist_admin::store::postgres::{create_pool, migrate};

use super::CommandError;

/// Run the admin migrations against the configured database.
///
/// # Errors
///
/// Returns `CommandError::NotPostgres` when the memory backend is selected,
/// or the store error if connecting or migrating fails.
pub async fn run() -> Result<(), CommandError> {
    dotenvy::dotenv().ok();

    let config = StoreConfig::from_env()?;
    let StoreBackend::Postgres { database_url } = &config.backend else {
        return Err(CommandError::NotPostgres);
    };

    info!("Connecting to database...");
    let pool = create_pool(database_url).await.map_err(StoreError::from)?;

    info!("Running migrations...");
    migrate(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}
