//! CLI command implementations.

pub mod migrate;
pub mod seed;

use thiserror::Error;

use florist_admin::config::ConfigError;
use florist_admin::hooks::HookError;
use florist_admin::store::StoreError;

/// Errors from CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Seed error: {0}")]
    Hook(#[from] HookError),

    #[error("Migrations need STORE_BACKEND=postgres")]
    NotPostgres,
}
