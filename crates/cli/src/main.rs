//! Florist CLI - Database migrations and seeding.
//!
//! # Usage
//!
//! ```bash
//! # Create the documents table and indexes
//! florist-cli migrate
//!
//! # Write default shop and delivery settings if they are missing
//! florist-cli seed
//! ```
//!
//! Both commands read the same environment as the server
//! (`FLORIST_DATABASE_URL`, `STORE_BACKEND`, ...).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "florist-cli")]
#[command(author, version, about = "Florist admin CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed default settings documents
    Seed,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
    }
    Ok(())
}
