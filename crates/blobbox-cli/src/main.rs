mod cli;
mod commands;

use std::path::PathBuf;

use anyhow::Result;
use blobbox_config::Config;
use blobbox_storage::{BlobStore, Storage, StoreLimits};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let config = Config::load()?;

    // RUST_LOG wins over the configured filter
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log.filter)),
        )
        .init();

    match cli.command {
        cli::Commands::Serve { host, port } => {
            let store = open_store(cli.db, &config).await?;
            commands::serve::handle(store, host, port, &config).await
        }
        cli::Commands::Data(cmd) => {
            let store = open_store(cli.db, &config).await?;
            commands::data::handle(cmd, &store).await
        }
        cli::Commands::Config(cmd) => commands::config::handle(cmd, &config),
        cli::Commands::Completions { shell } => {
            commands::completions::handle(shell);
            Ok(())
        }
    }
}

/// Open the database (creating it and running migrations) with the configured limits
async fn open_store(db: Option<PathBuf>, config: &Config) -> Result<BlobStore> {
    let storage = Storage::new(db.or_else(|| config.storage.path.clone())).await?;
    let limits = StoreLimits {
        capacity_bytes: config.storage.capacity_bytes,
        policy: config.storage.quota_policy,
    };
    Ok(BlobStore::new(storage, limits))
}
