//! Migrate command - applies pending database migrations and exits

use anyhow::{bail, Context};
use tracing::info;

use crate::config::{AppConfig, StorageBackend};
use crate::infrastructure::logging;
use crate::infrastructure::store::{PgEntityStore, PostgresConfig, PostgresMigrator};

/// Apply all pending migrations against the configured database
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);

    if config.storage.backend != StorageBackend::Postgres {
        bail!("Migrations require the postgres storage backend");
    }

    let url = config
        .storage
        .url
        .as_deref()
        .context("storage.url must be set for the postgres backend")?;

    let pg_config =
        PostgresConfig::new(url).with_max_connections(config.storage.max_connections);
    let store = PgEntityStore::connect(&pg_config).await?;

    let migrator = PostgresMigrator::new(store.pool().clone());
    migrator.run_all().await?;

    let version = migrator.current_version().await?;
    info!(version = ?version, "Migrations applied");

    Ok(())
}
