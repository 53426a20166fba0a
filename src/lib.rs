//! Team Roster
//!
//! A user and team membership management service:
//! - User CRUD with exhaustive field validation
//! - Many-to-many team membership reconciled against explicit selections
//! - Optimistic concurrency on user edits
//! - Pluggable entity store (in-memory or PostgreSQL)

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::info;

use api::state::AppState;
use config::StorageBackend;
use domain::store::EntityStore;
use domain::team::{Team, TeamId};
use infrastructure::store::{
    InMemoryEntityStore, PgEntityStore, PostgresConfig, PostgresMigrator,
};
use infrastructure::team::TeamDirectory;
use infrastructure::user::UserService;

/// Create the application state with all services initialized
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn EntityStore> = match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory entity store");
            Arc::new(create_memory_store(&config.storage.seed_teams)?)
        }
        StorageBackend::Postgres => {
            let url = config
                .storage
                .url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("storage.url is required for the postgres backend"))?;

            info!("Connecting to PostgreSQL...");
            let pg_config =
                PostgresConfig::new(url).with_max_connections(config.storage.max_connections);
            let store = PgEntityStore::connect(&pg_config).await?;

            PostgresMigrator::new(store.pool().clone()).run_all().await?;
            info!("PostgreSQL connection established, migrations applied");

            Arc::new(store)
        }
    };

    let user_service = Arc::new(UserService::new(store.clone()));
    let team_directory = Arc::new(TeamDirectory::new(store));

    Ok(AppState::new(user_service, team_directory))
}

fn create_memory_store(seed_teams: &[String]) -> anyhow::Result<InMemoryEntityStore> {
    let teams = seed_teams
        .iter()
        .enumerate()
        .map(|(i, name)| Team::new(TeamId::new(i as i64 + 1), name.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    if !teams.is_empty() {
        info!(count = teams.len(), "Seeded teams into memory store");
    }

    Ok(InMemoryEntityStore::with_teams(teams))
}
