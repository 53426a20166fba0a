//! Entity store implementations

mod in_memory;
mod migrations;
mod postgres;

pub use in_memory::InMemoryEntityStore;
pub use migrations::{roster_migrations, Migration, PostgresMigrator};
pub use postgres::{PgEntityStore, PostgresConfig};
