//! PostgreSQL entity store with connection pooling

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use crate::domain::membership::MembershipDelta;
use crate::domain::store::{EntityStore, Resolve};
use crate::domain::team::{Team, TeamId};
use crate::domain::user::{NewUser, User, UserId, UserWithTeams};
use crate::domain::DomainError;

// Postgres SQLSTATE codes surfaced as domain errors.
const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL storage configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/team_roster".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}

/// PostgreSQL implementation of [`EntityStore`]
///
/// Relational schema: `users`, `teams`, and `user_teams` with a composite
/// primary key and both foreign keys, so the uniqueness and referential
/// integrity invariants hold at the schema level. Multi-row writes run in a
/// transaction; the `version` column carries the optimistic-concurrency
/// check.
#[derive(Debug)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with pooling per the configuration
    pub async fn connect(config: &PostgresConfig) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(std::time::Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))?;

        Ok(Self::new(pool))
    }

    /// Returns a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn user_from_row(row: &PgRow) -> User {
    let id: i64 = row.get("user_id");
    let name: String = row.get("name");
    let email: String = row.get("email");
    let version: i64 = row.get("version");
    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    User::from_storage(UserId::new(id), name, email, version, created_at, updated_at)
}

fn team_from_row(row: &PgRow) -> Team {
    let id: i64 = row.get("team_id");
    let name: String = row.get("name");
    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    Team::from_storage(TeamId::new(id), name, created_at, updated_at)
}

/// Translate a constraint violation into the domain taxonomy; everything
/// else is a storage failure.
///
/// Both constraints in the schema live on `user_teams`, so a violation
/// always means a bad team selection: 23503 a selected team that does not
/// exist, 23505 a membership pair that already does. The in-memory store
/// reports the same states as validation errors.
fn map_db_error(context: &str, e: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(ref db_err) = e {
        match db_err.code().as_deref() {
            Some(FOREIGN_KEY_VIOLATION) => {
                return DomainError::field_validation(
                    "selected_team_ids",
                    "Selected team does not exist",
                );
            }
            Some(UNIQUE_VIOLATION) => {
                return DomainError::field_validation(
                    "selected_team_ids",
                    "User is already a member of the selected team",
                );
            }
            _ => {}
        }
    }

    DomainError::storage(format!("{}: {}", context, e))
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn get_user(
        &self,
        id: UserId,
        resolve: Resolve,
    ) -> Result<Option<UserWithTeams>, DomainError> {
        let row = sqlx::query(
            "SELECT user_id, name, email, version, created_at, updated_at \
             FROM users WHERE user_id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to get user", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let user = user_from_row(&row);

        let teams = match resolve {
            Resolve::Bare => Vec::new(),
            Resolve::Teams => {
                let rows = sqlx::query(
                    "SELECT t.team_id, t.name, t.created_at, t.updated_at \
                     FROM user_teams ut \
                     JOIN teams t ON t.team_id = ut.team_id \
                     WHERE ut.user_id = $1 \
                     ORDER BY t.team_id",
                )
                .bind(id.as_i64())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_db_error("Failed to get user memberships", e))?;

                rows.iter().map(team_from_row).collect()
            }
        };

        Ok(Some(UserWithTeams::new(user, teams)))
    }

    async fn list_users(&self, resolve: Resolve) -> Result<Vec<UserWithTeams>, DomainError> {
        let rows = sqlx::query(
            "SELECT user_id, name, email, version, created_at, updated_at \
             FROM users ORDER BY user_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to list users", e))?;

        let users: Vec<User> = rows.iter().map(user_from_row).collect();

        let mut teams_by_user: HashMap<i64, Vec<Team>> = HashMap::new();

        if resolve == Resolve::Teams && !users.is_empty() {
            let rows = sqlx::query(
                "SELECT ut.user_id, t.team_id, t.name, t.created_at, t.updated_at \
                 FROM user_teams ut \
                 JOIN teams t ON t.team_id = ut.team_id \
                 ORDER BY ut.user_id, t.team_id",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to list memberships", e))?;

            for row in &rows {
                let user_id: i64 = row.get("user_id");
                teams_by_user.entry(user_id).or_default().push(team_from_row(row));
            }
        }

        Ok(users
            .into_iter()
            .map(|user| {
                let teams = teams_by_user.remove(&user.id().as_i64()).unwrap_or_default();
                UserWithTeams::new(user, teams)
            })
            .collect())
    }

    async fn get_team(&self, id: TeamId) -> Result<Option<Team>, DomainError> {
        let row = sqlx::query(
            "SELECT team_id, name, created_at, updated_at FROM teams WHERE team_id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to get team", e))?;

        Ok(row.as_ref().map(team_from_row))
    }

    async fn list_teams(&self) -> Result<Vec<Team>, DomainError> {
        let rows = sqlx::query(
            "SELECT team_id, name, created_at, updated_at FROM teams ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to list teams", e))?;

        Ok(rows.iter().map(team_from_row).collect())
    }

    async fn insert_user(
        &self,
        new_user: NewUser,
        team_ids: &BTreeSet<TeamId>,
    ) -> Result<User, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("Failed to begin transaction", e))?;

        let row = sqlx::query(
            "INSERT INTO users (name, email) VALUES ($1, $2) \
             RETURNING user_id, name, email, version, created_at, updated_at",
        )
        .bind(new_user.name())
        .bind(new_user.email())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_db_error("Failed to insert user", e))?;

        let user = user_from_row(&row);

        for team_id in team_ids {
            sqlx::query("INSERT INTO user_teams (user_id, team_id) VALUES ($1, $2)")
                .bind(user.id().as_i64())
                .bind(team_id.as_i64())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_db_error("Failed to insert membership", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit transaction", e))?;

        Ok(user)
    }

    async fn update_user(
        &self,
        user: User,
        delta: &MembershipDelta,
    ) -> Result<User, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("Failed to begin transaction", e))?;

        let row = sqlx::query(
            "UPDATE users \
             SET name = $1, email = $2, version = version + 1, updated_at = NOW() \
             WHERE user_id = $3 AND version = $4 \
             RETURNING user_id, name, email, version, created_at, updated_at",
        )
        .bind(user.name())
        .bind(user.email())
        .bind(user.id().as_i64())
        .bind(user.version())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_db_error("Failed to update user", e))?;

        // Zero rows means either a stale version or a row that disappeared;
        // the service disambiguates by re-checking existence.
        let Some(row) = row else {
            return Err(DomainError::conflict(format!(
                "User '{}' was modified concurrently",
                user.id()
            )));
        };
        let updated = user_from_row(&row);

        if !delta.to_remove.is_empty() {
            let remove_ids: Vec<i64> = delta.to_remove.iter().map(TeamId::as_i64).collect();

            sqlx::query("DELETE FROM user_teams WHERE user_id = $1 AND team_id = ANY($2)")
                .bind(user.id().as_i64())
                .bind(&remove_ids)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_db_error("Failed to remove memberships", e))?;
        }

        for team_id in &delta.to_add {
            sqlx::query("INSERT INTO user_teams (user_id, team_id) VALUES ($1, $2)")
                .bind(user.id().as_i64())
                .bind(team_id.as_i64())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_db_error("Failed to insert membership", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit transaction", e))?;

        Ok(updated)
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, DomainError> {
        // user_teams rows go with the user via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to delete user", e))?;

        Ok(result.rows_affected() > 0)
    }
}
