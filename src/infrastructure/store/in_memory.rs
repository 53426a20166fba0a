//! In-memory entity store
//!
//! Useful for testing and development. Data is lost when the process
//! terminates. A single write lock scope per mutation gives the same
//! all-or-nothing semantics the Postgres backend gets from transactions.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::membership::{Membership, MembershipDelta};
use crate::domain::store::{EntityStore, Resolve};
use crate::domain::team::{Team, TeamId};
use crate::domain::user::{NewUser, User, UserId, UserWithTeams};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct Inner {
    users: BTreeMap<i64, User>,
    teams: BTreeMap<i64, Team>,
    memberships: BTreeSet<Membership>,
    next_user_id: i64,
}

/// Thread-safe in-memory implementation of [`EntityStore`]
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    inner: RwLock<Inner>,
}

impl InMemoryEntityStore {
    /// Creates a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with teams
    pub fn with_teams(teams: Vec<Team>) -> Self {
        let mut inner = Inner::default();
        for team in teams {
            inner.teams.insert(team.id().as_i64(), team);
        }

        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Add a team to the store.
    ///
    /// Team management is not a service operation; this exists for seeding
    /// and tests.
    pub fn add_team(&self, team: Team) -> Result<(), DomainError> {
        let mut inner = self.write()?;
        let id = team.id().as_i64();

        if inner.teams.contains_key(&id) {
            return Err(DomainError::conflict(format!("Team '{}' already exists", id)));
        }

        inner.teams.insert(id, team);
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, DomainError> {
        self.inner
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, DomainError> {
        self.inner
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))
    }
}

fn resolve_teams(inner: &Inner, user_id: UserId, resolve: Resolve) -> Vec<Team> {
    match resolve {
        Resolve::Bare => Vec::new(),
        Resolve::Teams => {
            let mut teams: Vec<Team> = inner
                .memberships
                .iter()
                .filter(|m| m.user_id == user_id)
                .filter_map(|m| inner.teams.get(&m.team_id.as_i64()).cloned())
                .collect();

            teams.sort_by_key(|t| t.id());
            teams
        }
    }
}

fn check_teams_exist(inner: &Inner, team_ids: &BTreeSet<TeamId>) -> Result<(), DomainError> {
    for team_id in team_ids {
        if !inner.teams.contains_key(&team_id.as_i64()) {
            return Err(DomainError::field_validation(
                "selected_team_ids",
                format!("Team '{}' does not exist", team_id),
            ));
        }
    }
    Ok(())
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn get_user(
        &self,
        id: UserId,
        resolve: Resolve,
    ) -> Result<Option<UserWithTeams>, DomainError> {
        let inner = self.read()?;

        Ok(inner.users.get(&id.as_i64()).cloned().map(|user| {
            let teams = resolve_teams(&inner, id, resolve);
            UserWithTeams::new(user, teams)
        }))
    }

    async fn list_users(&self, resolve: Resolve) -> Result<Vec<UserWithTeams>, DomainError> {
        let inner = self.read()?;

        Ok(inner
            .users
            .values()
            .map(|user| {
                let teams = resolve_teams(&inner, user.id(), resolve);
                UserWithTeams::new(user.clone(), teams)
            })
            .collect())
    }

    async fn get_team(&self, id: TeamId) -> Result<Option<Team>, DomainError> {
        let inner = self.read()?;
        Ok(inner.teams.get(&id.as_i64()).cloned())
    }

    async fn list_teams(&self) -> Result<Vec<Team>, DomainError> {
        let inner = self.read()?;

        let mut teams: Vec<Team> = inner.teams.values().cloned().collect();
        teams.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(teams)
    }

    async fn insert_user(
        &self,
        new_user: NewUser,
        team_ids: &BTreeSet<TeamId>,
    ) -> Result<User, DomainError> {
        let mut inner = self.write()?;

        check_teams_exist(&inner, team_ids)?;

        inner.next_user_id += 1;
        let id = UserId::new(inner.next_user_id);
        let now = chrono::Utc::now();

        let user = User::from_storage(
            id,
            new_user.name().to_string(),
            new_user.email().to_string(),
            1,
            now,
            now,
        );

        inner.users.insert(id.as_i64(), user.clone());

        for team_id in team_ids {
            inner.memberships.insert(Membership::new(id, *team_id));
        }

        Ok(user)
    }

    async fn update_user(
        &self,
        user: User,
        delta: &MembershipDelta,
    ) -> Result<User, DomainError> {
        let mut inner = self.write()?;
        let id = user.id();

        let stored_version = match inner.users.get(&id.as_i64()) {
            Some(stored) => stored.version(),
            None => {
                return Err(DomainError::not_found(format!("User '{}' not found", id)));
            }
        };

        if stored_version != user.version() {
            return Err(DomainError::conflict(format!(
                "User '{}' was modified concurrently",
                id
            )));
        }

        check_teams_exist(&inner, &delta.to_add)?;

        for team_id in &delta.to_add {
            let membership = Membership::new(id, *team_id);
            if inner.memberships.contains(&membership) {
                return Err(DomainError::field_validation(
                    "selected_team_ids",
                    format!("User '{}' is already a member of team '{}'", id, team_id),
                ));
            }
        }

        for team_id in &delta.to_remove {
            inner.memberships.remove(&Membership::new(id, *team_id));
        }

        for team_id in &delta.to_add {
            inner.memberships.insert(Membership::new(id, *team_id));
        }

        let updated = User::from_storage(
            id,
            user.name().to_string(),
            user.email().to_string(),
            stored_version + 1,
            user.created_at(),
            chrono::Utc::now(),
        );

        inner.users.insert(id.as_i64(), updated.clone());
        Ok(updated)
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, DomainError> {
        let mut inner = self.write()?;

        let existed = inner.users.remove(&id.as_i64()).is_some();

        if existed {
            inner.memberships.retain(|m| m.user_id != id);
        }

        Ok(existed)
    }
}
