//! Entity store trait

use std::collections::BTreeSet;
use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::membership::MembershipDelta;
use crate::domain::team::{Team, TeamId};
use crate::domain::user::{NewUser, User, UserId, UserWithTeams};
use crate::domain::DomainError;

/// How much of a user's relations a read should resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolve {
    /// The user record only; `teams` comes back empty.
    Bare,
    /// Membership rows and their teams, loaded eagerly.
    Teams,
}

/// Durable storage for users, teams, and memberships.
///
/// Implementations enforce the schema invariants at write time: at most one
/// membership per `(user, team)` pair, both membership references pointing
/// at existing rows, and cascade of memberships when their user is deleted.
/// Every mutation is a single atomic unit of work.
#[async_trait]
pub trait EntityStore: Send + Sync + Debug {
    /// Get a user by id.
    async fn get_user(
        &self,
        id: UserId,
        resolve: Resolve,
    ) -> Result<Option<UserWithTeams>, DomainError>;

    /// List all users, ordered by id.
    async fn list_users(&self, resolve: Resolve) -> Result<Vec<UserWithTeams>, DomainError>;

    /// Get a team by id.
    async fn get_team(&self, id: TeamId) -> Result<Option<Team>, DomainError>;

    /// List all teams, ordered by name.
    async fn list_teams(&self) -> Result<Vec<Team>, DomainError>;

    /// Insert a user together with one membership per selected team.
    ///
    /// Assigns the id. A selected team that does not exist fails the whole
    /// write with a validation error.
    async fn insert_user(
        &self,
        new_user: NewUser,
        team_ids: &BTreeSet<TeamId>,
    ) -> Result<User, DomainError>;

    /// Update a user's fields and apply a membership delta atomically.
    ///
    /// The carried `version` must match the stored one; a mismatch (or a row
    /// that disappeared under a Postgres backend) fails with a conflict and
    /// leaves the record untouched.
    async fn update_user(
        &self,
        user: User,
        delta: &MembershipDelta,
    ) -> Result<User, DomainError>;

    /// Delete a user, cascading its memberships. Returns `false` when the
    /// user does not exist.
    async fn delete_user(&self, id: UserId) -> Result<bool, DomainError>;

    /// Check whether a user id exists.
    async fn user_exists(&self, id: UserId) -> Result<bool, DomainError> {
        Ok(self.get_user(id, Resolve::Bare).await?.is_some())
    }
}
