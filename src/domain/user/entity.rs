//! User entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::team::Team;

/// User identifier - assigned by the entity store, immutable afterwards
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated user that has not been persisted yet.
///
/// The entity store assigns the id on insert, so the draft carries only the
/// caller-supplied fields. Field validation happens before construction, in
/// the service layer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    name: String,
    email: String,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

/// User entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user
    id: UserId,
    /// Display name
    name: String,
    /// Contact email address
    email: String,
    /// Optimistic-concurrency token, bumped by the store on every update
    version: i64,
    /// Creation timestamp
    created_at: DateTime<Utc>,
    /// Last update timestamp
    updated_at: DateTime<Utc>,
}

impl User {
    /// Rehydrate a user from persisted columns
    pub fn from_storage(
        id: UserId,
        name: String,
        email: String,
        version: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            version,
            created_at,
            updated_at,
        }
    }

    // Getters

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Mutators

    /// Update the display name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Update the email address
    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }
}

/// A user with its team memberships eagerly resolved.
///
/// Returned by store reads; `teams` is empty when the read was performed
/// with `Resolve::Bare`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserWithTeams {
    pub user: User,
    pub teams: Vec<Team>,
}

impl UserWithTeams {
    pub fn new(user: User, teams: Vec<Team>) -> Self {
        Self { user, teams }
    }

    /// Ids of the teams this user currently belongs to.
    pub fn team_ids(&self) -> std::collections::BTreeSet<crate::domain::team::TeamId> {
        self.teams.iter().map(|t| t.id()).collect()
    }
}
