//! Team entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{validate_team_name, TeamValidationError};

/// Team identifier - assigned by the entity store, immutable afterwards
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TeamId(i64);

impl TeamId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for TeamId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team entity
///
/// Teams are referenced by memberships but their lifecycle is independent of
/// them. Create/edit/delete operations on teams are not part of this service;
/// rows are provisioned out of band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    id: TeamId,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Team {
    /// Create a new team after validating the name
    pub fn new(id: TeamId, name: impl Into<String>) -> Result<Self, TeamValidationError> {
        let name = name.into();
        validate_team_name(&name)?;

        let now = Utc::now();

        Ok(Self {
            id,
            name,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrate a team from persisted columns, bypassing validation
    pub fn from_storage(
        id: TeamId,
        name: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> TeamId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_creation() {
        let team = Team::new(TeamId::new(1), "Platform").unwrap();

        assert_eq!(team.id().as_i64(), 1);
        assert_eq!(team.name(), "Platform");
    }

    #[test]
    fn test_team_rejects_empty_name() {
        assert!(Team::new(TeamId::new(1), "").is_err());
    }

    #[test]
    fn test_team_id_display() {
        assert_eq!(TeamId::new(7).to_string(), "7");
    }

    #[test]
    fn test_team_id_ordering() {
        assert!(TeamId::new(1) < TeamId::new(2));
    }
}
