//! Team directory - read-only team lookup
//!
//! Teams have no mutation operations in this service; the directory only
//! feeds selection UIs.

use std::sync::Arc;

use tracing::error;

use crate::domain::store::EntityStore;
use crate::domain::team::{Team, TeamId};
use crate::domain::DomainError;

#[derive(Debug)]
pub struct TeamDirectory {
    store: Arc<dyn EntityStore>,
}

impl TeamDirectory {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// List all teams, sorted by name, relations unresolved
    pub async fn list(&self) -> Result<Vec<Team>, DomainError> {
        self.store
            .list_teams()
            .await
            .inspect_err(|e| error!(error = %e, "Failed to list teams"))
    }

    /// Get one team by id
    pub async fn get(&self, id: i64) -> Result<Team, DomainError> {
        let team_id = TeamId::new(id);

        self.store
            .get_team(team_id)
            .await
            .inspect_err(|e| error!(id = %team_id, error = %e, "Failed to get team"))?
            .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", team_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::store::InMemoryEntityStore;

    fn directory_with_teams(teams: &[(i64, &str)]) -> TeamDirectory {
        let teams = teams
            .iter()
            .map(|(id, name)| Team::new(TeamId::new(*id), *name).unwrap())
            .collect();
        TeamDirectory::new(Arc::new(InMemoryEntityStore::with_teams(teams)))
    }

    #[tokio::test]
    async fn test_list_sorted_by_name() {
        let directory = directory_with_teams(&[(1, "Support"), (2, "Design"), (3, "Platform")]);

        let teams = directory.list().await.unwrap();
        let names: Vec<&str> = teams.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["Design", "Platform", "Support"]);
    }

    #[tokio::test]
    async fn test_list_empty_directory() {
        let directory = directory_with_teams(&[]);
        assert!(directory.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_team() {
        let directory = directory_with_teams(&[(1, "Platform")]);

        let team = directory.get(1).await.unwrap();
        assert_eq!(team.name(), "Platform");
    }

    #[tokio::test]
    async fn test_get_unknown_team_is_not_found() {
        let directory = directory_with_teams(&[]);

        let result = directory.get(42).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}
