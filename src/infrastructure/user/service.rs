//! User service - CRUD orchestration with membership reconciliation

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::membership::{reconcile, MembershipDelta};
use crate::domain::store::{EntityStore, Resolve};
use crate::domain::team::{Team, TeamId};
use crate::domain::user::{validate_user_fields, NewUser, User, UserId, UserWithTeams};
use crate::domain::DomainError;

/// Request for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    /// Teams the user should belong to; `None` means no selection was made.
    pub selected_team_ids: Option<Vec<i64>>,
}

/// Request for editing an existing user
#[derive(Debug, Clone)]
pub struct EditUserRequest {
    /// Must match the id addressed by the caller (path parameter).
    pub id: i64,
    pub name: String,
    pub email: String,
    /// New team selection; `None` clears every membership.
    pub selected_team_ids: Option<Vec<i64>>,
}

/// User service for managing users and their team memberships
#[derive(Debug)]
pub struct UserService {
    store: Arc<dyn EntityStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// List all users with memberships and team names resolved
    pub async fn list(&self) -> Result<Vec<UserWithTeams>, DomainError> {
        self.store
            .list_users(Resolve::Teams)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to list users"))
    }

    /// Get one user with memberships resolved
    pub async fn get_details(&self, id: i64) -> Result<UserWithTeams, DomainError> {
        let user_id = UserId::new(id);

        self.store
            .get_user(user_id, Resolve::Teams)
            .await
            .inspect_err(|e| error!(id = %user_id, error = %e, "Failed to get user details"))?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", user_id)))
    }

    /// Create a user together with one membership per selected team
    pub async fn create(&self, request: CreateUserRequest) -> Result<User, DomainError> {
        info!(name = %request.name, "Creating user");

        if let Err(errors) = validate_user_fields(&request.name, &request.email) {
            warn!(errors = %errors, "Validation errors occurred while creating a user");
            return Err(DomainError::validation(errors));
        }

        let selected = to_team_id_set(request.selected_team_ids.as_deref());

        if selected.as_ref().is_none_or(BTreeSet::is_empty) {
            warn!(name = %request.name, "No teams selected for the user");
        }

        // Creation is reconciliation against an empty existing set.
        let delta = reconcile(&BTreeSet::new(), selected.as_ref());

        let user = self
            .store
            .insert_user(NewUser::new(request.name, request.email), &delta.to_add)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to create user"))?;

        info!(id = %user.id(), "User created successfully");
        Ok(user)
    }

    /// Edit a user's fields and reconcile its memberships
    pub async fn edit(
        &self,
        id: i64,
        request: EditUserRequest,
    ) -> Result<UserWithTeams, DomainError> {
        info!(id = id, "Updating user");

        if id != request.id {
            return Err(DomainError::not_found(format!(
                "User '{}' not found: request body addresses user '{}'",
                id, request.id
            )));
        }

        if let Err(errors) = validate_user_fields(&request.name, &request.email) {
            warn!(id = id, errors = %errors, "Validation errors occurred while editing a user");
            return Err(DomainError::validation(errors));
        }

        let user_id = UserId::new(id);

        let current = self
            .store
            .get_user(user_id, Resolve::Teams)
            .await
            .inspect_err(|e| error!(id = %user_id, error = %e, "Failed to load user for edit"))?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", user_id)))?;

        let existing = current.team_ids();
        let selected = to_team_id_set(request.selected_team_ids.as_deref());
        let delta = reconcile(&existing, selected.as_ref());

        let UserWithTeams { mut user, teams } = current;
        user.set_name(request.name);
        user.set_email(request.email);

        match self.store.update_user(user, &delta).await {
            Ok(updated) => {
                // Answer from the committed write; a fresh read here could
                // race a concurrent delete.
                let teams = self.apply_delta_to_teams(teams, &delta).await?;
                info!(id = %updated.id(), "User updated successfully");
                Ok(UserWithTeams::new(updated, teams))
            }
            Err(e) if e.is_conflict() => {
                // The row changed (or vanished) between our read and write.
                warn!(id = %user_id, "Concurrent modification detected, re-checking existence");

                if self.store.user_exists(user_id).await? {
                    Err(e)
                } else {
                    Err(DomainError::not_found(format!(
                        "User '{}' not found",
                        user_id
                    )))
                }
            }
            Err(e) => {
                error!(id = %user_id, error = %e, "Failed to update user");
                Err(e)
            }
        }
    }

    /// Delete a user, cascading its memberships
    pub async fn delete(&self, id: i64) -> Result<(), DomainError> {
        info!(id = id, "Deleting user");

        let user_id = UserId::new(id);

        let deleted = self
            .store
            .delete_user(user_id)
            .await
            .inspect_err(|e| error!(id = %user_id, error = %e, "Failed to delete user"))?;

        if !deleted {
            return Err(DomainError::not_found(format!(
                "User '{}' not found",
                user_id
            )));
        }

        info!(id = %user_id, "User deleted successfully");
        Ok(())
    }

    /// Resolve the post-edit team list from the pre-edit one and the applied
    /// delta. Team rows are read-only in this service, so the lookups cannot
    /// disagree with the committed memberships.
    async fn apply_delta_to_teams(
        &self,
        teams: Vec<Team>,
        delta: &MembershipDelta,
    ) -> Result<Vec<Team>, DomainError> {
        let mut teams: Vec<Team> = teams
            .into_iter()
            .filter(|team| !delta.to_remove.contains(&team.id()))
            .collect();

        for team_id in &delta.to_add {
            if let Some(team) = self.store.get_team(*team_id).await? {
                teams.push(team);
            }
        }

        teams.sort_by_key(Team::id);
        Ok(teams)
    }
}

fn to_team_id_set(ids: Option<&[i64]>) -> Option<BTreeSet<TeamId>> {
    ids.map(|ids| ids.iter().copied().map(TeamId::new).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::store::InMemoryEntityStore;
    use async_trait::async_trait;

    fn service_with_teams(teams: &[(i64, &str)]) -> UserService {
        let teams = teams
            .iter()
            .map(|(id, name)| Team::new(TeamId::new(*id), *name).unwrap())
            .collect();
        UserService::new(Arc::new(InMemoryEntityStore::with_teams(teams)))
    }

    fn create_request(name: &str, email: &str, teams: Option<Vec<i64>>) -> CreateUserRequest {
        CreateUserRequest {
            name: name.to_string(),
            email: email.to_string(),
            selected_team_ids: teams,
        }
    }

    fn edit_request(id: i64, name: &str, email: &str, teams: Option<Vec<i64>>) -> EditUserRequest {
        EditUserRequest {
            id,
            name: name.to_string(),
            email: email.to_string(),
            selected_team_ids: teams,
        }
    }

    fn team_id_set(ids: &[i64]) -> BTreeSet<TeamId> {
        ids.iter().copied().map(TeamId::new).collect()
    }

    #[tokio::test]
    async fn test_create_user_with_selected_teams() {
        let service = service_with_teams(&[(1, "Platform"), (2, "Design")]);

        let user = service
            .create(create_request("Alice", "a@x.com", Some(vec![1, 2])))
            .await
            .unwrap();

        let details = service.get_details(user.id().as_i64()).await.unwrap();
        assert_eq!(details.user.name(), "Alice");
        assert_eq!(details.team_ids(), team_id_set(&[1, 2]));
    }

    #[tokio::test]
    async fn test_create_user_without_teams() {
        let service = service_with_teams(&[]);

        let user = service
            .create(create_request("Bob", "b@x.com", None))
            .await
            .unwrap();

        let details = service.get_details(user.id().as_i64()).await.unwrap();
        assert!(details.teams.is_empty());
    }

    #[tokio::test]
    async fn test_create_user_empty_name_fails_validation() {
        let service = service_with_teams(&[]);

        let result = service.create(create_request("", "a@x.com", None)).await;

        match result {
            Err(DomainError::Validation { errors }) => {
                assert!(errors.field("name").is_some());
                assert!(errors.field("email").is_none());
            }
            other => panic!("expected validation error, got {:?}", other.map(|u| u.id())),
        }
    }

    #[tokio::test]
    async fn test_create_user_invalid_email_fails_validation() {
        let service = service_with_teams(&[]);

        let result = service
            .create(create_request("Alice", "not-an-email", None))
            .await;

        match result {
            Err(DomainError::Validation { errors }) => {
                assert!(errors.field("email").is_some());
            }
            other => panic!("expected validation error, got {:?}", other.map(|u| u.id())),
        }
    }

    #[tokio::test]
    async fn test_create_user_collects_all_field_errors() {
        let service = service_with_teams(&[]);

        let result = service.create(create_request("", "not-an-email", None)).await;

        match result {
            Err(DomainError::Validation { errors }) => {
                assert!(errors.field("name").is_some());
                assert!(errors.field("email").is_some());
            }
            other => panic!("expected validation error, got {:?}", other.map(|u| u.id())),
        }
    }

    #[tokio::test]
    async fn test_get_details_unknown_user_is_not_found() {
        let service = service_with_teams(&[]);

        let result = service.get_details(42).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_edit_reconciles_memberships() {
        let service = service_with_teams(&[(1, "Platform"), (2, "Design"), (3, "Support")]);

        let user = service
            .create(create_request("Alice", "a@x.com", Some(vec![1, 2])))
            .await
            .unwrap();
        let id = user.id().as_i64();

        let details = service
            .edit(id, edit_request(id, "Alice", "a@x.com", Some(vec![2, 3])))
            .await
            .unwrap();

        // 1 removed, 3 added, 2 untouched
        assert_eq!(details.team_ids(), team_id_set(&[2, 3]));
    }

    #[tokio::test]
    async fn test_edit_with_null_selection_clears_memberships() {
        let service = service_with_teams(&[(1, "Platform"), (2, "Design")]);

        let user = service
            .create(create_request("Alice", "a@x.com", Some(vec![1, 2])))
            .await
            .unwrap();
        let id = user.id().as_i64();

        let details = service
            .edit(id, edit_request(id, "Alice", "a@x.com", None))
            .await
            .unwrap();

        assert!(details.teams.is_empty());
    }

    #[tokio::test]
    async fn test_edit_updates_fields() {
        let service = service_with_teams(&[]);

        let user = service
            .create(create_request("Alice", "a@x.com", None))
            .await
            .unwrap();
        let id = user.id().as_i64();

        let details = service
            .edit(id, edit_request(id, "Alicia", "alicia@x.com", None))
            .await
            .unwrap();

        assert_eq!(details.user.name(), "Alicia");
        assert_eq!(details.user.email(), "alicia@x.com");
    }

    #[tokio::test]
    async fn test_edit_id_mismatch_is_not_found() {
        let service = service_with_teams(&[]);

        let user = service
            .create(create_request("Alice", "a@x.com", None))
            .await
            .unwrap();
        let id = user.id().as_i64();

        let result = service
            .edit(id, edit_request(id + 1, "Alice", "a@x.com", None))
            .await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_edit_unknown_user_is_not_found() {
        let service = service_with_teams(&[]);

        let result = service
            .edit(42, edit_request(42, "Alice", "a@x.com", None))
            .await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_edit_rejects_invalid_fields() {
        let service = service_with_teams(&[]);

        let user = service
            .create(create_request("Alice", "a@x.com", None))
            .await
            .unwrap();
        let id = user.id().as_i64();

        let result = service.edit(id, edit_request(id, "", "bad", None)).await;

        match result {
            Err(DomainError::Validation { errors }) => {
                assert!(errors.field("name").is_some());
                assert!(errors.field("email").is_some());
            }
            other => panic!("expected validation error, got {:?}", other.is_ok()),
        }
    }

    #[tokio::test]
    async fn test_delete_removes_user_and_memberships() {
        let service = service_with_teams(&[(1, "Platform")]);

        let user = service
            .create(create_request("Alice", "a@x.com", Some(vec![1])))
            .await
            .unwrap();
        let id = user.id().as_i64();

        service.delete(id).await.unwrap();

        assert!(matches!(
            service.get_details(id).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_unknown_user_is_not_found() {
        let service = service_with_teams(&[]);

        let result = service.delete(42).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_resolves_teams() {
        let service = service_with_teams(&[(1, "Platform")]);

        service
            .create(create_request("Alice", "a@x.com", Some(vec![1])))
            .await
            .unwrap();
        service
            .create(create_request("Bob", "b@x.com", None))
            .await
            .unwrap();

        let users = service.list().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].teams.len(), 1);
        assert!(users[1].teams.is_empty());
    }

    /// Store double that fails `update_user` with a conflict, optionally
    /// deleting the row first so the existence re-check sees it gone.
    #[derive(Debug)]
    struct ConflictingStore {
        inner: InMemoryEntityStore,
        delete_before_conflict: bool,
    }

    #[async_trait]
    impl EntityStore for ConflictingStore {
        async fn get_user(
            &self,
            id: UserId,
            resolve: Resolve,
        ) -> Result<Option<UserWithTeams>, DomainError> {
            self.inner.get_user(id, resolve).await
        }

        async fn list_users(&self, resolve: Resolve) -> Result<Vec<UserWithTeams>, DomainError> {
            self.inner.list_users(resolve).await
        }

        async fn get_team(&self, id: TeamId) -> Result<Option<Team>, DomainError> {
            self.inner.get_team(id).await
        }

        async fn list_teams(&self) -> Result<Vec<Team>, DomainError> {
            self.inner.list_teams().await
        }

        async fn insert_user(
            &self,
            new_user: NewUser,
            team_ids: &BTreeSet<TeamId>,
        ) -> Result<User, DomainError> {
            self.inner.insert_user(new_user, team_ids).await
        }

        async fn update_user(
            &self,
            user: User,
            _delta: &MembershipDelta,
        ) -> Result<User, DomainError> {
            if self.delete_before_conflict {
                self.inner.delete_user(user.id()).await?;
            }

            Err(DomainError::conflict(format!(
                "User '{}' was modified concurrently",
                user.id()
            )))
        }

        async fn delete_user(&self, id: UserId) -> Result<bool, DomainError> {
            self.inner.delete_user(id).await
        }
    }

    /// Store double whose `update_user` commits and then drops the row, as a
    /// concurrent delete landing right after the write would.
    #[derive(Debug)]
    struct DeleteAfterUpdateStore {
        inner: InMemoryEntityStore,
    }

    #[async_trait]
    impl EntityStore for DeleteAfterUpdateStore {
        async fn get_user(
            &self,
            id: UserId,
            resolve: Resolve,
        ) -> Result<Option<UserWithTeams>, DomainError> {
            self.inner.get_user(id, resolve).await
        }

        async fn list_users(&self, resolve: Resolve) -> Result<Vec<UserWithTeams>, DomainError> {
            self.inner.list_users(resolve).await
        }

        async fn get_team(&self, id: TeamId) -> Result<Option<Team>, DomainError> {
            self.inner.get_team(id).await
        }

        async fn list_teams(&self) -> Result<Vec<Team>, DomainError> {
            self.inner.list_teams().await
        }

        async fn insert_user(
            &self,
            new_user: NewUser,
            team_ids: &BTreeSet<TeamId>,
        ) -> Result<User, DomainError> {
            self.inner.insert_user(new_user, team_ids).await
        }

        async fn update_user(
            &self,
            user: User,
            delta: &MembershipDelta,
        ) -> Result<User, DomainError> {
            let updated = self.inner.update_user(user, delta).await?;
            self.inner.delete_user(updated.id()).await?;
            Ok(updated)
        }

        async fn delete_user(&self, id: UserId) -> Result<bool, DomainError> {
            self.inner.delete_user(id).await
        }
    }

    #[tokio::test]
    async fn test_edit_response_reflects_write_despite_concurrent_delete() {
        let teams = vec![
            Team::new(TeamId::new(1), "Platform").unwrap(),
            Team::new(TeamId::new(2), "Design").unwrap(),
        ];
        let store = DeleteAfterUpdateStore {
            inner: InMemoryEntityStore::with_teams(teams),
        };
        let service = UserService::new(Arc::new(store));

        let user = service
            .create(create_request("Alice", "a@x.com", Some(vec![1])))
            .await
            .unwrap();
        let id = user.id().as_i64();

        let details = service
            .edit(id, edit_request(id, "Alicia", "a@x.com", Some(vec![1, 2])))
            .await
            .unwrap();

        // The edit committed, so its outcome is what the caller sees
        assert_eq!(details.user.name(), "Alicia");
        assert_eq!(details.team_ids(), team_id_set(&[1, 2]));
    }

    #[tokio::test]
    async fn test_edit_conflict_with_surviving_user_propagates() {
        let store = ConflictingStore {
            inner: InMemoryEntityStore::new(),
            delete_before_conflict: false,
        };
        let service = UserService::new(Arc::new(store));

        let user = service
            .create(create_request("Alice", "a@x.com", None))
            .await
            .unwrap();
        let id = user.id().as_i64();

        let result = service
            .edit(id, edit_request(id, "Alicia", "a@x.com", None))
            .await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_edit_conflict_with_deleted_user_is_not_found() {
        let store = ConflictingStore {
            inner: InMemoryEntityStore::new(),
            delete_before_conflict: true,
        };
        let service = UserService::new(Arc::new(store));

        let user = service
            .create(create_request("Alice", "a@x.com", None))
            .await
            .unwrap();
        let id = user.id().as_i64();

        let result = service
            .edit(id, edit_request(id, "Alicia", "a@x.com", None))
            .await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}
