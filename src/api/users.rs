//! User CRUD endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::user::{User, UserWithTeams};
use crate::infrastructure::user::{CreateUserRequest, EditUserRequest};

use super::teams::TeamResponse;

/// Request to create a new user
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserApiRequest {
    pub name: String,
    pub email: String,
    /// Legacy single-team form field, accepted but never used.
    #[serde(default)]
    pub team_id: Option<i64>,
    #[serde(default)]
    pub selected_team_ids: Option<Vec<i64>>,
}

/// Request to edit a user
#[derive(Debug, Clone, Deserialize)]
pub struct EditUserApiRequest {
    /// Must match the id in the request path.
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub selected_team_ids: Option<Vec<i64>>,
}

/// User response with resolved team memberships
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub teams: Vec<TeamResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&UserWithTeams> for UserResponse {
    fn from(details: &UserWithTeams) -> Self {
        Self {
            id: details.user.id().as_i64(),
            name: details.user.name().to_string(),
            email: details.user.email().to_string(),
            teams: details.teams.iter().map(TeamResponse::from).collect(),
            created_at: details.user.created_at().to_rfc3339(),
            updated_at: details.user.updated_at().to_rfc3339(),
        }
    }
}

/// Response for a freshly created user
#[derive(Debug, Clone, Serialize)]
pub struct CreatedUserResponse {
    pub id: i64,
}

impl From<&User> for CreatedUserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().as_i64(),
        }
    }
}

/// List users response
#[derive(Debug, Clone, Serialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserResponse>,
    pub total: usize,
}

/// GET /users
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<ListUsersResponse>, ApiError> {
    debug!("Listing all users");

    let users = state.user_service.list().await.map_err(ApiError::from)?;

    let user_responses: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();
    let total = user_responses.len();

    Ok(Json(ListUsersResponse {
        users: user_responses,
        total,
    }))
}

/// GET /users/{user_id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!(id = user_id, "Getting user details");

    let details = state
        .user_service
        .get_details(user_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(UserResponse::from(&details)))
}

/// POST /users
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserApiRequest>,
) -> Result<(StatusCode, Json<CreatedUserResponse>), ApiError> {
    debug!(name = %request.name, "Creating user");

    let user = state
        .user_service
        .create(CreateUserRequest {
            name: request.name,
            email: request.email,
            selected_team_ids: request.selected_team_ids,
        })
        .await
        .map_err(ApiError::from)?;

    Ok((StatusCode::CREATED, Json(CreatedUserResponse::from(&user))))
}

/// PUT /users/{user_id}
pub async fn edit_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(request): Json<EditUserApiRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!(id = user_id, "Editing user");

    let details = state
        .user_service
        .edit(
            user_id,
            EditUserRequest {
                id: request.id,
                name: request.name,
                email: request.email,
                selected_team_ids: request.selected_team_ids,
            },
        )
        .await
        .map_err(ApiError::from)?;

    Ok(Json(UserResponse::from(&details)))
}

/// DELETE /users/{user_id}
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    debug!(id = user_id, "Deleting user");

    state
        .user_service
        .delete(user_id)
        .await
        .map_err(ApiError::from)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::team::{Team, TeamId};
    use crate::domain::user::UserId;
    use chrono::Utc;

    fn sample_details() -> UserWithTeams {
        let now = Utc::now();
        let user = User::from_storage(
            UserId::new(1),
            "Alice".to_string(),
            "a@x.com".to_string(),
            1,
            now,
            now,
        );
        let teams = vec![Team::new(TeamId::new(2), "Design").unwrap()];
        UserWithTeams::new(user, teams)
    }

    #[test]
    fn test_user_response_from_details() {
        let response = UserResponse::from(&sample_details());

        assert_eq!(response.id, 1);
        assert_eq!(response.name, "Alice");
        assert_eq!(response.teams.len(), 1);
        assert_eq!(response.teams[0].name, "Design");
    }

    #[test]
    fn test_create_request_accepts_legacy_team_id_field() {
        let request: CreateUserApiRequest = serde_json::from_str(
            r#"{"name":"Alice","email":"a@x.com","team_id":7,"selected_team_ids":[1,2]}"#,
        )
        .unwrap();

        assert_eq!(request.team_id, Some(7));
        assert_eq!(request.selected_team_ids, Some(vec![1, 2]));
    }

    #[test]
    fn test_create_request_selection_defaults_to_none() {
        let request: CreateUserApiRequest =
            serde_json::from_str(r#"{"name":"Alice","email":"a@x.com"}"#).unwrap();

        assert!(request.team_id.is_none());
        assert!(request.selected_team_ids.is_none());
    }
}
