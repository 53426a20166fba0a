//! Application state for shared services

use std::sync::Arc;

use crate::infrastructure::team::TeamDirectory;
use crate::infrastructure::user::UserService;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub team_directory: Arc<TeamDirectory>,
}

impl AppState {
    pub fn new(user_service: Arc<UserService>, team_directory: Arc<TeamDirectory>) -> Self {
        Self {
            user_service,
            team_directory,
        }
    }
}
