//! Team domain
//!
//! Teams are the read-only side of the membership relation: this service
//! lists them for selection UIs but never creates, edits, or deletes them.

mod entity;
mod validation;

pub use entity::{Team, TeamId};
pub use validation::{validate_team_name, TeamValidationError, MAX_TEAM_NAME_LENGTH};
