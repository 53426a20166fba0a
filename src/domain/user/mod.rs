//! User domain
//!
//! This module provides the user entity, the unpersisted draft type, the
//! eagerly-resolved read model, and form-field validation.

mod entity;
mod validation;

pub use entity::{NewUser, User, UserId, UserWithTeams};
pub use validation::{validate_user_fields, MAX_EMAIL_LENGTH, MAX_NAME_LENGTH};
