//! Team validation utilities

use thiserror::Error;

/// Errors that can occur during team validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TeamValidationError {
    #[error("Team name is required")]
    EmptyName,

    #[error("Team name exceeds maximum length of {0} characters")]
    NameTooLong(usize),
}

pub const MAX_TEAM_NAME_LENGTH: usize = 100;

/// Validate a team name
///
/// Rules:
/// - Cannot be empty (whitespace-only counts as empty)
/// - Maximum 100 characters
pub fn validate_team_name(name: &str) -> Result<(), TeamValidationError> {
    if name.trim().is_empty() {
        return Err(TeamValidationError::EmptyName);
    }

    if name.chars().count() > MAX_TEAM_NAME_LENGTH {
        return Err(TeamValidationError::NameTooLong(MAX_TEAM_NAME_LENGTH));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_team_names() {
        assert!(validate_team_name("Platform").is_ok());
        assert!(validate_team_name("Customer Success").is_ok());
        assert!(validate_team_name(&"a".repeat(100)).is_ok());
    }

    #[test]
    fn test_empty_team_name() {
        assert_eq!(validate_team_name(""), Err(TeamValidationError::EmptyName));
        assert_eq!(
            validate_team_name("   "),
            Err(TeamValidationError::EmptyName)
        );
    }

    #[test]
    fn test_team_name_too_long() {
        assert_eq!(
            validate_team_name(&"a".repeat(101)),
            Err(TeamValidationError::NameTooLong(100))
        );
    }
}
