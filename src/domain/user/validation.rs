//! User field validation
//!
//! Unlike the fail-fast team validation, user form validation collects every
//! failing field so the caller gets one message per problem in a single
//! round trip.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::error::FieldErrors;

pub const MAX_NAME_LENGTH: usize = 50;
pub const MAX_EMAIL_LENGTH: usize = 50;

/// One non-whitespace local part, an `@`, and a dotted domain.
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Validate user name and email, collecting all failures.
///
/// Rules:
/// - name: required, maximum 50 characters
/// - email: required, maximum 50 characters, must match email syntax
pub fn validate_user_fields(name: &str, email: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if name.trim().is_empty() {
        errors.push("name", "Name is required");
    } else if name.chars().count() > MAX_NAME_LENGTH {
        errors.push(
            "name",
            format!("Name exceeds maximum length of {} characters", MAX_NAME_LENGTH),
        );
    }

    if email.trim().is_empty() {
        errors.push("email", "Email address is required");
    } else {
        if email.chars().count() > MAX_EMAIL_LENGTH {
            errors.push(
                "email",
                format!(
                    "Email address exceeds maximum length of {} characters",
                    MAX_EMAIL_LENGTH
                ),
            );
        }

        if !EMAIL_PATTERN.is_match(email) {
            errors.push("email", "Email address is invalid");
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
