//! User validation utilities

use thiserror::Error;

use crate::domain::DomainError;

/// Errors that can occur while validating user input
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("The provided id is invalid")]
    InvalidId,

    #[error("The name is required")]
    MissingName,

    #[error("The email is required")]
    MissingEmail,
}

impl From<UserValidationError> for DomainError {
    fn from(error: UserValidationError) -> Self {
        DomainError::bad_request(error.to_string())
    }
}

/// Parse a user id taken from a request path
///
/// Rules:
/// - Decimal digits only, no sign, surrounding whitespace ignored
/// - Must be strictly positive
pub fn parse_user_id(raw: &str) -> Result<i64, UserValidationError> {
    let digits = raw.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UserValidationError::InvalidId);
    }

    match digits.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(UserValidationError::InvalidId),
    }
}

/// Validate a user name: present and not blank
pub fn validate_name(name: Option<&str>) -> Result<(), UserValidationError> {
    match name {
        Some(name) if !name.trim().is_empty() => Ok(()),
        _ => Err(UserValidationError::MissingName),
    }
}

/// Validate an email: present and not blank
///
/// Format is not checked here; uniqueness is enforced by storage.
pub fn validate_email(email: Option<&str>) -> Result<(), UserValidationError> {
    match email {
        Some(email) if !email.trim().is_empty() => Ok(()),
        _ => Err(UserValidationError::MissingEmail),
    }
}
