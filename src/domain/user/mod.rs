//! User domain
//!
//! The user record persisted through the generic table layer, plus the
//! input validation applied before any table operation.

mod entity;
mod validation;

pub use entity::{User, UserFilter, UserInput};
pub use validation::{parse_user_id, validate_email, validate_name, UserValidationError};
