//! User entity and related types

use serde::{Deserialize, Serialize};

use super::validation::{validate_email, validate_name, UserValidationError};
use crate::domain::table::{Filter, SqlValue, TableRecord};

/// User record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Storage-assigned key; `None` until persisted
    #[serde(default)]
    id: Option<i64>,
    name: String,
    /// Unique across all users
    email: String,
}

impl User {
    /// Create a user that has not been persisted yet
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
        }
    }

    /// Create a user bound to an existing id
    pub fn with_fields(id: i64, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    // Getters

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl TableRecord for User {
    const LABEL: &'static str = "user";

    fn columns() -> &'static [&'static str] {
        &["name", "email"]
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::from(self.name.as_str()),
            SqlValue::from(self.email.as_str()),
        ]
    }
}

/// Unvalidated user fields as submitted by a client
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserInput {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
        }
    }

    /// Validates required fields and builds a user, keyed by `id` when given
    pub fn into_user(self, id: Option<i64>) -> Result<User, UserValidationError> {
        validate_name(self.name.as_deref())?;
        validate_email(self.email.as_deref())?;

        Ok(User {
            id,
            name: self.name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
        })
    }
}

/// Substring search over users; empty values are ignored
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserFilter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserFilter {
    pub fn to_filter(&self) -> Filter {
        Filter::new()
            .with("name", non_empty(&self.name))
            .with("email", non_empty(&self.email))
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}
