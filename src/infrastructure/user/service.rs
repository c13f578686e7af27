//! User service - CRUD operations for user records

use tracing::debug;

use crate::domain::user::{parse_user_id, User, UserFilter, UserInput};
use crate::domain::{DomainError, Table, TableRecord};

/// User service for CRUD operations
#[derive(Debug, Clone)]
pub struct UserService {
    table: Table<User>,
}

impl UserService {
    /// Create a new UserService over the given table
    pub fn new(table: Table<User>) -> Self {
        Self { table }
    }

    /// Get a user by ID, returning an error if not found
    pub async fn get(&self, id: &str) -> Result<User, DomainError> {
        let id = parse_user_id(id)?;

        self.table
            .find(User::KEY_COLUMN, id)
            .await?
            .ok_or_else(|| DomainError::not_found("User not found"))
    }

    /// Replace the fields of an existing user
    pub async fn update(&self, id: &str, input: UserInput) -> Result<i64, DomainError> {
        let id = parse_user_id(id)?;
        let user = input.into_user(Some(id))?;

        debug!(id, "Updating user");

        self.table
            .save(&user)
            .await?
            .ok_or_else(|| DomainError::not_found("User not found"))
    }

    /// Delete a user; returns the deleted id
    pub async fn delete(&self, id: &str) -> Result<i64, DomainError> {
        let id = parse_user_id(id)?;

        if !self.table.remove(User::KEY_COLUMN, id).await? {
            return Err(DomainError::not_found("User to delete not found"));
        }

        Ok(id)
    }

    /// Create one or more users in a single batch; returns the first new id
    pub async fn create(&self, inputs: Vec<UserInput>) -> Result<i64, DomainError> {
        if inputs.is_empty() {
            return Err(DomainError::bad_request("At least one user is required"));
        }

        let users = inputs
            .into_iter()
            .map(|input| input.into_user(None))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = users.len(), "Creating users");

        self.table.insert(&users).await
    }

    /// Search users by name and email substrings
    pub async fn search(&self, filter: &UserFilter) -> Result<Vec<User>, DomainError> {
        self.table.filter(&filter.to_filter()).await
    }
}
