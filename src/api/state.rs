//! Application state for shared services

use std::sync::Arc;

use crate::domain::user::{User, UserFilter, UserInput};
use crate::domain::DomainError;
use crate::infrastructure::user::UserService;

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserServiceTrait>,
}

/// Trait for user service operations
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserServiceTrait: Send + Sync {
    async fn get(&self, id: &str) -> Result<User, DomainError>;
    async fn update(&self, id: &str, input: UserInput) -> Result<i64, DomainError>;
    async fn delete(&self, id: &str) -> Result<i64, DomainError>;
    async fn create(&self, inputs: Vec<UserInput>) -> Result<i64, DomainError>;
    async fn search(&self, filter: &UserFilter) -> Result<Vec<User>, DomainError>;
}

#[async_trait::async_trait]
impl UserServiceTrait for UserService {
    async fn get(&self, id: &str) -> Result<User, DomainError> {
        UserService::get(self, id).await
    }

    async fn update(&self, id: &str, input: UserInput) -> Result<i64, DomainError> {
        UserService::update(self, id, input).await
    }

    async fn delete(&self, id: &str) -> Result<i64, DomainError> {
        UserService::delete(self, id).await
    }

    async fn create(&self, inputs: Vec<UserInput>) -> Result<i64, DomainError> {
        UserService::create(self, inputs).await
    }

    async fn search(&self, filter: &UserFilter) -> Result<Vec<User>, DomainError> {
        UserService::search(self, filter).await
    }
}

impl AppState {
    pub fn new(user_service: Arc<dyn UserServiceTrait>) -> Self {
        Self { user_service }
    }
}
