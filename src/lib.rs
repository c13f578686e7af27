//! User CRUD API
//!
//! An HTTP service exposing create, read, update, delete and search over a
//! `user` table, built on a generic single-table access layer:
//! - Upsert keyed on the presence of an id
//! - Single-statement batch inserts
//! - Null-safe substring filters
//! - Duplicate-key failures reported as bad requests

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::info;

use api::state::AppState;
use domain::{DomainError, Table, User};
use infrastructure::table::{ExecutorConfig, ExecutorFactory};
use infrastructure::user::UserService;

/// Columns the user table keeps unique
const USER_UNIQUE_COLUMNS: &[&str] = &["email"];

/// Builds the application state from configuration
pub async fn create_app_state(config: &AppConfig) -> Result<AppState, DomainError> {
    let executor_config = ExecutorConfig::try_from(&config.database)?;
    info!(backend = ?executor_config.executor_type(), "Storage backend selected");

    let executor =
        ExecutorFactory::create(&executor_config, &config.users.table, USER_UNIQUE_COLUMNS)
            .await?;
    let table = Table::<User>::new(config.users.table.clone(), executor)?;

    Ok(AppState::new(Arc::new(UserService::new(table))))
}
