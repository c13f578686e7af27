//! Executor factory for runtime backend selection

use std::sync::Arc;

use tracing::info;

use crate::config::DatabaseConfig;
use crate::domain::table::QueryExecutor;
use crate::domain::DomainError;

use super::in_memory::InMemoryExecutor;
use super::postgres::{PostgresConfig, PostgresExecutor};

/// Supported storage backends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorType {
    /// In-memory tables (for testing/development)
    InMemory,
    /// PostgreSQL
    Postgres,
}

impl ExecutorType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Executor configuration
#[derive(Debug, Clone)]
pub enum ExecutorConfig {
    InMemory,
    Postgres(PostgresConfig),
}

impl ExecutorConfig {
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    pub fn postgres(config: PostgresConfig) -> Self {
        Self::Postgres(config)
    }

    /// Creates a PostgreSQL configuration from a URL
    pub fn postgres_url(url: impl Into<String>) -> Self {
        Self::Postgres(PostgresConfig::new(url))
    }

    pub fn executor_type(&self) -> ExecutorType {
        match self {
            Self::InMemory => ExecutorType::InMemory,
            Self::Postgres(_) => ExecutorType::Postgres,
        }
    }
}

impl TryFrom<&DatabaseConfig> for ExecutorConfig {
    type Error = DomainError;

    fn try_from(config: &DatabaseConfig) -> Result<Self, Self::Error> {
        let backend = ExecutorType::from_str(&config.backend).ok_or_else(|| {
            DomainError::configuration(format!("Unknown database backend '{}'", config.backend))
        })?;

        Ok(match backend {
            ExecutorType::InMemory => Self::InMemory,
            ExecutorType::Postgres => Self::Postgres(
                PostgresConfig::new(config.url.clone())
                    .with_max_connections(config.max_connections)
                    .with_min_connections(config.min_connections)
                    .with_connect_timeout(config.connect_timeout_secs)
                    .with_idle_timeout(config.idle_timeout_secs),
            ),
        })
    }
}

/// Factory for creating query executors
#[derive(Debug)]
pub struct ExecutorFactory;

impl ExecutorFactory {
    /// Creates an executor serving `table_name`
    ///
    /// The in-memory backend registers the table with `unique_columns`; on
    /// PostgreSQL the schema is expected to exist already.
    pub async fn create(
        config: &ExecutorConfig,
        table_name: &str,
        unique_columns: &[&str],
    ) -> Result<Arc<dyn QueryExecutor>, DomainError> {
        info!(backend = ?config.executor_type(), table = table_name, "Creating query executor");

        match config {
            ExecutorConfig::InMemory => {
                let executor: Arc<dyn QueryExecutor> =
                    Self::create_in_memory(table_name, unique_columns);
                Ok(executor)
            }
            ExecutorConfig::Postgres(pg_config) => {
                let executor = PostgresExecutor::connect(pg_config).await?;
                Ok(Arc::new(executor))
            }
        }
    }

    pub fn create_in_memory(table_name: &str, unique_columns: &[&str]) -> Arc<InMemoryExecutor> {
        Arc::new(InMemoryExecutor::new().with_table(table_name, unique_columns))
    }
}
