//! Query executor port

use async_trait::async_trait;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use super::record::Row;
use super::statement::Statement;

/// Result of a statement that does not return rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecuteOutcome {
    pub affected_rows: u64,
    /// Key of the first inserted row, for inserts only
    pub insert_id: Option<i64>,
}

impl ExecuteOutcome {
    pub fn affected(affected_rows: u64) -> Self {
        Self {
            affected_rows,
            insert_id: None,
        }
    }

    pub fn inserted(affected_rows: u64, insert_id: i64) -> Self {
        Self {
            affected_rows,
            insert_id: Some(insert_id),
        }
    }
}

/// Raw failures reported by a storage engine
#[derive(Debug, Error)]
pub enum QueryError {
    /// A uniqueness constraint was violated
    #[error("Duplicate key: {message}")]
    DuplicateKey {
        /// Conflicting column, when the engine reports it
        column: Option<String>,
        message: String,
    },

    #[error("Connection error: {message}")]
    Connection { message: String },

    #[error("Query timed out: {message}")]
    Timeout { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Failed to decode row: {message}")]
    Decode { message: String },
}

impl QueryError {
    pub fn duplicate_key(column: Option<String>, message: impl Into<String>) -> Self {
        Self::DuplicateKey {
            column,
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }
}

/// Executes statements against a storage engine
///
/// Implementations own pooling, timeouts and cancellation. Each call is a
/// single round trip.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Runs a statement that returns rows
    async fn fetch(&self, statement: &Statement) -> Result<Vec<Row>, QueryError>;

    /// Runs a statement that modifies rows
    async fn execute(&self, statement: &Statement) -> Result<ExecuteOutcome, QueryError>;
}
