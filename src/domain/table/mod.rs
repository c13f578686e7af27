//! Table domain - Generic single-table access layer

mod executor;
mod record;
mod repository;
mod statement;

pub use executor::{ExecuteOutcome, QueryError, QueryExecutor};
pub use record::{Row, TableRecord};
pub use repository::{Filter, Table};
pub use statement::{
    contains_pattern, validate_identifier, Condition, SqlValue, Statement, TableDefinitionError,
};

#[cfg(test)]
pub use executor::MockQueryExecutor;
