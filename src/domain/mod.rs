//! Domain layer - Core entities, errors and the table access port

pub mod error;
pub mod table;
pub mod user;

pub use error::{DomainError, ErrorKind};
pub use table::{Filter, QueryError, QueryExecutor, SqlValue, Table, TableRecord};
pub use user::{User, UserFilter, UserInput};
