//! Query executors for the generic table layer

mod factory;
mod in_memory;
mod postgres;

pub use factory::{ExecutorConfig, ExecutorFactory, ExecutorType};
pub use in_memory::InMemoryExecutor;
pub use postgres::{render, PostgresConfig, PostgresExecutor, RenderedStatement};
