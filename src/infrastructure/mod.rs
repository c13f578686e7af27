//! Infrastructure layer - Storage engines, services and logging

pub mod logging;
pub mod table;
pub mod user;
