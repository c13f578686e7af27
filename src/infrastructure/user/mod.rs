//! User infrastructure module
//!
//! Request-level policy for users on top of the generic table layer.

mod service;

pub use service::UserService;
