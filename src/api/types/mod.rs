//! API request and response types
//!
//! Every response body carries a `success` flag; failures add a `message`.

pub mod error;
pub mod json;
pub mod response;

pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
pub use response::{IdPayload, Success, UserPayload, UsersPayload};
