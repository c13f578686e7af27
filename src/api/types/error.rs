//! API error envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::{DomainError, ErrorKind};

/// Default message for 400 responses without a specific message
pub const DEFAULT_BAD_REQUEST_MESSAGE: &str = "The submitted data is invalid";

/// Default message for 404 responses without a specific message
pub const DEFAULT_NOT_FOUND_MESSAGE: &str = "We could not find what you were looking for";

/// Message for every 500 response
pub const INTERNAL_ERROR_MESSAGE: &str = "An error occurred.";

/// Error body: `{ "success": false, "message": "..." }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub message: String,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    /// Create a new API error; an empty message falls back to the status default
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.is_empty() {
            default_message(status).to_string()
        } else {
            message
        };

        Self {
            status,
            response: ApiErrorResponse {
                success: false,
                message,
            },
        }
    }

    /// Bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Internal server error; the message is never exposed
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
    }
}

fn default_message(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => DEFAULT_BAD_REQUEST_MESSAGE,
        StatusCode::NOT_FOUND => DEFAULT_NOT_FOUND_MESSAGE,
        _ => INTERNAL_ERROR_MESSAGE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest => Self::bad_request(public_message(err)),
            ErrorKind::NotFound => Self::not_found(public_message(err)),
            ErrorKind::Unclassified => {
                error!(error = %err, "Unhandled error");
                Self::internal()
            }
        }
    }
}

/// Message carried by a classified error, without the variant prefix
fn public_message(err: DomainError) -> String {
    match err {
        DomainError::BadRequest { message } | DomainError::NotFound { message } => message,
        _ => String::new(),
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.response.message)
    }
}

impl std::error::Error for ApiError {}
