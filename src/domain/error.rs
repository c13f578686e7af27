use thiserror::Error;

use super::table::QueryError;

/// Stable discriminator for [`DomainError`]
///
/// Callers decide transport status by kind, never by message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller-supplied input is invalid, including uniqueness conflicts
    BadRequest,
    /// A referenced entity does not exist
    NotFound,
    /// Storage outages, programming errors and anything else
    Unclassified,
}

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Raw executor failure, propagated unchanged
    #[error(transparent)]
    Storage(#[from] QueryError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadRequest { .. } => ErrorKind::BadRequest,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Storage(_) | Self::Configuration { .. } | Self::Internal { .. } => {
                ErrorKind::Unclassified
            }
        }
    }
}
