//! Success envelope

use serde::Serialize;

/// Success body: `{ "success": true, ...payload }`
#[derive(Debug, Clone, Serialize)]
pub struct Success<T> {
    pub success: bool,
    #[serde(flatten)]
    pub payload: T,
}

impl<T> Success<T> {
    pub fn new(payload: T) -> Self {
        Self {
            success: true,
            payload,
        }
    }
}

/// Payload carrying the id a write affected
#[derive(Debug, Clone, Serialize)]
pub struct IdPayload {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserPayload<U> {
    pub user: U,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsersPayload<U> {
    pub users: Vec<U>,
}
