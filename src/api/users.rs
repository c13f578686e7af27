//! User CRUD endpoints

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::api::state::AppState;
use crate::api::types::{ApiError, IdPayload, Json, Success, UserPayload, UsersPayload};
use crate::domain::user::{User, UserFilter, UserInput};

/// Body of `POST /users`: one user or a batch
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CreateUsersRequest {
    Many(Vec<UserInput>),
    One(UserInput),
}

impl CreateUsersRequest {
    pub fn into_inputs(self) -> Vec<UserInput> {
        match self {
            Self::Many(inputs) => inputs,
            Self::One(input) => vec![input],
        }
    }
}

/// Create the users router
pub fn create_users_router() -> Router<AppState> {
    Router::new()
        .route("/users", get(search_users).post(create_users))
        .route(
            "/users/{user_id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// GET /users/{user_id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Success<UserPayload<User>>>, ApiError> {
    debug!(user_id = %user_id, "Getting user");

    let user = state.user_service.get(&user_id).await?;

    Ok(Json(Success::new(UserPayload { user })))
}

/// PUT /users/{user_id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<UserInput>,
) -> Result<Json<Success<IdPayload>>, ApiError> {
    debug!(user_id = %user_id, "Updating user");

    let id = state.user_service.update(&user_id, request).await?;

    info!(user_id = id, "User updated");
    Ok(Json(Success::new(IdPayload { id })))
}

/// DELETE /users/{user_id}
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Success<IdPayload>>, ApiError> {
    debug!(user_id = %user_id, "Deleting user");

    let id = state.user_service.delete(&user_id).await?;

    info!(user_id = id, "User deleted");
    Ok(Json(Success::new(IdPayload { id })))
}

/// POST /users
pub async fn create_users(
    State(state): State<AppState>,
    Json(request): Json<CreateUsersRequest>,
) -> Result<Json<Success<IdPayload>>, ApiError> {
    let inputs = request.into_inputs();
    debug!(count = inputs.len(), "Creating users");

    let id = state.user_service.create(inputs).await?;

    info!(user_id = id, "Users created");
    Ok(Json(Success::new(IdPayload { id })))
}

/// GET /users?name=&email=
pub async fn search_users(
    State(state): State<AppState>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Success<UsersPayload<User>>>, ApiError> {
    debug!(name = ?filter.name, email = ?filter.email, "Searching users");

    let users = state.user_service.search(&filter).await?;

    Ok(Json(Success::new(UsersPayload { users })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_accepts_object() {
        let request: CreateUsersRequest =
            serde_json::from_str(r#"{"name": "Ana", "email": "ana@x.com"}"#).unwrap();

        assert_eq!(
            request.into_inputs(),
            vec![UserInput::new("Ana", "ana@x.com")]
        );
    }

    #[test]
    fn test_create_request_accepts_array() {
        let request: CreateUsersRequest = serde_json::from_str(
            r#"[{"name": "A", "email": "a@x"}, {"name": "B", "email": "b@x"}]"#,
        )
        .unwrap();

        assert_eq!(request.into_inputs().len(), 2);
    }

    #[test]
    fn test_create_request_empty_array() {
        let request: CreateUsersRequest = serde_json::from_str("[]").unwrap();
        assert!(request.into_inputs().is_empty());
    }
}
