use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::health;
use super::middleware::logging_middleware;
use super::state::AppState;
use super::types::ApiError;
use super::users;

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints (no state needed)
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        // User CRUD
        .merge(users::create_users_router())
        .fallback(route_not_found)
        // Add state and middleware
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Unknown routes get the standard 404 envelope
async fn route_not_found() -> ApiError {
    ApiError::not_found("")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::api::state::MockUserServiceTrait;
    use crate::domain::{DomainError, QueryError, Table};
    use crate::infrastructure::table::InMemoryExecutor;
    use crate::infrastructure::user::UserService;

    fn app() -> Router {
        let executor = InMemoryExecutor::new().with_table("user", &["email"]);
        let table = Table::new("user", Arc::new(executor)).unwrap();
        create_router(AppState::new(Arc::new(UserService::new(table))))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, body)
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = app();

        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, _) = send(&app, "GET", "/live", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_user_lifecycle() {
        let app = app();

        let (status, body) = send(
            &app,
            "POST",
            "/users",
            Some(json!({"name": "Ana", "email": "ana@x.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "id": 1}));

        let (status, body) = send(&app, "GET", "/users/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"success": true, "user": {"id": 1, "name": "Ana", "email": "ana@x.com"}})
        );

        let (status, body) = send(
            &app,
            "PUT",
            "/users/1",
            Some(json!({"name": "Ana2", "email": "ana@x.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "id": 1}));

        let (_, body) = send(&app, "GET", "/users/1", None).await;
        assert_eq!(body["user"]["name"], "Ana2");

        let (status, body) = send(&app, "DELETE", "/users/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "id": 1}));

        let (status, body) = send(&app, "GET", "/users/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"success": false, "message": "User not found"}));
    }

    #[tokio::test]
    async fn test_create_batch_and_search() {
        let app = app();

        let (status, body) = send(
            &app,
            "POST",
            "/users",
            Some(json!([
                {"name": "Joanna", "email": "jo@x.com"},
                {"name": "Hanna", "email": "hanna@y.org"},
                {"name": "Bob", "email": "bob@x.com"}
            ])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 1);

        let (status, body) = send(&app, "GET", "/users", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["users"].as_array().unwrap().len(), 3);

        let (_, body) = send(&app, "GET", "/users?name=anna", None).await;
        assert_eq!(body["users"].as_array().unwrap().len(), 2);

        let (_, body) = send(&app, "GET", "/users?name=anna&email=x.com", None).await;
        let users = body["users"].as_array().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["name"], "Joanna");

        let (_, body) = send(&app, "GET", "/users?name=&email=", None).await;
        assert_eq!(body["users"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_bad_request() {
        let app = app();
        let user = json!({"name": "Ana", "email": "ana@x.com"});

        send(&app, "POST", "/users", Some(user.clone())).await;
        let (status, body) = send(&app, "POST", "/users", Some(user)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "A user with the same email already exists");
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let app = app();

        let (status, body) = send(&app, "GET", "/users/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "The provided id is invalid");

        let (status, body) = send(&app, "POST", "/users", Some(json!({"email": "a@x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "The name is required");

        let (status, body) = send(&app, "POST", "/users", Some(json!([]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "At least one user is required");

        let (status, body) = send(&app, "PUT", "/users/1", Some(json!({"name": "Ana"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "The email is required");
    }

    #[tokio::test]
    async fn test_malformed_body_uses_error_envelope() {
        let app = app();
        let request = Request::builder()
            .method("POST")
            .uri("/users")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_missing_resources_are_not_found() {
        let app = app();

        let (status, body) = send(&app, "DELETE", "/users/9", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User to delete not found");

        let (status, _) = send(
            &app,
            "PUT",
            "/users/9",
            Some(json!({"name": "Ghost", "email": "g@x"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, "GET", "/nowhere", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!({"success": false, "message": "We could not find what you were looking for"})
        );
    }

    #[tokio::test]
    async fn test_storage_failure_is_generic_500() {
        let mut service = MockUserServiceTrait::new();
        service
            .expect_search()
            .returning(|_| Err(DomainError::Storage(QueryError::connection("refused"))));

        let app = create_router(AppState::new(Arc::new(service)));
        let (status, body) = send(&app, "GET", "/users", None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"success": false, "message": "An error occurred."})
        );
    }
}
