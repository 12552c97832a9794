//! API route handlers.

pub mod auth;
pub mod comments;
pub mod posts;

use crate::auth::middleware::AppState;
use crate::error::AppError;
use crate::middleware::security_headers;
use crate::storage::ID_LEN;
use axum::{extract::FromRequest, routing::post, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// JSON body extractor whose rejections use the `{"error": ...}` body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Validate that a string is a valid nanoid (alphanumeric, hyphens, underscores).
pub fn validate_id(id: &str, label: &str) -> Result<(), AppError> {
    if id.len() != ID_LEN
        || !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::BadRequest(format!("Invalid {} format", label)));
    }
    Ok(())
}

/// Build the API router with all endpoints.
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Auth endpoints
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        // Post endpoints
        .route("/posts", post(posts::create_post).get(posts::list_posts))
        .route(
            "/posts/{id}",
            axum::routing::put(posts::update_post).delete(posts::delete_post),
        )
        // Comment endpoints
        .route(
            "/comments",
            post(comments::create_comment).get(comments::list_comments),
        )
        .route(
            "/comments/{id}",
            axum::routing::put(comments::update_comment).delete(comments::delete_comment),
        )
}

/// The full application: routes, body limit, CORS, security headers and tracing.
pub fn app(state: AppState) -> Router {
    // Explicit CORS: deny all cross-origin requests (single-origin deployment).
    let cors = CorsLayer::new();

    api_router()
        .layer(axum::extract::DefaultBodyLimit::max(
            state.config.max_body_bytes,
        ))
        .layer(cors)
        .layer(axum::middleware::from_fn(security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::storage::{MemoryBlogStore, MemoryCredentialStore, MemorySessionStore};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_app() -> (Router, AppState) {
        let state = AppState::new(
            test_config(),
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(MemorySessionStore::new(Duration::from_secs(60))),
            Arc::new(MemoryBlogStore::new()),
        )
        .unwrap();
        (app(state.clone()), state)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_register_then_login_sets_cookie() {
        let (app, _) = test_app();
        let creds = serde_json::json!({"username": "alice", "password": "secret123"});

        let response = app
            .clone()
            .oneshot(json_request("POST", "/register", creds.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(json_request("POST", "/login", creds))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cookie.starts_with("blogpad_session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/"));
    }

    #[tokio::test]
    async fn test_protected_route_with_session_cookie() {
        let (app, state) = test_app();
        let user_id = state.users.insert("alice", "hash").await.unwrap();
        let token = state.sessions.create(&user_id).await.unwrap();

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/posts").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "Unauthorized");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/posts")
                    .header(header::COOKIE, format!("blogpad_session={}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (app, _) = test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{\"username\":"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (app, _) = test_app();

        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("abcdefghijkl", "post ID").is_ok());
        assert!(validate_id("abc-def_ghi0", "post ID").is_ok());
        assert!(validate_id("short", "post ID").is_err());
        assert!(validate_id("abcdefghijk!", "post ID").is_err());
        assert!(validate_id("abcdefghijklm", "post ID").is_err());
    }

    #[test]
    fn test_validate_id_message() {
        match validate_id("x", "comment ID") {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Invalid comment ID format"),
            _ => panic!("Expected BadRequest"),
        }
    }
}
