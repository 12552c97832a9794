//! Shared state and the session gate for protected routes.

use super::session::is_well_formed_token;
use super::{Authenticator, AuthError, PasswordHasher};
use crate::config::Config;
use crate::error::AppError;
use crate::storage::{BlogStore, CredentialStore, SessionStore};
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Application state shared across handlers.
///
/// Stores are injected at construction; nothing here is global.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn CredentialStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub blog: Arc<dyn BlogStore>,
    pub authenticator: Arc<Authenticator>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build state from configuration and the three stores.
    pub fn new(
        config: Config,
        users: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        blog: Arc<dyn BlogStore>,
    ) -> Result<Self, AuthError> {
        let hasher = PasswordHasher::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
        )
        .map_err(AuthError::Hashing)?;
        let authenticator = Authenticator::new(users.clone(), hasher)?;

        Ok(Self {
            users,
            sessions,
            blog,
            authenticator: Arc::new(authenticator),
            config: Arc::new(config),
        })
    }
}

/// Authenticated identity extractor.
///
/// Reads the session token from the session cookie and resolves it to a
/// user. Handlers taking this extractor never run for unauthenticated
/// requests; those get 401 `{"error": "Unauthorized"}`.
pub struct AuthSession {
    pub user_id: String,
    pub username: String,
    pub token: String,
}

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        authorize(&jar, state).await
    }
}

/// Resolve the session cookie in `jar` to an identity.
///
/// Fails with 401 when the cookie is missing or malformed, when the token is
/// unknown or expired, or when the user behind the session no longer exists.
/// Storage failures surface as 500.
pub async fn authorize(jar: &CookieJar, state: &AppState) -> Result<AuthSession, AppError> {
    let token = jar
        .get(&state.config.session_cookie_name)
        .map(|c| c.value().to_string())
        .filter(|t| is_well_formed_token(t))
        .ok_or_else(AppError::unauthorized)?;

    let user_id = state
        .sessions
        .resolve(&token)
        .await?
        .ok_or_else(AppError::unauthorized)?;

    let user = state
        .users
        .find_by_id(&user_id)
        .await?
        .ok_or_else(AppError::unauthorized)?;

    Ok(AuthSession {
        user_id: user.id,
        username: user.username,
        token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::storage::{MemoryBlogStore, MemoryCredentialStore, MemorySessionStore};
    use axum::http::{header, HeaderMap, HeaderValue};
    use std::time::Duration;

    fn test_state() -> AppState {
        AppState::new(
            test_config(),
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(MemorySessionStore::new(Duration::from_secs(60))),
            Arc::new(MemoryBlogStore::new()),
        )
        .unwrap()
    }

    fn jar_with(cookie: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        CookieJar::from_headers(&headers)
    }

    #[tokio::test]
    async fn test_missing_cookie_rejected() {
        let state = test_state();
        let err = authorize(&CookieJar::new(), &state).await.err().unwrap();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_unknown_token_rejected() {
        let state = test_state();
        let token = crate::auth::generate_session_token();
        let jar = jar_with(&format!("blogpad_session={}", token));

        let err = authorize(&jar, &state).await.err().unwrap();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_malformed_token_rejected() {
        let state = test_state();
        let jar = jar_with("blogpad_session=not-a-token");

        let err = authorize(&jar, &state).await.err().unwrap();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_valid_session_resolves_identity() {
        let state = test_state();
        let user_id = state.users.insert("alice", "hash").await.unwrap();
        let token = state.sessions.create(&user_id).await.unwrap();
        let jar = jar_with(&format!("other=1; blogpad_session={}", token));

        let session = authorize(&jar, &state).await.unwrap();
        assert_eq!(session.user_id, user_id);
        assert_eq!(session.username, "alice");
        assert_eq!(session.token, token);
    }

    #[tokio::test]
    async fn test_cookie_name_must_match() {
        let state = test_state();
        let user_id = state.users.insert("alice", "hash").await.unwrap();
        let token = state.sessions.create(&user_id).await.unwrap();
        let jar = jar_with(&format!("session={}", token));

        assert!(authorize(&jar, &state).await.is_err());
    }

    #[tokio::test]
    async fn test_session_for_missing_user_rejected() {
        let state = test_state();
        let token = state.sessions.create("deleted-user").await.unwrap();
        let jar = jar_with(&format!("blogpad_session={}", token));

        let err = authorize(&jar, &state).await.err().unwrap();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_invalidated_session_rejected() {
        let state = test_state();
        let user_id = state.users.insert("alice", "hash").await.unwrap();
        let token = state.sessions.create(&user_id).await.unwrap();
        state.sessions.invalidate(&token).await.unwrap();
        let jar = jar_with(&format!("blogpad_session={}", token));

        assert!(authorize(&jar, &state).await.is_err());
    }
}
