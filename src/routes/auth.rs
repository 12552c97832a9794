//! Auth API endpoints.

use super::AppJson;
use crate::auth::middleware::{AppState, AuthSession};
use crate::auth::session::{cleared_session_cookie, is_well_formed_token, session_cookie};
use crate::auth::AuthError;
use crate::error::AppError;
use crate::models::{Credentials, MessageResponse};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::cookie::CookieJar;

/// Maximum username length in characters.
const MAX_USERNAME_LEN: usize = 64;

/// Usernames are 1-64 characters with no whitespace or control characters.
fn validate_username(username: &str) -> Result<(), AppError> {
    let len = username.chars().count();
    if len == 0 || len > MAX_USERNAME_LEN {
        return Err(AppError::BadRequest(
            "Username must be 1-64 characters".to_string(),
        ));
    }
    if username
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(AppError::BadRequest(
            "Username may not contain whitespace or control characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str, min_len: usize) -> Result<(), AppError> {
    if password.chars().count() < min_len {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            min_len
        )));
    }
    Ok(())
}

/// POST /register — Create a user
pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    validate_username(&req.username)?;
    validate_password(&req.password, state.config.min_password_len)?;

    let user_id = state
        .authenticator
        .register(&req.username, &req.password)
        .await
        .inspect_err(|e| {
            tracing::warn!(action = "register_failed", username = %req.username, error = %e, "Registration failed");
        })?;

    tracing::info!(action = "user_registered", user_id = %user_id, username = %req.username, "New user registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

/// POST /login — Verify credentials and start a session
///
/// Any session token the client already holds is invalidated before a new
/// one is issued.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(req): AppJson<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = match state
        .authenticator
        .authenticate(&req.username, &req.password)
        .await
    {
        Ok(id) => id,
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!(action = "auth_failed", username = %req.username, "Invalid credentials");
            return Err(AuthError::InvalidCredentials.into());
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(previous) = jar.get(&state.config.session_cookie_name) {
        if is_well_formed_token(previous.value()) {
            state.sessions.invalidate(previous.value()).await?;
        }
    }

    let token = state.sessions.create(&user_id).await?;

    tracing::info!(action = "auth_success", user_id = %user_id, username = %req.username, "User authenticated");

    let jar = jar.add(session_cookie(&state.config, token));
    Ok((
        jar,
        Json(MessageResponse::new("Authentication successful")),
    ))
}

/// POST /logout — Invalidate current session
pub async fn logout(
    session: AuthSession,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    state.sessions.invalidate(&session.token).await?;

    tracing::info!(action = "logout", user_id = %session.user_id, "User logged out");

    let jar = jar.remove(cleared_session_cookie(&state.config));
    Ok((jar, Json(MessageResponse::new("Logged out successfully"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("Alice_01-x.y@z").is_ok());
        assert!(validate_username(&"a".repeat(64)).is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username(&"a".repeat(65)).is_err());
        assert!(validate_username("alice smith").is_err());
        assert!(validate_username("alice\n").is_err());
        assert!(validate_username("\u{0007}bell").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret123", 8).is_ok());
        assert!(validate_password("12345678", 8).is_ok());
        assert!(validate_password("1234567", 8).is_err());
        assert!(validate_password("", 0).is_ok());
        assert!(validate_password("", 1).is_err());
    }
}
