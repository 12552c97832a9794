//! Post API endpoints (all require an authenticated session).

use super::{validate_id, AppJson};
use crate::auth::middleware::{AppState, AuthSession};
use crate::error::AppError;
use crate::models::{AuthorRef, CreatedResponse, MessageResponse, PostRequest, PostView};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::collections::HashMap;

/// GET /posts — List posts with author resolved
///
/// Posts whose author no longer exists are listed with `author: null`.
pub async fn list_posts(
    _session: AuthSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let posts = state.blog.list_posts().await?;

    let mut authors: HashMap<String, Option<AuthorRef>> = HashMap::new();
    let mut views = Vec::with_capacity(posts.len());

    for post in posts {
        if !authors.contains_key(&post.author_id) {
            let author = state
                .users
                .find_by_id(&post.author_id)
                .await?
                .map(|user| AuthorRef {
                    id: user.id,
                    username: user.username,
                });
            authors.insert(post.author_id.clone(), author);
        }

        views.push(PostView {
            author: authors.get(&post.author_id).cloned().flatten(),
            id: post.id,
            title: post.title,
            content: post.content,
            created_at: post.created_at,
            updated_at: post.updated_at,
        });
    }

    Ok(Json(views))
}

/// POST /posts — Create a post authored by the current user
pub async fn create_post(
    session: AuthSession,
    State(state): State<AppState>,
    AppJson(req): AppJson<PostRequest>,
) -> Result<impl IntoResponse, AppError> {
    let post = state
        .blog
        .insert_post(&req.title, &req.content, &session.user_id)
        .await?;

    tracing::info!(action = "post_created", post_id = %post.id, user_id = %session.user_id, "Post created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Post created successfully".to_string(),
            id: post.id,
        }),
    ))
}

/// PUT /posts/{id} — Replace title and content
pub async fn update_post(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(req): AppJson<PostRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_id(&id, "post ID")?;

    let updated = state
        .blog
        .update_post(&id, &req.title, &req.content)
        .await?;

    if !updated {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    tracing::info!(action = "post_updated", post_id = %id, user_id = %session.user_id, "Post updated");

    Ok(Json(MessageResponse::new("Post updated successfully")))
}

/// DELETE /posts/{id} — Delete a post
pub async fn delete_post(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_id(&id, "post ID")?;

    let deleted = state.blog.delete_post(&id).await?;

    if !deleted {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    tracing::info!(action = "post_deleted", post_id = %id, user_id = %session.user_id, "Post deleted");

    Ok(Json(MessageResponse::new("Post deleted successfully")))
}
