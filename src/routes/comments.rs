//! Comment API endpoints (all require an authenticated session).

use super::{validate_id, AppJson};
use crate::auth::middleware::{AppState, AuthSession};
use crate::error::AppError;
use crate::models::{
    CommentView, CreateCommentRequest, CreatedResponse, MessageResponse, PostRef,
    UpdateCommentRequest,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::collections::HashMap;

/// GET /comments — List comments with post title resolved
///
/// Comments on deleted posts are listed with `post: null`.
pub async fn list_comments(
    _session: AuthSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let comments = state.blog.list_comments().await?;

    let mut posts: HashMap<String, Option<PostRef>> = HashMap::new();
    let mut views = Vec::with_capacity(comments.len());

    for comment in comments {
        if !posts.contains_key(&comment.post_id) {
            let post = state
                .blog
                .get_post(&comment.post_id)
                .await?
                .map(|p| PostRef {
                    id: p.id,
                    title: p.title,
                });
            posts.insert(comment.post_id.clone(), post);
        }

        views.push(CommentView {
            post: posts.get(&comment.post_id).cloned().flatten(),
            id: comment.id,
            content: comment.content,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        });
    }

    Ok(Json(views))
}

/// POST /comments — Comment on an existing post
pub async fn create_comment(
    session: AuthSession,
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_id(&req.post, "post ID")?;

    if state.blog.get_post(&req.post).await?.is_none() {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    let comment = state.blog.insert_comment(&req.content, &req.post).await?;

    tracing::info!(action = "comment_created", comment_id = %comment.id, post_id = %req.post, user_id = %session.user_id, "Comment created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Comment created successfully".to_string(),
            id: comment.id,
        }),
    ))
}

/// PUT /comments/{id} — Replace comment content
pub async fn update_comment(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_id(&id, "comment ID")?;

    if !state.blog.update_comment(&id, &req.content).await? {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }

    tracing::info!(action = "comment_updated", comment_id = %id, user_id = %session.user_id, "Comment updated");

    Ok(Json(MessageResponse::new("Comment updated successfully")))
}

/// DELETE /comments/{id} — Delete a comment
pub async fn delete_comment(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_id(&id, "comment ID")?;

    if !state.blog.delete_comment(&id).await? {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }

    tracing::info!(action = "comment_deleted", comment_id = %id, user_id = %session.user_id, "Comment deleted");

    Ok(Json(MessageResponse::new("Comment deleted successfully")))
}
