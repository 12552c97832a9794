//! Request and response models for the API.
//!
//! All models use serde for serialization/deserialization.
//! Storage models are the JSON documents kept by the stores.

use serde::{Deserialize, Serialize};

/// Current Unix time in seconds.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

// ============================================================================
// Auth Models
// ============================================================================

/// Body of `/register` and `/login`.
#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Generic `{message}` response body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response after creating a post or comment.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: String,
    pub id: String,
}

// ============================================================================
// Post Models
// ============================================================================

/// Body of `POST /posts` and `PUT /posts/{id}`.
#[derive(Debug, Deserialize)]
pub struct PostRequest {
    pub title: String,
    pub content: String,
}

/// Author reference resolved from the post's `author_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorRef {
    pub id: String,
    pub username: String,
}

/// Post as returned by `GET /posts`.
#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: Option<AuthorRef>,
    pub created_at: u64,
    pub updated_at: Option<u64>,
}

// ============================================================================
// Comment Models
// ============================================================================

/// Body of `POST /comments`.
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
    pub post: String,
}

/// Body of `PUT /comments/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

/// Post reference resolved from the comment's `post_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRef {
    pub id: String,
    pub title: String,
}

/// Comment as returned by `GET /comments`.
#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: String,
    pub content: String,
    pub post: Option<PostRef>,
    pub created_at: u64,
    pub updated_at: Option<u64>,
}

// ============================================================================
// Storage Models
// ============================================================================

/// User (credential record) as stored.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: String,
    pub username: String,
    /// Argon2id PHC string, never the plaintext.
    pub password_hash: String,
    pub created_at: u64,
}

impl std::fmt::Debug for StoredUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredUser")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Session data as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub user_id: String,
    pub created_at: u64,
    pub expires_at: Option<u64>,
}

/// Post document as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPost {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub created_at: u64,
    #[serde(default)]
    pub updated_at: Option<u64>,
}

/// Comment document as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredComment {
    pub id: String,
    pub content: String,
    pub post_id: String,
    pub created_at: u64,
    #[serde(default)]
    pub updated_at: Option<u64>,
}
