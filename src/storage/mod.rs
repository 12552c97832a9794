//! Storage layer for users, sessions, posts and comments.
//!
//! Handlers only see the [`CredentialStore`], [`SessionStore`] and
//! [`BlogStore`] traits. Two implementations exist:
//! - [`RedisStore`]: JSON documents in Redis, shared across server instances
//! - [`memory`]: in-process maps, lost on restart
//!
//! The Redis key layout lives in the `user`, `session`, `post` and `comment`
//! modules as plain async functions over `redis::AsyncCommands`.

pub mod comment;
pub mod memory;
pub mod post;
pub mod redis_store;
pub mod session;
pub mod user;

pub use memory::{MemoryBlogStore, MemoryCredentialStore, MemorySessionStore};
pub use redis_store::RedisStore;

use crate::models::{StoredComment, StoredPost, StoredUser};
use async_trait::async_trait;
use redis::AsyncCommands;

/// Storage failures surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Unavailable(format!("Redis error: {}", err))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Unavailable(format!("JSON error: {}", err))
    }
}

/// Persisted username / password-hash pairs.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Case-sensitive exact match. Absence is `Ok(None)`, not an error.
    async fn find_by_username(&self, username: &str) -> Result<Option<StoredUser>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<StoredUser>, StoreError>;

    /// Insert a new credential record and return its user id.
    ///
    /// Fails with [`StoreError::DuplicateUsername`] if the username exists;
    /// the existing record is left untouched.
    async fn insert(&self, username: &str, password_hash: &str) -> Result<String, StoreError>;
}

/// Server-side mapping from opaque session token to user id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Issue a new random token for `user_id`. Visible to `resolve` once this returns.
    async fn create(&self, user_id: &str) -> Result<String, StoreError>;

    /// `None` when the token is unknown or expired.
    async fn resolve(&self, token: &str) -> Result<Option<String>, StoreError>;

    /// Remove the mapping. Invalidating an absent token is not an error.
    async fn invalidate(&self, token: &str) -> Result<(), StoreError>;
}

/// Posts and comments.
#[async_trait]
pub trait BlogStore: Send + Sync {
    /// All posts ordered by `(created_at, id)`.
    async fn list_posts(&self) -> Result<Vec<StoredPost>, StoreError>;

    async fn get_post(&self, id: &str) -> Result<Option<StoredPost>, StoreError>;

    async fn insert_post(
        &self,
        title: &str,
        content: &str,
        author_id: &str,
    ) -> Result<StoredPost, StoreError>;

    /// Returns false if no post has this id.
    async fn update_post(&self, id: &str, title: &str, content: &str)
        -> Result<bool, StoreError>;

    /// Returns false if no post has this id.
    async fn delete_post(&self, id: &str) -> Result<bool, StoreError>;

    /// All comments ordered by `(created_at, id)`.
    async fn list_comments(&self) -> Result<Vec<StoredComment>, StoreError>;

    async fn insert_comment(&self, content: &str, post_id: &str)
        -> Result<StoredComment, StoreError>;

    /// Returns false if no comment has this id.
    async fn update_comment(&self, id: &str, content: &str) -> Result<bool, StoreError>;

    /// Returns false if no comment has this id.
    async fn delete_comment(&self, id: &str) -> Result<bool, StoreError>;
}

/// Generate a document id.
pub fn new_id() -> String {
    nanoid::nanoid!(ID_LEN)
}

/// Length of generated document ids.
pub const ID_LEN: usize = 12;

/// Scan for Redis keys matching a pattern using SCAN (non-blocking).
///
/// Unlike KEYS, SCAN does not block the Redis server during iteration.
/// The cursor is followed to completion so every matching key is returned;
/// list endpoints depend on seeing the whole keyspace before sorting.
pub async fn scan_keys<C>(con: &mut C, pattern: &str) -> Result<Vec<String>, redis::RedisError>
where
    C: AsyncCommands,
{
    let mut all_keys = Vec::new();
    let mut cursor: u64 = 0;
    loop {
        let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(100)
            .query_async(con)
            .await?;
        all_keys.extend(keys);
        cursor = new_cursor;
        if cursor == 0 {
            break;
        }
    }
    // SCAN may return a key more than once
    all_keys.sort();
    all_keys.dedup();
    Ok(all_keys)
}

/// Decode a JSON document read from Redis.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(json: &str) -> Result<T, redis::RedisError> {
    serde_json::from_str(json).map_err(|e| {
        redis::RedisError::from((
            redis::ErrorKind::TypeError,
            "JSON deserialize",
            e.to_string(),
        ))
    })
}

/// Encode a JSON document for Redis.
pub(crate) fn encode<T: serde::Serialize>(value: &T) -> Result<String, redis::RedisError> {
    serde_json::to_string(value).map_err(|e| {
        redis::RedisError::from((
            redis::ErrorKind::TypeError,
            "JSON serialize",
            e.to_string(),
        ))
    })
}
