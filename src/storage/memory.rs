//! In-process store implementations.
//!
//! Each store keeps its maps behind one `parking_lot::RwLock`: lookups take
//! the read lock, writes take the write lock. Nothing here survives a
//! restart, and state is not shared between server instances.

use super::{new_id, BlogStore, CredentialStore, SessionStore, StoreError};
use crate::auth::session::generate_session_token;
use crate::models::{unix_now, StoredComment, StoredPost, StoredUser};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

// ============================================================================
// Credentials
// ============================================================================

#[derive(Default)]
struct Users {
    by_id: HashMap<String, StoredUser>,
    id_by_username: HashMap<String, String>,
}

/// In-memory credential store.
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Users>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<StoredUser>, StoreError> {
        let users = self.inner.read();
        Ok(users
            .id_by_username
            .get(username)
            .and_then(|id| users.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<StoredUser>, StoreError> {
        Ok(self.inner.read().by_id.get(id).cloned())
    }

    async fn insert(&self, username: &str, password_hash: &str) -> Result<String, StoreError> {
        let mut users = self.inner.write();
        if users.id_by_username.contains_key(username) {
            return Err(StoreError::DuplicateUsername);
        }

        let record = StoredUser {
            id: new_id(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: unix_now(),
        };
        let id = record.id.clone();
        users
            .id_by_username
            .insert(record.username.clone(), id.clone());
        users.by_id.insert(id.clone(), record);
        Ok(id)
    }
}

// ============================================================================
// Sessions
// ============================================================================

struct MemorySession {
    user_id: String,
    expires_at: Instant,
}

/// In-memory session store with per-session expiry.
///
/// Expired sessions stop resolving immediately; [`purge_expired`](Self::purge_expired)
/// reclaims their memory and is driven by the background sweep.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, MemorySession>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Remove expired sessions, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        before - sessions.len()
    }

    /// Number of stored sessions, expired or not.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, user_id: &str) -> Result<String, StoreError> {
        let expires_at = Instant::now()
            .checked_add(self.ttl)
            .ok_or_else(|| StoreError::Unavailable("Session expiry out of range".to_string()))?;
        let token = generate_session_token();
        let session = MemorySession {
            user_id: user_id.to_string(),
            expires_at,
        };
        self.sessions.write().insert(token.clone(), session);
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<String>, StoreError> {
        let sessions = self.sessions.read();
        Ok(sessions
            .get(token)
            .filter(|s| s.expires_at > Instant::now())
            .map(|s| s.user_id.clone()))
    }

    async fn invalidate(&self, token: &str) -> Result<(), StoreError> {
        self.sessions.write().remove(token);
        Ok(())
    }
}

// ============================================================================
// Posts and comments
// ============================================================================

#[derive(Default)]
struct Blog {
    posts: HashMap<String, StoredPost>,
    comments: HashMap<String, StoredComment>,
}

/// In-memory post and comment store.
#[derive(Default)]
pub struct MemoryBlogStore {
    inner: RwLock<Blog>,
}

impl MemoryBlogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlogStore for MemoryBlogStore {
    async fn list_posts(&self) -> Result<Vec<StoredPost>, StoreError> {
        let mut posts: Vec<StoredPost> = self.inner.read().posts.values().cloned().collect();
        posts.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(posts)
    }

    async fn get_post(&self, id: &str) -> Result<Option<StoredPost>, StoreError> {
        Ok(self.inner.read().posts.get(id).cloned())
    }

    async fn insert_post(
        &self,
        title: &str,
        content: &str,
        author_id: &str,
    ) -> Result<StoredPost, StoreError> {
        let record = StoredPost {
            id: new_id(),
            title: title.to_string(),
            content: content.to_string(),
            author_id: author_id.to_string(),
            created_at: unix_now(),
            updated_at: None,
        };
        self.inner
            .write()
            .posts
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update_post(
        &self,
        id: &str,
        title: &str,
        content: &str,
    ) -> Result<bool, StoreError> {
        let mut blog = self.inner.write();
        match blog.posts.get_mut(id) {
            Some(post) => {
                post.title = title.to_string();
                post.content = content.to_string();
                post.updated_at = Some(unix_now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_post(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.inner.write().posts.remove(id).is_some())
    }

    async fn list_comments(&self) -> Result<Vec<StoredComment>, StoreError> {
        let mut comments: Vec<StoredComment> =
            self.inner.read().comments.values().cloned().collect();
        comments.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(comments)
    }

    async fn insert_comment(
        &self,
        content: &str,
        post_id: &str,
    ) -> Result<StoredComment, StoreError> {
        let record = StoredComment {
            id: new_id(),
            content: content.to_string(),
            post_id: post_id.to_string(),
            created_at: unix_now(),
            updated_at: None,
        };
        self.inner
            .write()
            .comments
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update_comment(&self, id: &str, content: &str) -> Result<bool, StoreError> {
        let mut blog = self.inner.write();
        match blog.comments.get_mut(id) {
            Some(comment) => {
                comment.content = content.to_string();
                comment.updated_at = Some(unix_now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_comment(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.inner.write().comments.remove(id).is_some())
    }
}
