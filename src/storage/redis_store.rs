//! Redis-backed implementation of the store traits.

use super::{
    comment, new_id, post, session, user, BlogStore, CredentialStore, SessionStore, StoreError,
};
use crate::auth::session::generate_session_token;
use crate::models::{unix_now, StoredComment, StoredPost, StoredSession, StoredUser};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;

/// Store handle over one multiplexed Redis connection.
///
/// The connection is opened once at startup and cloned per operation;
/// clones share the underlying socket.
#[derive(Clone)]
pub struct RedisStore {
    con: MultiplexedConnection,
    session_ttl_secs: u64,
}

impl RedisStore {
    /// Connect to Redis and verify the connection.
    pub async fn connect(redis_url: &str, session_ttl_secs: u64) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let con = client.get_multiplexed_async_connection().await?;
        Ok(Self::new(con, session_ttl_secs))
    }

    pub fn new(con: MultiplexedConnection, session_ttl_secs: u64) -> Self {
        Self {
            con,
            session_ttl_secs,
        }
    }

    fn con(&self) -> MultiplexedConnection {
        self.con.clone()
    }
}

#[async_trait]
impl CredentialStore for RedisStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<StoredUser>, StoreError> {
        Ok(user::get_user_by_username(&mut self.con(), username).await?)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<StoredUser>, StoreError> {
        Ok(user::get_user(&mut self.con(), id).await?)
    }

    async fn insert(&self, username: &str, password_hash: &str) -> Result<String, StoreError> {
        let record = StoredUser {
            id: new_id(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: unix_now(),
        };

        if !user::create_user(&mut self.con(), &record).await? {
            return Err(StoreError::DuplicateUsername);
        }
        Ok(record.id)
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn create(&self, user_id: &str) -> Result<String, StoreError> {
        let now = unix_now();
        let expires_at = now
            .checked_add(self.session_ttl_secs)
            .ok_or_else(|| StoreError::Unavailable("Session expiry out of range".to_string()))?;
        let record = StoredSession {
            token: generate_session_token(),
            user_id: user_id.to_string(),
            created_at: now,
            expires_at: Some(expires_at),
        };

        session::store_session(&mut self.con(), &record, self.session_ttl_secs).await?;
        Ok(record.token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<String>, StoreError> {
        let record = session::get_session(&mut self.con(), token).await?;
        Ok(record.map(|s| s.user_id))
    }

    async fn invalidate(&self, token: &str) -> Result<(), StoreError> {
        session::delete_session(&mut self.con(), token).await?;
        Ok(())
    }
}

#[async_trait]
impl BlogStore for RedisStore {
    async fn list_posts(&self) -> Result<Vec<StoredPost>, StoreError> {
        Ok(post::list_posts(&mut self.con()).await?)
    }

    async fn get_post(&self, id: &str) -> Result<Option<StoredPost>, StoreError> {
        Ok(post::get_post(&mut self.con(), id).await?)
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
        post::store_post(&mut self.con(), &record).await?;
        Ok(record)
    }

    async fn update_post(
        &self,
        id: &str,
        title: &str,
        content: &str,
    ) -> Result<bool, StoreError> {
        Ok(post::update_post(&mut self.con(), id, title, content, unix_now()).await?)
    }

    async fn delete_post(&self, id: &str) -> Result<bool, StoreError> {
        Ok(post::delete_post(&mut self.con(), id).await?)
    }

    async fn list_comments(&self) -> Result<Vec<StoredComment>, StoreError> {
        Ok(comment::list_comments(&mut self.con()).await?)
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
        comment::store_comment(&mut self.con(), &record).await?;
        Ok(record)
    }

    async fn update_comment(&self, id: &str, content: &str) -> Result<bool, StoreError> {
        Ok(comment::update_comment(&mut self.con(), id, content, unix_now()).await?)
    }

    async fn delete_comment(&self, id: &str) -> Result<bool, StoreError> {
        Ok(comment::delete_comment(&mut self.con(), id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: These tests require a running Redis instance.
    // They skip themselves if REDIS_URL is not reachable.
    async fn test_store() -> Option<RedisStore> {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        match RedisStore::connect(&redis_url, 60).await {
            Ok(store) => Some(store),
            Err(_) => {
                eprintln!("Skipping test: Redis not available");
                None
            }
        }
    }

    #[tokio::test]
    async fn test_credential_insert_and_lookup() {
        let Some(store) = test_store().await else {
            return;
        };
        let username = format!("user_{}", nanoid::nanoid!(8));

        let id = store.insert(&username, "$argon2id$hash").await.unwrap();

        let found = store.find_by_username(&username).await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.password_hash, "$argon2id$hash");

        let by_id = store.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(by_id.username, username);

        // Case-sensitive exact match
        let upper = username.to_uppercase();
        assert!(store.find_by_username(&upper).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let Some(store) = test_store().await else {
            return;
        };
        let username = format!("user_{}", nanoid::nanoid!(8));

        let id = store.insert(&username, "first").await.unwrap();
        let err = store.insert(&username, "second").await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUsername));

        // Original record untouched
        let found = store.find_by_username(&username).await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.password_hash, "first");
    }

    #[tokio::test]
    async fn test_session_roundtrip_and_invalidate() {
        let Some(store) = test_store().await else {
            return;
        };

        let token = store.create("user-1").await.unwrap();
        assert_eq!(
            store.resolve(&token).await.unwrap().as_deref(),
            Some("user-1")
        );

        store.invalidate(&token).await.unwrap();
        store.invalidate(&token).await.unwrap();
        assert!(store.resolve(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_post_update_and_delete() {
        let Some(store) = test_store().await else {
            return;
        };

        let post = store.insert_post("title", "content", "author").await.unwrap();
        assert!(store.update_post(&post.id, "new", "body").await.unwrap());

        let updated = store.get_post(&post.id).await.unwrap().unwrap();
        assert_eq!(updated.title, "new");
        assert_eq!(updated.content, "body");
        assert_eq!(updated.author_id, "author");
        assert_eq!(updated.created_at, post.created_at);
        assert!(updated.updated_at.is_some());

        assert!(store.delete_post(&post.id).await.unwrap());
        assert!(!store.delete_post(&post.id).await.unwrap());
        assert!(!store.update_post(&post.id, "x", "y").await.unwrap());
    }

    #[tokio::test]
    async fn test_comment_update_and_delete() {
        let Some(store) = test_store().await else {
            return;
        };

        let comment = store.insert_comment("hello", "post-1").await.unwrap();
        assert!(store.update_comment(&comment.id, "edited").await.unwrap());

        let listed = store.list_comments().await.unwrap();
        let found = listed.iter().find(|c| c.id == comment.id).unwrap();
        assert_eq!(found.content, "edited");
        assert_eq!(found.post_id, "post-1");

        assert!(store.delete_comment(&comment.id).await.unwrap());
        assert!(!store.update_comment(&comment.id, "again").await.unwrap());
    }

    #[tokio::test]
    async fn test_unrepresentable_expiry_is_an_error() {
        let Some(store) = test_store().await else {
            return;
        };
        let store = RedisStore::new(store.con(), u64::MAX);

        let err = store.create("user-1").await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_list_posts_spans_many_scan_pages() {
        let Some(store) = test_store().await else {
            return;
        };

        // SCAN is issued with COUNT 100, so this needs several cursor rounds
        let mut ids = Vec::new();
        for i in 0..250 {
            let post = store
                .insert_post(&format!("post {}", i), "body", "author")
                .await
                .unwrap();
            ids.push(post.id);
        }

        let listed = store.list_posts().await.unwrap();
        for id in &ids {
            assert!(listed.iter().any(|p| &p.id == id), "missing post {}", id);
        }
        assert!(listed
            .windows(2)
            .all(|w| (w[0].created_at, &w[0].id) <= (w[1].created_at, &w[1].id)));

        for id in &ids {
            store.delete_post(id).await.unwrap();
        }
    }
}
