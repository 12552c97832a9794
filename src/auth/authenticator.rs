//! Credential registration and verification.

use super::password::PasswordHasher;
use super::AuthError;
use crate::storage::{CredentialStore, StoreError};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Verifies login attempts against the credential store.
pub struct Authenticator {
    users: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    /// Verified against when the username is unknown, so both failure paths
    /// pay for one Argon2 computation.
    dummy_hash: String,
}

impl Authenticator {
    pub fn new(users: Arc<dyn CredentialStore>, hasher: PasswordHasher) -> Result<Self, AuthError> {
        let dummy_hash = hasher
            .hash("blogpad-dummy-password")
            .map_err(AuthError::Hashing)?;

        Ok(Self {
            users,
            hasher,
            dummy_hash,
        })
    }

    /// Hash the password and create a credential record.
    ///
    /// Returns the new user id, or [`AuthError::DuplicateUsername`] if the
    /// username is taken.
    pub async fn register(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let hash = self.hash(password).await?;

        match self.users.insert(username, &hash).await {
            Ok(id) => Ok(id),
            Err(StoreError::DuplicateUsername) => Err(AuthError::DuplicateUsername),
            Err(e) => Err(AuthError::Storage(e)),
        }
    }

    /// Check a username/password pair and return the user id.
    ///
    /// Unknown usernames and wrong passwords both produce
    /// [`AuthError::InvalidCredentials`].
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let user = self.users.find_by_username(username).await?;

        let (user_id, hash) = match user {
            Some(user) => (Some(user.id), user.password_hash),
            None => (None, self.dummy_hash.clone()),
        };

        let matched = self.verify(password, hash).await;

        match user_id {
            Some(id) if matched => Ok(id),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    /// Argon2 is CPU-bound; run it off the async worker threads.
    async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        let password = Zeroizing::new(password.to_string());

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Hashing(format!("Hash task failed: {}", e)))?
            .map_err(AuthError::Hashing)
    }

    async fn verify(&self, password: &str, hash: String) -> bool {
        let hasher = self.hasher.clone();
        let password = Zeroizing::new(password.to_string());

        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryCredentialStore;

    fn authenticator() -> (Authenticator, Arc<MemoryCredentialStore>) {
        let store = Arc::new(MemoryCredentialStore::new());
        let hasher = PasswordHasher::new(1024, 1, 1).unwrap();
        let auth = Authenticator::new(store.clone(), hasher).unwrap();
        (auth, store)
    }

    #[tokio::test]
    async fn test_register_then_authenticate() {
        let (auth, _) = authenticator();

        let id = auth.register("alice", "secret123").await.unwrap();
        let authed = auth.authenticate("alice", "secret123").await.unwrap();
        assert_eq!(authed, id);
    }

    #[tokio::test]
    async fn test_password_stored_as_hash() {
        let (auth, store) = authenticator();
        auth.register("alice", "secret123").await.unwrap();

        let record = store.find_by_username("alice").await.unwrap().unwrap();
        assert_ne!(record.password_hash, "secret123");
        assert!(record.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_wrong_password_indistinguishable_from_unknown_user() {
        let (auth, _) = authenticator();
        auth.register("alice", "secret123").await.unwrap();

        let wrong_password = auth.authenticate("alice", "wrong").await.unwrap_err();
        let unknown_user = auth.authenticate("mallory", "secret123").await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_username_is_case_sensitive() {
        let (auth, _) = authenticator();
        auth.register("alice", "secret123").await.unwrap();

        let err = auth.authenticate("Alice", "secret123").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let (auth, _) = authenticator();
        let id = auth.register("alice", "secret123").await.unwrap();

        let err = auth.register("alice", "different1").await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateUsername));

        // First password still works, second was never stored
        assert_eq!(auth.authenticate("alice", "secret123").await.unwrap(), id);
        assert!(auth.authenticate("alice", "different1").await.is_err());
    }

    #[tokio::test]
    async fn test_dummy_password_does_not_authenticate_unknown_user() {
        let (auth, _) = authenticator();
        let err = auth
            .authenticate("ghost", "blogpad-dummy-password")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}
