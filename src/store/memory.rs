//! In-memory credential store
//!
//! Used when no database is configured and throughout the test suite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{CredentialStore, StoredRefreshToken};
use crate::auth::{NewUser, UserIdentity};
use crate::error::StoreError;

#[derive(Default)]
struct Tables {
    next_user_id: i64,
    users: HashMap<i64, UserIdentity>,
    /// token digest -> (owner id, expiry)
    refresh_tokens: HashMap<String, (i64, DateTime<Utc>)>,
}

impl Tables {
    fn joined(&self, token_hash: &str) -> Option<StoredRefreshToken> {
        let (user_id, expiry_date) = self.refresh_tokens.get(token_hash)?;
        let user = self.users.get(user_id)?;
        Some(StoredRefreshToken {
            token_hash: token_hash.to_string(),
            user: user.clone(),
            expiry_date: *expiry_date,
        })
    }
}

/// Credential store backed by process memory
///
/// Both tables sit behind one lock so check-and-delete is atomic.
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of refresh token records currently stored
    pub async fn refresh_token_count(&self) -> usize {
        self.tables.read().await.refresh_tokens.len()
    }

    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserIdentity>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn save_user(&self, user: NewUser) -> Result<UserIdentity, StoreError> {
        let mut tables = self.tables.write().await;

        let duplicate = tables
            .users
            .values()
            .any(|existing| existing.username == user.username || existing.email == user.email);
        if duplicate {
            return Err(StoreError::Duplicate("username or email".to_string()));
        }

        tables.next_user_id += 1;
        let identity = UserIdentity {
            id: tables.next_user_id,
            username: user.username,
            password_hash: user.password_hash,
            email: user.email,
            roles: user.roles,
        };
        tables.users.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn save_refresh_token(
        &self,
        token_hash: &str,
        user_id: i64,
        expiry_date: DateTime<Utc>,
    ) -> Result<StoredRefreshToken, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.refresh_tokens.contains_key(token_hash) {
            return Err(StoreError::Duplicate("refresh token".to_string()));
        }
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::Unexpected(format!("no user with id {}", user_id)));
        }

        tables
            .refresh_tokens
            .insert(token_hash.to_string(), (user_id, expiry_date));
        tables
            .joined(token_hash)
            .ok_or_else(|| StoreError::Unexpected("refresh token vanished".to_string()))
    }

    async fn find_refresh_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<StoredRefreshToken>, StoreError> {
        Ok(self.tables.read().await.joined(token_hash))
    }

    async fn delete_refresh_token(&self, token_hash: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.refresh_tokens.remove(token_hash).is_some())
    }

    async fn delete_refresh_token_if_expired(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let expired = matches!(
            tables.refresh_tokens.get(token_hash),
            Some((_, expiry_date)) if *expiry_date < now
        );
        if expired {
            tables.refresh_tokens.remove(token_hash);
        }
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "hash".to_string(),
            email: email.to_string(),
            roles: "USER".to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_and_find_user() {
        let store = InMemoryCredentialStore::new();
        let saved = store.save_user(new_user("alice", "alice@example.com")).await.unwrap();

        let found = store.find_user_by_username("alice").await.unwrap();
        assert_eq!(found, Some(saved));
        assert!(store.find_user_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_ids_are_unique() {
        let store = InMemoryCredentialStore::new();
        let a = store.save_user(new_user("alice", "alice@example.com")).await.unwrap();
        let b = store.save_user(new_user("bob", "bob@example.com")).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_duplicate_username_or_email_rejected() {
        let store = InMemoryCredentialStore::new();
        store.save_user(new_user("alice", "alice@example.com")).await.unwrap();

        let same_name = store.save_user(new_user("alice", "other@example.com")).await;
        assert!(matches!(same_name, Err(StoreError::Duplicate(_))));

        let same_email = store.save_user(new_user("alice2", "alice@example.com")).await;
        assert!(matches!(same_email, Err(StoreError::Duplicate(_))));

        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_refresh_token_lifecycle() {
        let store = InMemoryCredentialStore::new();
        let user = store.save_user(new_user("alice", "alice@example.com")).await.unwrap();
        let expiry = Utc::now() + Duration::days(1);

        let saved = store.save_refresh_token("digest", user.id, expiry).await.unwrap();
        assert_eq!(saved.user, user);

        let found = store.find_refresh_token("digest").await.unwrap();
        assert_eq!(found, Some(saved));

        assert!(store.delete_refresh_token("digest").await.unwrap());
        assert!(!store.delete_refresh_token("digest").await.unwrap());
        assert!(store.find_refresh_token("digest").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_token_digest_rejected() {
        let store = InMemoryCredentialStore::new();
        let user = store.save_user(new_user("alice", "alice@example.com")).await.unwrap();
        let expiry = Utc::now() + Duration::days(1);

        store.save_refresh_token("digest", user.id, expiry).await.unwrap();
        let again = store.save_refresh_token("digest", user.id, expiry).await;
        assert!(matches!(again, Err(StoreError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_check_and_delete_only_removes_expired() {
        let store = InMemoryCredentialStore::new();
        let user = store.save_user(new_user("alice", "alice@example.com")).await.unwrap();
        let now = Utc::now();

        store
            .save_refresh_token("live", user.id, now + Duration::minutes(1))
            .await
            .unwrap();
        store
            .save_refresh_token("dead", user.id, now - Duration::minutes(1))
            .await
            .unwrap();

        assert!(!store.delete_refresh_token_if_expired("live", now).await.unwrap());
        assert!(store.delete_refresh_token_if_expired("dead", now).await.unwrap());
        assert!(!store.delete_refresh_token_if_expired("dead", now).await.unwrap());

        assert_eq!(store.refresh_token_count().await, 1);
    }
}
