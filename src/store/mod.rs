/// Credential Store
///
/// Durable mapping of user identities and refresh token records. Pure
/// storage: no expiry policy or password logic lives here, apart from the
/// atomic check-and-delete used for eager cleanup of expired tokens.

mod memory;
mod postgres;

pub use memory::InMemoryCredentialStore;
pub use postgres::PostgresCredentialStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::auth::{NewUser, UserIdentity};
use crate::error::StoreError;

/// A persisted refresh token, keyed by the SHA-256 digest of the token
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRefreshToken {
    pub token_hash: String,
    pub user: UserIdentity,
    pub expiry_date: DateTime<Utc>,
}

/// Storage contract consumed by the authentication core
///
/// Every method reports transient I/O trouble as `StoreError::Unavailable`;
/// `Ok(None)` / `Ok(false)` always mean the row genuinely does not exist.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str)
        -> Result<Option<UserIdentity>, StoreError>;

    /// Insert a user. Duplicate username or email fails with `Duplicate`.
    async fn save_user(&self, user: NewUser) -> Result<UserIdentity, StoreError>;

    /// Insert a refresh token record. Duplicate digests fail with `Duplicate`.
    async fn save_refresh_token(
        &self,
        token_hash: &str,
        user_id: i64,
        expiry_date: DateTime<Utc>,
    ) -> Result<StoredRefreshToken, StoreError>;

    async fn find_refresh_token(&self, token_hash: &str)
        -> Result<Option<StoredRefreshToken>, StoreError>;

    /// Delete a record. Returns whether a record was removed.
    async fn delete_refresh_token(&self, token_hash: &str) -> Result<bool, StoreError>;

    /// Delete the record only if its expiry is strictly before `now`, as one
    /// atomic step. Returns whether a record was removed.
    async fn delete_refresh_token_if_expired(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}
