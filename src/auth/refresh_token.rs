/// Refresh Token Management
///
/// Creates, looks up and expires long-lived opaque refresh tokens.
/// Refresh tokens are:
/// - Cryptographically secure random 64-character alphanumeric strings
/// - Hashed with SHA-256 before storage (never store plaintext)
/// - Reused on every refresh until they expire on their own schedule
/// - Deleted eagerly the first time they are found expired

use chrono::{Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::auth::models::RefreshTokenRecord;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, ConfigError};
use crate::store::{CredentialStore, StoredRefreshToken};

const REFRESH_TOKEN_LENGTH: usize = 64;

/// Generate a new cryptographically secure refresh token
///
/// 64 characters drawn from 62 symbols gives roughly 381 bits of entropy.
pub fn generate_refresh_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFRESH_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Hash a refresh token using SHA-256
pub(crate) fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn into_record(token: &str, stored: StoredRefreshToken) -> RefreshTokenRecord {
    RefreshTokenRecord {
        token: token.to_string(),
        user: stored.user,
        expiry_date: stored.expiry_date,
    }
}

#[derive(Clone)]
pub struct RefreshTokenManager {
    store: Arc<dyn CredentialStore>,
    lifetime: Duration,
}

impl RefreshTokenManager {
    /// # Errors
    /// `ConfigError::InvalidValue` if the lifetime does not fit a `Duration`
    pub fn new(store: Arc<dyn CredentialStore>, config: &JwtSettings) -> Result<Self, ConfigError> {
        let lifetime = Duration::try_seconds(config.refresh_token_expiry).ok_or_else(|| {
            ConfigError::InvalidValue(format!(
                "jwt.refresh_token_expiry of {} seconds is out of range",
                config.refresh_token_expiry
            ))
        })?;
        Ok(Self { store, lifetime })
    }

    /// Create and persist a refresh token for an already authenticated user
    ///
    /// # Errors
    /// - `AppError::Internal` if the user does not exist; the caller must
    ///   have authenticated the user first
    /// - `AppError::Store` if the store fails
    pub async fn create(&self, username: &str) -> Result<RefreshTokenRecord, AppError> {
        let user = self
            .store
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "refresh token requested for unknown user {}",
                    username
                ))
            })?;

        let token = generate_refresh_token();
        let expiry_date = Utc::now().checked_add_signed(self.lifetime).ok_or_else(|| {
            AppError::Internal("refresh token expiry is out of range".to_string())
        })?;
        let stored = self
            .store
            .save_refresh_token(&hash_token(&token), user.id, expiry_date)
            .await?;

        tracing::info!(
            username = %stored.user.username,
            expires_at = %expiry_date.to_rfc3339(),
            "Refresh token created"
        );

        Ok(into_record(&token, stored))
    }

    /// Look up a refresh token. No side effects.
    pub async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, AppError> {
        let stored = self.store.find_refresh_token(&hash_token(token)).await?;
        Ok(stored.map(|stored| into_record(token, stored)))
    }

    /// Check that a record has not expired
    ///
    /// A record whose expiry is strictly before now is deleted from the
    /// store before `RefreshTokenExpired` is returned, so an expired token
    /// can never be verified twice.
    pub async fn verify_expiration(
        &self,
        record: RefreshTokenRecord,
    ) -> Result<RefreshTokenRecord, AppError> {
        let now = Utc::now();
        if !record.is_expired_at(now) {
            return Ok(record);
        }

        self.store
            .delete_refresh_token_if_expired(&hash_token(&record.token), now)
            .await?;

        tracing::info!(username = %record.user.username, "Refresh token expired and deleted");
        Err(AuthError::RefreshTokenExpired.into())
    }

    /// Delete a single refresh token. Returns whether it existed.
    pub async fn revoke(&self, token: &str) -> Result<bool, AppError> {
        Ok(self.store.delete_refresh_token(&hash_token(token)).await?)
    }
}
