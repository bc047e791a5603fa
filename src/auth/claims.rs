/// JWT Claims structure
///
/// Payload of an access token: the subject (username) plus the standard
/// registered claims (RFC 7519).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
    /// Token ID, unique per issued token
    pub jti: String,
}

impl Claims {
    /// Create new claims for a subject
    ///
    /// # Arguments
    /// * `subject` - Username the token is issued to
    /// * `expiry_seconds` - Token lifetime in seconds from now
    /// * `issuer` - Issuer identifier
    ///
    /// # Errors
    /// Returns `AppError::Internal` if the expiry does not fit a timestamp
    pub fn new(subject: &str, expiry_seconds: i64, issuer: &str) -> Result<Self, AppError> {
        let now = chrono::Utc::now().timestamp();
        let exp = now.checked_add(expiry_seconds).ok_or_else(|| {
            AppError::Internal(format!(
                "access token lifetime of {} seconds is out of range",
                expiry_seconds
            ))
        })?;
        Ok(Self {
            sub: subject.to_string(),
            exp,
            iat: now,
            iss: issuer.to_string(),
            jti: Uuid::new_v4().to_string(),
        })
    }

    /// Whether the token is expired at `now`
    ///
    /// The expiry must lie strictly after `now`; a token whose expiry equals
    /// the current second is already expired.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }
}
