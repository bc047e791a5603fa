/// Authentication data model
///
/// User identities, refresh token records and the token pair handed back
/// to callers.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A registered user
#[derive(Debug, Clone, PartialEq)]
pub struct UserIdentity {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    /// Comma-separated authority list, e.g. `USER,ADMIN`
    pub roles: String,
}

impl UserIdentity {
    /// Split the stored role list into individual authorities
    pub fn authorities(&self) -> Vec<&str> {
        self.roles
            .split(',')
            .map(str::trim)
            .filter(|role| !role.is_empty())
            .collect()
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities().iter().any(|a| *a == authority)
    }
}

/// A user that has been validated and hashed but not yet persisted
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub roles: String,
}

/// Long-lived refresh token owned by a user
///
/// `token` is the plaintext handed to the client. The store only ever sees
/// its digest.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub user: UserIdentity,
    pub expiry_date: DateTime<Utc>,
}

impl RefreshTokenRecord {
    /// Strictly before: a record expiring exactly now is still active
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date < now
    }
}

/// Access token plus refresh token returned by login and refresh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(roles: &str) -> UserIdentity {
        UserIdentity {
            id: 1,
            username: "alice".to_string(),
            password_hash: "hash".to_string(),
            email: "alice@example.com".to_string(),
            roles: roles.to_string(),
        }
    }

    #[test]
    fn test_authorities_are_split_and_trimmed() {
        let user = user("USER, ADMIN");
        assert_eq!(user.authorities(), vec!["USER", "ADMIN"]);
        assert!(user.has_authority("ADMIN"));
        assert!(!user.has_authority("ROOT"));
    }

    #[test]
    fn test_record_expiry_is_strict() {
        let now = Utc::now();
        let mut record = RefreshTokenRecord {
            token: "t".to_string(),
            user: user("USER"),
            expiry_date: now,
        };
        assert!(!record.is_expired_at(now));

        record.expiry_date = now - Duration::minutes(1);
        assert!(record.is_expired_at(now));
    }
}
