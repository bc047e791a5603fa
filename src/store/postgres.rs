//! PostgreSQL credential store
//!
//! Schema lives in `migrations/`. Refresh tokens are stored by digest only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{CredentialStore, StoredRefreshToken};
use crate::auth::{NewUser, UserIdentity};
use crate::error::StoreError;

type UserRow = (i64, String, String, String, String);

fn into_identity((id, username, password_hash, email, roles): UserRow) -> UserIdentity {
    UserIdentity {
        id,
        username,
        password_hash,
        email,
        roles,
    }
}

#[derive(Clone)]
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<UserIdentity>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, email, roles FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(into_identity))
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserIdentity>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, email, roles FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(into_identity))
    }

    async fn save_user(&self, user: NewUser) -> Result<UserIdentity, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (username, password_hash, email, roles, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(&user.roles)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(UserIdentity {
            id,
            username: user.username,
            password_hash: user.password_hash,
            email: user.email,
            roles: user.roles,
        })
    }

    async fn save_refresh_token(
        &self,
        token_hash: &str,
        user_id: i64,
        expiry_date: DateTime<Utc>,
    ) -> Result<StoredRefreshToken, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token_hash, user_id, expiry_date, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expiry_date)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let user = self
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| StoreError::Unexpected(format!("no user with id {}", user_id)))?;

        Ok(StoredRefreshToken {
            token_hash: token_hash.to_string(),
            user,
            expiry_date,
        })
    }

    async fn find_refresh_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<StoredRefreshToken>, StoreError> {
        let row = sqlx::query_as::<_, (i64, String, String, String, String, DateTime<Utc>)>(
            r#"
            SELECT u.id, u.username, u.password_hash, u.email, u.roles, t.expiry_date
            FROM refresh_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, username, password_hash, email, roles, expiry_date)| {
            StoredRefreshToken {
                token_hash: token_hash.to_string(),
                user: into_identity((id, username, password_hash, email, roles)),
                expiry_date,
            }
        }))
    }

    async fn delete_refresh_token(&self, token_hash: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_refresh_token_if_expired(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result =
            sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1 AND expiry_date < $2")
                .bind(token_hash)
                .bind(now)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
