/// Authentication Gate
///
/// Orchestrates password verification, access token issuance and refresh
/// token handling. This is the only surface the HTTP layer talks to.

use std::sync::Arc;

use crate::auth::claims::Claims;
use crate::auth::jwt::AccessTokenIssuer;
use crate::auth::models::{NewUser, TokenPair, UserIdentity};
use crate::auth::password::{validate_password_strength, PasswordHasher};
use crate::auth::refresh_token::RefreshTokenManager;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, ConfigError};
use crate::store::CredentialStore;
use crate::validators::{is_valid_email, is_valid_username, normalize_roles};

/// Registration input as received from the caller
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub roles: Option<String>,
}

#[derive(Clone)]
pub struct AuthenticationGate {
    store: Arc<dyn CredentialStore>,
    issuer: AccessTokenIssuer,
    refresh_tokens: RefreshTokenManager,
    passwords: Arc<dyn PasswordHasher>,
    /// Hash checked against when the username is unknown, so that unknown
    /// users and wrong passwords cost the same time
    dummy_hash: String,
}

impl AuthenticationGate {
    /// # Errors
    /// `AppError::Config` if the refresh lifetime is out of range or the
    /// password hasher cannot produce a hash with its settings
    pub fn new(
        store: Arc<dyn CredentialStore>,
        jwt_config: &JwtSettings,
        passwords: Arc<dyn PasswordHasher>,
    ) -> Result<Self, AppError> {
        let dummy_hash = passwords.hash("timing-equalizer-Passw0rd").map_err(|e| {
            ConfigError::InvalidValue(format!("password hasher is unusable: {}", e))
        })?;
        Ok(Self {
            issuer: AccessTokenIssuer::new(jwt_config),
            refresh_tokens: RefreshTokenManager::new(store.clone(), jwt_config)?,
            store,
            passwords,
            dummy_hash,
        })
    }

    pub fn issuer(&self) -> &AccessTokenIssuer {
        &self.issuer
    }

    pub fn refresh_tokens(&self) -> &RefreshTokenManager {
        &self.refresh_tokens
    }

    /// Exchange a username and password for a token pair
    ///
    /// # Errors
    /// - `AuthError::BadCredentials` for an unknown user or a wrong password,
    ///   without saying which
    /// - `AppError::Store` if the store fails
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AppError> {
        let user = self.store.find_user_by_username(username).await?;

        let authenticated = match &user {
            Some(user) => self.check_password(password, &user.password_hash),
            None => {
                let _ = self.check_password(password, &self.dummy_hash);
                false
            }
        };

        let user = match user {
            Some(user) if authenticated => user,
            _ => {
                tracing::warn!(username = %username, "Login rejected");
                return Err(AuthError::BadCredentials.into());
            }
        };

        let access_token = self.issuer.issue(&user.username)?;
        let refresh_token = self.refresh_tokens.create(&user.username).await?;

        tracing::info!(username = %user.username, "User logged in");

        Ok(TokenPair {
            access_token,
            refresh_token: refresh_token.token,
        })
    }

    /// A stored hash that bcrypt cannot parse counts as a failed check
    fn check_password(&self, password: &str, hash: &str) -> bool {
        match self.passwords.verify(password, hash) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::error!(error = %e, "Password verification failed");
                false
            }
        }
    }

    /// Exchange a refresh token for a new access token
    ///
    /// The refresh token is not rotated: the same string comes back until it
    /// expires.
    ///
    /// # Errors
    /// - `AuthError::RefreshTokenNotFound` for an unknown token
    /// - `AuthError::RefreshTokenExpired` for an expired token, which has
    ///   been deleted by the time this returns
    /// - `AppError::Store` if the store fails
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let record = self
            .refresh_tokens
            .find_by_token(refresh_token)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Refresh token not found");
                AppError::Auth(AuthError::RefreshTokenNotFound)
            })?;

        let record = self.refresh_tokens.verify_expiration(record).await?;
        let access_token = self.issuer.issue(&record.user.username)?;

        tracing::info!(username = %record.user.username, "Access token refreshed");

        Ok(TokenPair {
            access_token,
            refresh_token: record.token,
        })
    }

    /// Delete a single refresh token
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AppError> {
        if self.refresh_tokens.revoke(refresh_token).await? {
            tracing::info!("Refresh token revoked");
            Ok(())
        } else {
            Err(AuthError::RefreshTokenNotFound.into())
        }
    }

    /// Validate, hash and store a new user
    pub async fn register(&self, request: RegistrationRequest) -> Result<UserIdentity, AppError> {
        let username = is_valid_username(&request.username)?;
        let email = is_valid_email(&request.email)?;
        let roles = normalize_roles(request.roles.as_deref())?;
        validate_password_strength(&request.password)?;

        let password_hash = self.passwords.hash(&request.password)?;
        let user = self
            .store
            .save_user(NewUser {
                username,
                password_hash,
                email,
                roles,
            })
            .await?;

        tracing::info!(username = %user.username, roles = %user.roles, "User registered");
        Ok(user)
    }

    /// Verify an access token, collapsing every failure into one signal
    pub fn authenticate(&self, access_token: &str) -> Result<Claims, AuthError> {
        self.issuer.verify(access_token).map_err(|e| {
            tracing::debug!(reason = %e, "Access token verification failed");
            AuthError::from(e)
        })
    }

    /// Load the caller's identity and require `authority` among its roles
    pub async fn authorize(&self, claims: &Claims, authority: &str) -> Result<UserIdentity, AppError> {
        let user = self.current_user(claims).await?;
        if !user.has_authority(authority) {
            tracing::warn!(username = %user.username, authority = authority, "Authority missing");
            return Err(AuthError::InsufficientAuthority.into());
        }
        Ok(user)
    }

    /// Load the identity named by verified claims
    pub async fn current_user(&self, claims: &Claims) -> Result<UserIdentity, AppError> {
        self.store
            .find_user_by_username(&claims.sub)
            .await?
            .ok_or(AppError::Auth(AuthError::Unauthenticated))
    }
}
