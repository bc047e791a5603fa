/// Authentication Routes
///
/// Registration, login, token refresh and logout.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthenticationGate, RegistrationRequest, TokenPair};
use crate::error::{AppError, ErrorContext};

/// User registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Comma-separated authorities; defaults to `USER`
    pub roles: Option<String>,
}

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Refresh and logout request
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Authentication response with access and refresh tokens
#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl AuthResponse {
    fn bearer(pair: TokenPair, expires_in: i64) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

/// Registered user information (never includes the password hash)
#[derive(Serialize)]
pub struct RegisteredUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
}

/// POST /auth/register
///
/// # Errors
/// - 400: Validation errors (invalid username/email/password/roles)
/// - 409: Username or email already registered
/// - 503: Credential store unavailable
pub async fn register(
    form: web::Json<RegisterRequest>,
    gate: web::Data<AuthenticationGate>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let context = ErrorContext::new("user_registration").with_username(form.username.as_str());

    let user = gate
        .register(RegistrationRequest {
            username: form.username,
            email: form.email,
            password: form.password,
            roles: form.roles,
        })
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?;

    Ok(HttpResponse::Created().json(RegisteredUser {
        id: user.id,
        roles: user.authorities().iter().map(|r| r.to_string()).collect(),
        username: user.username,
        email: user.email,
    }))
}

/// POST /auth/login
///
/// # Errors
/// - 401: Invalid credentials (unknown user or wrong password, same body)
/// - 503: Credential store unavailable
pub async fn login(
    form: web::Json<LoginRequest>,
    gate: web::Data<AuthenticationGate>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login").with_username(form.username.as_str());

    let pair = gate
        .login(&form.username, &form.password)
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?;

    Ok(HttpResponse::Ok().json(AuthResponse::bearer(
        pair,
        gate.issuer().lifetime_seconds(),
    )))
}

/// POST /auth/refresh
///
/// Issues a new access token. The refresh token in the response is the one
/// that was sent.
///
/// # Errors
/// - 401: Unknown or expired refresh token (same body as a failed login)
/// - 503: Credential store unavailable
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    gate: web::Data<AuthenticationGate>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let pair = gate.refresh(&form.refresh_token).await.map_err(|e| {
        context.log_error(&e);
        e
    })?;

    Ok(HttpResponse::Ok().json(AuthResponse::bearer(
        pair,
        gate.issuer().lifetime_seconds(),
    )))
}

/// POST /auth/logout
///
/// Deletes the refresh token.
///
/// # Errors
/// - 401: Unknown refresh token
pub async fn logout(
    form: web::Json<RefreshRequest>,
    gate: web::Data<AuthenticationGate>,
) -> Result<HttpResponse, AppError> {
    gate.logout(&form.refresh_token).await?;
    Ok(HttpResponse::NoContent().finish())
}
