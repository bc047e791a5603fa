/// Protected user routes
///
/// All handlers here run behind `JwtMiddleware`, which injects verified
/// `Claims`. Authorities are read from the stored identity.

use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::auth::{AuthenticationGate, Claims};
use crate::error::AppError;

/// Current user information
#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
}

/// GET /api/me
pub async fn get_current_user(
    claims: web::ReqData<Claims>,
    gate: web::Data<AuthenticationGate>,
) -> Result<HttpResponse, AppError> {
    let user = gate.current_user(&claims).await?;

    Ok(HttpResponse::Ok().json(UserResponse {
        id: user.id,
        roles: user.authorities().iter().map(|r| r.to_string()).collect(),
        username: user.username,
        email: user.email,
    }))
}

/// GET /api/user
///
/// Requires the `USER` authority.
pub async fn user_greeting(
    claims: web::ReqData<Claims>,
    gate: web::Data<AuthenticationGate>,
) -> Result<HttpResponse, AppError> {
    gate.authorize(&claims, "USER").await?;
    Ok(HttpResponse::Ok().body("Hello World!"))
}

/// GET /api/admin
///
/// Requires the `ADMIN` authority.
pub async fn admin_greeting(
    claims: web::ReqData<Claims>,
    gate: web::Data<AuthenticationGate>,
) -> Result<HttpResponse, AppError> {
    gate.authorize(&claims, "ADMIN").await?;
    Ok(HttpResponse::Ok().body("Hello Admin!"))
}
