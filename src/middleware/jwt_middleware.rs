/// JWT Authentication Middleware
///
/// Validates access tokens from the Authorization header and injects
/// claims into request extensions for use by route handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::AccessTokenIssuer;
use crate::error::{AuthError, ErrorResponse};

/// JWT middleware for protecting routes
///
/// Missing, malformed, tampered and expired tokens all get the same 401.
pub struct JwtMiddleware {
    issuer: AccessTokenIssuer,
}

impl JwtMiddleware {
    pub fn new(issuer: AccessTokenIssuer) -> Self {
        Self { issuer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            issuer: self.issuer.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    issuer: AccessTokenIssuer,
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

fn unauthorized() -> Error {
    let body = ErrorResponse::unauthenticated(uuid::Uuid::new_v4().to_string());
    let response = HttpResponse::Unauthorized().json(body);
    actix_web::error::InternalError::from_response(AuthError::Unauthenticated, response).into()
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let verified = match bearer_token(&req) {
            None => {
                tracing::warn!(path = %req.path(), "Missing or invalid Authorization header");
                None
            }
            Some(token) => match self.issuer.verify(&token) {
                Ok(claims) => Some(claims),
                Err(e) => {
                    tracing::warn!(path = %req.path(), reason = %e, "Access token rejected");
                    None
                }
            },
        };

        match verified {
            Some(claims) => {
                tracing::debug!(subject = %claims.sub, "Access token validated");
                req.extensions_mut().insert(claims);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            None => Box::pin(async move { Err(unauthorized()) }),
        }
    }
}
