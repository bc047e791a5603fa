/// Middleware module
///
/// Access token authentication for protected scopes.

mod jwt_middleware;

pub use jwt_middleware::JwtMiddleware;
