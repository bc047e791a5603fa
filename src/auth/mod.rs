/// Authentication module
///
/// Access token issuance and verification, refresh token management,
/// password hashing, and the gate that ties them together.

mod claims;
mod gate;
mod jwt;
mod models;
mod password;
mod refresh_token;

pub use claims::Claims;
pub use gate::{AuthenticationGate, RegistrationRequest};
pub use jwt::AccessTokenIssuer;
pub use models::{NewUser, RefreshTokenRecord, TokenPair, UserIdentity};
pub use password::{validate_password_strength, BcryptPasswordHasher, PasswordHasher};
pub use refresh_token::{generate_refresh_token, RefreshTokenManager};
