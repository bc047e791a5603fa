/// Access Token Issuer
///
/// Creates and verifies signed, self-contained, short-lived access tokens.
/// Signing uses HS256 with the process-wide secret from `JwtSettings`; the
/// key material is held only inside the jsonwebtoken key types.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::error::{AppError, TokenError};

#[derive(Clone)]
pub struct AccessTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    lifetime_seconds: i64,
}

impl AccessTokenIssuer {
    pub fn new(config: &JwtSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        // Expiry is checked by hand after the signature so that the boundary
        // second counts as expired.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
            lifetime_seconds: config.access_token_expiry,
        }
    }

    /// Access token lifetime in seconds
    pub fn lifetime_seconds(&self) -> i64 {
        self.lifetime_seconds
    }

    /// Issue a new access token for `subject`
    ///
    /// # Errors
    /// Returns error if the expiry overflows or token signing fails
    pub fn issue(&self, subject: &str) -> Result<String, AppError> {
        let claims = Claims::new(subject, self.lifetime_seconds, &self.issuer)?;
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Verify a token and return its claims
    ///
    /// Signature integrity is checked first, expiry second. The detailed
    /// `TokenError` is for logging only; it converts into the opaque
    /// `AuthError::Unauthenticated` at the boundary.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let kind = match e.kind() {
                    ErrorKind::InvalidSignature
                    | ErrorKind::InvalidAlgorithm
                    | ErrorKind::InvalidIssuer => TokenError::InvalidSignature,
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Malformed,
                };
                tracing::debug!(error = %e, "Access token rejected");
                kind
            })?;

        if claims.is_expired() {
            tracing::debug!(subject = %claims.sub, "Access token expired");
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
