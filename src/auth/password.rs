/// Password Hashing and Verification
///
/// The authentication core only sees the `PasswordHasher` capability;
/// `BcryptPasswordHasher` is the production implementation.

use bcrypt::{hash, verify};

use crate::error::{AppError, ValidationError};

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 72; // bcrypt only reads the first 72 bytes

/// Password hashing capability
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, AppError>;
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError>;
}

#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl PasswordHasher for BcryptPasswordHasher {
    fn hash(&self, password: &str) -> Result<String, AppError> {
        hash(password, self.cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        verify(password, hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
    }
}

/// Validate password strength requirements
///
/// Requirements:
/// - 8 to 72 characters
/// - At least one digit
/// - At least one lowercase letter
/// - At least one uppercase letter
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort(
            "password".to_string(),
            MIN_PASSWORD_LENGTH,
        ));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_LENGTH,
        ));
    }

    let has_digit = password.chars().any(|c| c.is_numeric());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());

    if !has_digit || !has_lowercase || !has_uppercase {
        return Err(ValidationError::InvalidFormat(
            "password must contain at least one digit, one lowercase letter, and one uppercase letter"
                .to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Lowest cost bcrypt accepts; keeps the suite fast
    const TEST_COST: u32 = 4;

    fn hasher() -> BcryptPasswordHasher {
        BcryptPasswordHasher::new(TEST_COST)
    }

    #[test]
    fn test_hash_password() {
        let password = "ValidPassword123";
        let hash = hasher().hash(password).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn test_verify_password() {
        let hash = hasher().hash("ValidPassword123").expect("Failed to hash password");

        assert!(hasher().verify("ValidPassword123", &hash).unwrap());
        assert!(!hasher().verify("WrongPassword123", &hash).unwrap());
    }

    #[test]
    fn test_verify_against_garbage_hash_is_error() {
        assert!(hasher().verify("ValidPassword123", "not-a-hash").is_err());
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password_strength("ValidPassword123").is_ok());
        assert!(validate_password_strength("Short1").is_err());
        assert!(validate_password_strength(&("Aa1".to_string() + &"a".repeat(70))).is_err());
        assert!(validate_password_strength("NoDigitsPassword").is_err());
        assert!(validate_password_strength("NOLOWERCASE1").is_err());
        assert!(validate_password_strength("nouppercase1").is_err());
    }
}
