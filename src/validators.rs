/// Input validators for registration
///
/// 1. DoS protection: input length limits
/// 2. Format checks for usernames and email addresses
/// 3. Role list normalization

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_USERNAME_LENGTH: usize = 64;
const MIN_USERNAME_LENGTH: usize = 3;
const MAX_ROLE_LENGTH: usize = 32;

pub const DEFAULT_ROLE: &str = "USER";

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9_.-]+$").unwrap();

    static ref ROLE_REGEX: Regex = Regex::new(r"^[A-Z][A-Z0-9_]*$").unwrap();
}

/// Validates an email address and returns it trimmed
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    // Local part longer than 64 characters is not deliverable
    if let Some(at_pos) = trimmed.find('@') {
        if at_pos > 64 {
            return Err(ValidationError::SuspiciousContent("email".to_string()));
        }
    }

    Ok(trimmed.to_string())
}

/// Validates a username and returns it trimmed
pub fn is_valid_username(username: &str) -> Result<String, ValidationError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()));
    }

    if trimmed.len() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::TooShort("username".to_string(), MIN_USERNAME_LENGTH));
    }

    if trimmed.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong("username".to_string(), MAX_USERNAME_LENGTH));
    }

    if !USERNAME_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("username".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Normalizes a comma-separated role list
///
/// Roles are trimmed, upper-cased and de-duplicated. An absent or blank list
/// becomes `USER`, so a stored identity always has at least one authority.
pub fn normalize_roles(roles: Option<&str>) -> Result<String, ValidationError> {
    let mut normalized: Vec<String> = Vec::new();

    for role in roles.unwrap_or("").split(',') {
        let role = role.trim().to_uppercase();
        if role.is_empty() {
            continue;
        }
        if role.len() > MAX_ROLE_LENGTH {
            return Err(ValidationError::TooLong("role".to_string(), MAX_ROLE_LENGTH));
        }
        if !ROLE_REGEX.is_match(&role) {
            return Err(ValidationError::InvalidFormat("role".to_string()));
        }
        if !normalized.contains(&role) {
            normalized.push(role);
        }
    }

    if normalized.is_empty() {
        normalized.push(DEFAULT_ROLE.to_string());
    }

    Ok(normalized.join(","))
}
