// Input validation for auth payloads
// Decision: Simple pattern match for email shape, no deliverability checks

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

use crate::auth::RegisterRequest;

/// Minimum accepted password length (in characters).
pub const MIN_PASSWORD_LEN: usize = 6;

/// Validation failures for auth input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,

    #[error("Email address is not valid")]
    InvalidEmail,

    #[error("Malformed request body: {0}")]
    MalformedBody(String),
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

/// Canonical form of an email: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check the email shape (after normalization).
pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(&normalize_email(email))
}

/// Validate a password against the length policy.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::MissingField("password"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// Validate a registration request.
/// Checks run in order: presence of all fields, password length, email shape.
pub fn validate_registration(req: &RegisterRequest) -> Result<(), ValidationError> {
    if req.name.trim().is_empty() {
        return Err(ValidationError::MissingField("name"));
    }
    if req.email.trim().is_empty() {
        return Err(ValidationError::MissingField("email"));
    }
    validate_password(&req.password)?;
    if !is_valid_email(&req.email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  A@B.Com "), "a@b.com");
        assert_eq!(normalize_email("a@b.com"), "a@b.com");
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email(" Ada.Lovelace@Example.ORG "));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("ab.com"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a@@b.com"));
    }

    #[test]
    fn test_valid_registration() {
        assert_eq!(
            validate_registration(&request("Ada", "a@b.com", "secret1")),
            Ok(())
        );
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(
            validate_registration(&request("  ", "a@b.com", "secret1")),
            Err(ValidationError::MissingField("name"))
        );
        assert_eq!(
            validate_registration(&request("Ada", "", "secret1")),
            Err(ValidationError::MissingField("email"))
        );
        assert_eq!(
            validate_registration(&request("Ada", "a@b.com", "")),
            Err(ValidationError::MissingField("password"))
        );
    }

    #[test]
    fn test_short_password() {
        assert_eq!(
            validate_registration(&request("Ada", "a@b.com", "12345")),
            Err(ValidationError::PasswordTooShort)
        );
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn test_invalid_email() {
        assert_eq!(
            validate_registration(&request("Ada", "not-an-email", "secret1")),
            Err(ValidationError::InvalidEmail)
        );
    }
}
