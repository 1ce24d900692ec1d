// Error body shared by every FitSync endpoint

use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Machine-readable error kind carried in every error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed or incomplete input.
    ValidationError,
    /// No bearer token, or not in `Bearer <token>` shape.
    MissingToken,
    /// Token signature or format is invalid.
    InvalidToken,
    /// Token is past its expiry.
    ExpiredToken,
    /// Token subject no longer exists.
    UserNotFound,
    /// Password changed after the token was issued.
    SessionSuperseded,
    /// Unknown email or wrong password (deliberately indistinguishable).
    InvalidCredentials,
    /// Login attempts from this source are temporarily blocked.
    TooManyAttempts,
    /// Email already registered.
    UserAlreadyExists,
    /// Requested record does not exist (or is owned by someone else).
    NotFound,
    /// Unexpected server failure.
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "validation_error",
            ErrorCode::MissingToken => "missing_token",
            ErrorCode::InvalidToken => "invalid_token",
            ErrorCode::ExpiredToken => "expired_token",
            ErrorCode::UserNotFound => "user_not_found",
            ErrorCode::SessionSuperseded => "session_superseded",
            ErrorCode::InvalidCredentials => "invalid_credentials",
            ErrorCode::TooManyAttempts => "too_many_attempts",
            ErrorCode::UserAlreadyExists => "user_already_exists",
            ErrorCode::NotFound => "not_found",
            ErrorCode::InternalError => "internal_error",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standard error response for API endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ErrorResponse {
    /// Error kind.
    pub error: ErrorCode,
    /// Human-readable description of what went wrong.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
        }
    }
}
