// Client-side error taxonomy
// Decision: Transport errors never escape raw; every failure is one of these kinds

use fitsync_core::{ErrorCode, ErrorResponse};
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Rejected input (400), either by the server or a local pre-check
    #[error("Validation error: {0}")]
    Validation(String),

    /// Credential or token rejected (401)
    #[error("Authentication failed ({code}): {message}")]
    Auth { code: ErrorCode, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    /// Email already registered (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Too many login attempts (429)
    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after_secs: Option<u64>,
    },

    /// Server unreachable or connection dropped
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    /// Server-side failure or a response the client could not understand
    #[error("Server error: {0}")]
    Internal(String),

    /// Durable session storage failed
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ClientError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Timeout)
    }

    /// Server-side error code, when the failure came with one
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ClientError::Auth { code, .. } => Some(*code),
            ClientError::Validation(_) => Some(ErrorCode::ValidationError),
            ClientError::NotFound(_) => Some(ErrorCode::NotFound),
            ClientError::Conflict(_) => Some(ErrorCode::UserAlreadyExists),
            ClientError::RateLimited { .. } => Some(ErrorCode::TooManyAttempts),
            _ => None,
        }
    }

    /// Map a non-success response to an error kind.
    /// `body` is the raw response text; the `{error, message}` shape is used when present.
    pub fn from_response(status: StatusCode, body: &str, retry_after_secs: Option<u64>) -> Self {
        let parsed: Option<ErrorResponse> = serde_json::from_str(body).ok();
        let message = parsed
            .as_ref()
            .map(|e| e.message.clone())
            .unwrap_or_else(|| {
                if body.is_empty() {
                    status.canonical_reason().unwrap_or("Request failed").to_string()
                } else {
                    body.to_string()
                }
            });

        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Validation(message)
            }
            StatusCode::UNAUTHORIZED => ClientError::Auth {
                code: parsed.map(|e| e.error).unwrap_or(ErrorCode::InvalidToken),
                message,
            },
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::CONFLICT => ClientError::Conflict(message),
            StatusCode::TOO_MANY_REQUESTS => ClientError::RateLimited {
                message,
                retry_after_secs,
            },
            _ => ClientError::Internal(message),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::Internal(format!("Malformed response: {}", err))
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<fitsync_core::ValidationError> for ClientError {
    fn from(err: fitsync_core::ValidationError) -> Self {
        ClientError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_error_body() {
        let body = r#"{"error":"session_superseded","message":"Session is no longer valid"}"#;
        let err = ClientError::from_response(StatusCode::UNAUTHORIZED, body, None);
        assert_eq!(
            err,
            ClientError::Auth {
                code: ErrorCode::SessionSuperseded,
                message: "Session is no longer valid".to_string(),
            }
        );
    }

    #[test]
    fn test_maps_statuses() {
        assert!(matches!(
            ClientError::from_response(StatusCode::CONFLICT, "", None),
            ClientError::Conflict(_)
        ));
        assert_eq!(
            ClientError::from_response(StatusCode::TOO_MANY_REQUESTS, "", Some(30)),
            ClientError::RateLimited {
                message: "Too Many Requests".to_string(),
                retry_after_secs: Some(30),
            }
        );
        assert_eq!(
            ClientError::from_response(StatusCode::BAD_GATEWAY, "upstream down", None),
            ClientError::Internal("upstream down".to_string())
        );
    }

    #[test]
    fn test_unparseable_401_is_invalid_token() {
        let err = ClientError::from_response(StatusCode::UNAUTHORIZED, "nope", None);
        assert_eq!(err.code(), Some(ErrorCode::InvalidToken));
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ClientError::Timeout.is_retryable());
        assert!(ClientError::Network("reset".to_string()).is_retryable());
        assert!(!ClientError::Internal("boom".to_string()).is_retryable());
        assert!(!ClientError::Auth {
            code: ErrorCode::ExpiredToken,
            message: String::new(),
        }
        .is_retryable());
    }
}
