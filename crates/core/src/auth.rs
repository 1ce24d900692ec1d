// Auth endpoint payloads
//
// Request bodies for /api/auth/* and /api/users/*, and the token-bearing
// responses the session client persists.

use serde::{Deserialize, Serialize};

use crate::user::UserSummary;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Body of `POST /api/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct RegisterRequest {
    #[cfg_attr(feature = "openapi", schema(example = "Ada Lovelace"))]
    pub name: String,
    #[cfg_attr(feature = "openapi", schema(example = "ada@example.com"))]
    pub email: String,
    /// Plaintext password, at least 6 characters.
    pub password: String,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct LoginRequest {
    #[cfg_attr(feature = "openapi", schema(example = "ada@example.com"))]
    pub email: String,
    pub password: String,
}

/// Successful register/login/password-change response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AuthResponse {
    /// Signed session token, sent back as `Authorization: Bearer <token>`.
    pub token: String,
    pub user: UserSummary,
}

/// Response of `GET /api/auth/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct VerifyResponse {
    pub valid: bool,
    pub user: UserSummary,
}

/// Response of `POST /api/auth/logout`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct LogoutResponse {
    pub message: String,
}

/// Body of `PUT /api/users/profile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UpdateProfileRequest {
    pub name: String,
}

/// Body of `PUT /api/users/password`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_rejects_non_object() {
        // A bare email string is not a register request
        let result: Result<RegisterRequest, _> = serde_json::from_str(r#""ada@example.com""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_login_request_requires_both_fields() {
        let result: Result<LoginRequest, _> =
            serde_json::from_str(r#"{"email": "ada@example.com"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_change_password_request_wire_names() {
        let req: ChangePasswordRequest = serde_json::from_str(
            r#"{"currentPassword": "secret1", "newPassword": "secret2"}"#,
        )
        .unwrap();
        assert_eq!(req.current_password, "secret1");
        assert_eq!(req.new_password, "secret2");
    }
}
