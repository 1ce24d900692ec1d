// Authentication middleware and extractors
// Decision: Bearer tokens only (the mobile client keeps its own token storage)
// Decision: Every branch that rejects a token is a 401 with a distinguishing code;
//           storage failures are 500s and never let the request through

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use fitsync_core::{ErrorCode, ErrorResponse, UserSummary};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::{
    config::AuthConfig,
    jwt::{fingerprint, JwtService, TokenError},
    rate_limit::LoginRateLimiter,
};
use crate::api::common::ApiError;
use crate::storage::{StorageBackend, UserRow};

/// Authentication and login-throttling failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("User no longer exists")]
    UserNotFound,

    #[error("Session is no longer valid, please log in again")]
    SessionSuperseded,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Too many login attempts, try again in {retry_after_secs} seconds")]
    TooManyAttempts { retry_after_secs: u64 },
}

impl AuthError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AuthError::MissingToken => ErrorCode::MissingToken,
            AuthError::InvalidToken => ErrorCode::InvalidToken,
            AuthError::ExpiredToken => ErrorCode::ExpiredToken,
            AuthError::UserNotFound => ErrorCode::UserNotFound,
            AuthError::SessionSuperseded => ErrorCode::SessionSuperseded,
            AuthError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AuthError::TooManyAttempts { .. } => ErrorCode::TooManyAttempts,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::TooManyAttempts { .. } => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::Invalid => AuthError::InvalidToken,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse::new(self.code(), self.to_string());
        let mut response = (status, Json(body)).into_response();

        if let AuthError::TooManyAttempts { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Authenticated user context extracted from request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// User ID
    pub id: Uuid,
    /// User name
    pub name: String,
    /// User email
    pub email: String,
}

impl From<&UserRow> for AuthUser {
    fn from(row: &UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name.clone(),
            email: row.email.clone(),
        }
    }
}

impl From<AuthUser> for UserSummary {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// Auth state shared across routes
#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub jwt_service: Arc<JwtService>,
    pub db: Arc<StorageBackend>,
    pub login_limiter: Arc<LoginRateLimiter>,
}

impl AuthState {
    pub fn new(config: AuthConfig, db: Arc<StorageBackend>) -> Self {
        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));
        let login_limiter = Arc::new(LoginRateLimiter::new(config.login_limit.clone()));
        Self {
            config,
            jwt_service,
            db,
            login_limiter,
        }
    }
}

/// Extractor for authenticated user
/// This is required - rejects with 401 if not authenticated
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        let token = bearer_token(&parts.headers)?;
        let user = authenticate(token, &auth_state).await?;
        Ok(AuthUser::from(&user))
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MissingToken)?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::MissingToken)?;

    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// Resolve a token to its current user row.
/// Verifies signature and expiry, that the subject still exists, and that the
/// password has not changed since the token was issued.
pub async fn authenticate(token: &str, auth_state: &AuthState) -> Result<UserRow, ApiError> {
    let claims = auth_state
        .jwt_service
        .verify(token)
        .map_err(AuthError::from)?;
    let user_id = claims.user_id().map_err(AuthError::from)?;

    let user = auth_state
        .db
        .get_user(user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load user for token: {}", e);
            ApiError::Internal(e)
        })?
        .ok_or(AuthError::UserNotFound)?;

    if claims.ver != fingerprint(&user.password_hash) {
        tracing::debug!(user_id = %user.id, "Rejected token issued before password change");
        return Err(AuthError::SessionSuperseded.into());
    }

    Ok(user)
}
