// User profile and password routes
// Decision: A password change re-issues the caller's token; every older token
//           fails with session_superseded from then on

use axum::{extract::State, routing::get, routing::put, Json, Router};
use fitsync_core::{
    validation::validate_password, AuthResponse, ChangePasswordRequest, Profile,
    UpdateProfileRequest, ValidationError,
};

use super::{ApiError, ApiJson, ApiState};
use crate::auth::{AuthError, AuthUser};
use crate::storage::{
    password::{hash_password_async, verify_password_async},
    UpdateUser, UserRow,
};

/// Create users routes
pub fn routes(state: ApiState) -> Router {
    Router::new()
        .route("/api/users/profile", get(get_profile).put(update_profile))
        .route("/api/users/password", put(change_password))
        .with_state(state)
}

async fn load_user(state: &ApiState, user: &AuthUser) -> Result<UserRow, ApiError> {
    Ok(state
        .db
        .get_user(user.id)
        .await?
        .ok_or(AuthError::UserNotFound)?)
}

/// GET /api/users/profile - Current user's profile
#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses(
        (status = 200, description = "Profile of the authenticated user", body = Profile),
        (status = 401, description = "Unauthorized", body = fitsync_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_profile(
    State(state): State<ApiState>,
    user: AuthUser,
) -> Result<Json<Profile>, ApiError> {
    let row = load_user(&state, &user).await?;
    Ok(Json(row.profile()))
}

/// PUT /api/users/profile - Update display name
#[utoipa::path(
    put,
    path = "/api/users/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = Profile),
        (status = 400, description = "Invalid input", body = fitsync_core::ErrorResponse),
        (status = 401, description = "Unauthorized", body = fitsync_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_profile(
    State(state): State<ApiState>,
    user: AuthUser,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingField("name").into());
    }

    let row = state
        .db
        .update_user(
            user.id,
            UpdateUser {
                name: Some(name.to_string()),
                ..Default::default()
            },
        )
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(Json(row.profile()))
}

/// PUT /api/users/password - Change password and receive a fresh token
#[utoipa::path(
    put,
    path = "/api/users/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed, new token issued", body = AuthResponse),
        (status = 400, description = "Invalid new password", body = fitsync_core::ErrorResponse),
        (status = 401, description = "Current password is wrong or token rejected", body = fitsync_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn change_password(
    State(state): State<ApiState>,
    user: AuthUser,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    validate_password(&req.new_password)?;

    let row = load_user(&state, &user).await?;
    if !verify_password_async(req.current_password, row.password_hash).await? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let password_hash = hash_password_async(req.new_password).await?;
    let row = state
        .db
        .update_user(
            user.id,
            UpdateUser {
                password_hash: Some(password_hash),
                ..Default::default()
            },
        )
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let token = state.auth.jwt_service.issue(&row)?;
    tracing::info!(user_id = %row.id, "Password changed");

    Ok(Json(AuthResponse {
        token,
        user: row.summary(),
    }))
}
