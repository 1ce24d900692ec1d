// Exercise log routes
// Decision: Records owned by another user are reported as not found

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use fitsync_core::{CreateExerciseRequest, DeleteResponse, Exercise, UpdateExerciseRequest};

use super::{parse_record_id, ApiError, ApiJson, ApiState};
use crate::auth::AuthUser;

const WHAT: &str = "Exercise";

/// Create exercise routes
pub fn routes(state: ApiState) -> Router {
    Router::new()
        .route("/api/exercises", get(list_exercises).post(create_exercise))
        .route(
            "/api/exercises/:id",
            put(update_exercise).delete(delete_exercise),
        )
        .with_state(state)
}

/// GET /api/exercises - List the caller's exercises, newest first
#[utoipa::path(
    get,
    path = "/api/exercises",
    responses(
        (status = 200, description = "Exercises of the authenticated user", body = Vec<Exercise>),
        (status = 401, description = "Unauthorized", body = fitsync_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "exercises"
)]
pub async fn list_exercises(
    State(state): State<ApiState>,
    user: AuthUser,
) -> Result<Json<Vec<Exercise>>, ApiError> {
    let rows = state.db.list_exercises(user.id).await?;
    Ok(Json(rows.into_iter().map(Exercise::from).collect()))
}

/// POST /api/exercises - Log an exercise
#[utoipa::path(
    post,
    path = "/api/exercises",
    request_body = CreateExerciseRequest,
    responses(
        (status = 201, description = "Exercise created", body = Exercise),
        (status = 400, description = "Invalid input", body = fitsync_core::ErrorResponse),
        (status = 401, description = "Unauthorized", body = fitsync_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "exercises"
)]
pub async fn create_exercise(
    State(state): State<ApiState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateExerciseRequest>,
) -> Result<(StatusCode, Json<Exercise>), ApiError> {
    req.validate()?;
    let row = state.db.create_exercise(user.id, req).await?;
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// PUT /api/exercises/:id - Update an exercise
#[utoipa::path(
    put,
    path = "/api/exercises/{id}",
    params(("id" = String, Path, description = "Exercise ID")),
    request_body = UpdateExerciseRequest,
    responses(
        (status = 200, description = "Exercise updated", body = Exercise),
        (status = 401, description = "Unauthorized", body = fitsync_core::ErrorResponse),
        (status = 404, description = "Exercise not found", body = fitsync_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "exercises"
)]
pub async fn update_exercise(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateExerciseRequest>,
) -> Result<Json<Exercise>, ApiError> {
    let id = parse_record_id(&id, WHAT)?;
    let row = state
        .db
        .update_exercise(id, user.id, req)
        .await?
        .ok_or(ApiError::NotFound(WHAT))?;
    Ok(Json(row.into()))
}

/// DELETE /api/exercises/:id - Delete an exercise
#[utoipa::path(
    delete,
    path = "/api/exercises/{id}",
    params(("id" = String, Path, description = "Exercise ID")),
    responses(
        (status = 200, description = "Exercise deleted", body = DeleteResponse),
        (status = 401, description = "Unauthorized", body = fitsync_core::ErrorResponse),
        (status = 404, description = "Exercise not found", body = fitsync_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "exercises"
)]
pub async fn delete_exercise(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_record_id(&id, WHAT)?;
    if !state.db.delete_exercise(id, user.id).await? {
        return Err(ApiError::NotFound(WHAT));
    }
    Ok(Json(DeleteResponse {
        message: "Exercise deleted".to_string(),
    }))
}
