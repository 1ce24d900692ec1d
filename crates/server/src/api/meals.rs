// Meal log routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use fitsync_core::{CreateMealRequest, DeleteResponse, Meal, UpdateMealRequest};

use super::{parse_record_id, ApiError, ApiJson, ApiState};
use crate::auth::AuthUser;

const WHAT: &str = "Meal";

/// Create meal routes
pub fn routes(state: ApiState) -> Router {
    Router::new()
        .route("/api/meals", get(list_meals).post(create_meal))
        .route("/api/meals/:id", put(update_meal).delete(delete_meal))
        .with_state(state)
}

/// GET /api/meals - List the caller's meals, newest first
#[utoipa::path(
    get,
    path = "/api/meals",
    responses(
        (status = 200, description = "Meals of the authenticated user", body = Vec<Meal>),
        (status = 401, description = "Unauthorized", body = fitsync_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "meals"
)]
pub async fn list_meals(
    State(state): State<ApiState>,
    user: AuthUser,
) -> Result<Json<Vec<Meal>>, ApiError> {
    let rows = state.db.list_meals(user.id).await?;
    Ok(Json(rows.into_iter().map(Meal::from).collect()))
}

/// POST /api/meals - Log a meal
#[utoipa::path(
    post,
    path = "/api/meals",
    request_body = CreateMealRequest,
    responses(
        (status = 201, description = "Meal created", body = Meal),
        (status = 400, description = "Invalid input", body = fitsync_core::ErrorResponse),
        (status = 401, description = "Unauthorized", body = fitsync_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "meals"
)]
pub async fn create_meal(
    State(state): State<ApiState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateMealRequest>,
) -> Result<(StatusCode, Json<Meal>), ApiError> {
    req.validate()?;
    let row = state.db.create_meal(user.id, req).await?;
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// PUT /api/meals/:id - Update a meal
#[utoipa::path(
    put,
    path = "/api/meals/{id}",
    params(("id" = String, Path, description = "Meal ID")),
    request_body = UpdateMealRequest,
    responses(
        (status = 200, description = "Meal updated", body = Meal),
        (status = 401, description = "Unauthorized", body = fitsync_core::ErrorResponse),
        (status = 404, description = "Meal not found", body = fitsync_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "meals"
)]
pub async fn update_meal(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateMealRequest>,
) -> Result<Json<Meal>, ApiError> {
    let id = parse_record_id(&id, WHAT)?;
    let row = state
        .db
        .update_meal(id, user.id, req)
        .await?
        .ok_or(ApiError::NotFound(WHAT))?;
    Ok(Json(row.into()))
}

/// DELETE /api/meals/:id - Delete a meal
#[utoipa::path(
    delete,
    path = "/api/meals/{id}",
    params(("id" = String, Path, description = "Meal ID")),
    responses(
        (status = 200, description = "Meal deleted", body = DeleteResponse),
        (status = 401, description = "Unauthorized", body = fitsync_core::ErrorResponse),
        (status = 404, description = "Meal not found", body = fitsync_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "meals"
)]
pub async fn delete_meal(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_record_id(&id, WHAT)?;
    if !state.db.delete_meal(id, user.id).await? {
        return Err(ApiError::NotFound(WHAT));
    }
    Ok(Json(DeleteResponse {
        message: "Meal deleted".to_string(),
    }))
}
