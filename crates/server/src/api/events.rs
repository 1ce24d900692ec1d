// Schedule event routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use fitsync_core::{CreateEventRequest, DeleteResponse, Event, UpdateEventRequest};

use super::{parse_record_id, ApiError, ApiJson, ApiState};
use crate::auth::AuthUser;

const WHAT: &str = "Event";

/// Create event routes
pub fn routes(state: ApiState) -> Router {
    Router::new()
        .route("/api/events", get(list_events).post(create_event))
        .route("/api/events/:id", put(update_event).delete(delete_event))
        .with_state(state)
}

/// GET /api/events - List the caller's events by start time
#[utoipa::path(
    get,
    path = "/api/events",
    responses(
        (status = 200, description = "Events of the authenticated user", body = Vec<Event>),
        (status = 401, description = "Unauthorized", body = fitsync_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "events"
)]
pub async fn list_events(
    State(state): State<ApiState>,
    user: AuthUser,
) -> Result<Json<Vec<Event>>, ApiError> {
    let rows = state.db.list_events(user.id).await?;
    Ok(Json(rows.into_iter().map(Event::from).collect()))
}

/// POST /api/events - Schedule an event
#[utoipa::path(
    post,
    path = "/api/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, description = "Invalid input", body = fitsync_core::ErrorResponse),
        (status = 401, description = "Unauthorized", body = fitsync_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "events"
)]
pub async fn create_event(
    State(state): State<ApiState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    req.validate()?;
    let row = state.db.create_event(user.id, req).await?;
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// PUT /api/events/:id - Update an event
#[utoipa::path(
    put,
    path = "/api/events/{id}",
    params(("id" = String, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = Event),
        (status = 401, description = "Unauthorized", body = fitsync_core::ErrorResponse),
        (status = 404, description = "Event not found", body = fitsync_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "events"
)]
pub async fn update_event(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateEventRequest>,
) -> Result<Json<Event>, ApiError> {
    let id = parse_record_id(&id, WHAT)?;
    let row = state
        .db
        .update_event(id, user.id, req)
        .await?
        .ok_or(ApiError::NotFound(WHAT))?;
    Ok(Json(row.into()))
}

/// DELETE /api/events/:id - Delete an event
#[utoipa::path(
    delete,
    path = "/api/events/{id}",
    params(("id" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event deleted", body = DeleteResponse),
        (status = 401, description = "Unauthorized", body = fitsync_core::ErrorResponse),
        (status = 404, description = "Event not found", body = fitsync_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "events"
)]
pub async fn delete_event(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_record_id(&id, WHAT)?;
    if !state.db.delete_event(id, user.id).await? {
        return Err(ApiError::NotFound(WHAT));
    }
    Ok(Json(DeleteResponse {
        message: "Event deleted".to_string(),
    }))
}
