// Health endpoint (unauthenticated)

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::storage::StorageBackend;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Active storage backend ("postgres" or "memory")
    pub storage: String,
}

/// Create health routes
pub fn routes(db: Arc<StorageBackend>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .with_state(db)
}

/// GET /api/health - Liveness check
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health(State(db): State<Arc<StorageBackend>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: db.kind().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{body_json, request, send};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health() {
        let app = routes(Arc::new(StorageBackend::in_memory()));
        let response = send(&app, request("GET", "/api/health", None, None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["storage"], "memory");
    }
}
