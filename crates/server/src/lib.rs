// FitSync API server library
// Decision: Shared library for the binary and router-level tests

// API routes (users, records, health) and shared error handling
pub mod api;

// Authentication module
pub mod auth;

// Environment configuration
pub mod config;

// Storage layer
pub mod storage;

// OpenAPI spec generation
pub mod openapi;

use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::ApiState;
use crate::auth::AuthState;
use crate::config::ServerConfig;
use crate::openapi::ApiDoc;

/// All API routes, without transport layers
pub fn app(auth_state: AuthState) -> Router {
    let api_state = ApiState::new(auth_state.clone());

    Router::new()
        .merge(api::health::routes(auth_state.db.clone()))
        .merge(api::users::routes(api_state.clone()))
        .merge(api::exercises::routes(api_state.clone()))
        .merge(api::meals::routes(api_state.clone()))
        .merge(api::events::routes(api_state))
        .merge(auth::routes(auth_state))
}

/// Full router: API routes, Swagger UI, optional CORS, request tracing
pub fn router(auth_state: AuthState, config: &ServerConfig) -> Router {
    let app = app(auth_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    // Add CORS layer only if origins are configured
    let app = if !config.cors_origins.is_empty() {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(config.cors_origins.clone()))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::ORIGIN,
                ]),
        )
    } else {
        app
    };

    app.layer(TraceLayer::new_for_http())
}
