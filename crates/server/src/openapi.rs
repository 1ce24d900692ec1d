// OpenAPI specification generation
//
// Served by Swagger UI at /swagger-ui, document at /api-doc/openapi.json.

use crate::api;
use crate::auth;
use fitsync_core::{
    AuthResponse, ChangePasswordRequest, CreateEventRequest, CreateExerciseRequest,
    CreateMealRequest, DeleteResponse, ErrorCode, ErrorResponse, Event, Exercise, LoginRequest,
    LogoutResponse, Meal, Profile, RegisterRequest, UpdateEventRequest, UpdateExerciseRequest,
    UpdateMealRequest, UpdateProfileRequest, UserSummary, VerifyResponse,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Registers the bearer token scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI documentation for the FitSync API
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    paths(
        auth::routes::register,
        auth::routes::login,
        auth::routes::logout,
        auth::routes::verify,
        api::users::get_profile,
        api::users::update_profile,
        api::users::change_password,
        api::exercises::list_exercises,
        api::exercises::create_exercise,
        api::exercises::update_exercise,
        api::exercises::delete_exercise,
        api::meals::list_meals,
        api::meals::create_meal,
        api::meals::update_meal,
        api::meals::delete_meal,
        api::events::list_events,
        api::events::create_event,
        api::events::update_event,
        api::events::delete_event,
        api::health::health,
    ),
    components(
        schemas(
            RegisterRequest, LoginRequest, AuthResponse, VerifyResponse, LogoutResponse,
            UserSummary, Profile, UpdateProfileRequest, ChangePasswordRequest,
            ErrorResponse, ErrorCode,
            Exercise, CreateExerciseRequest, UpdateExerciseRequest,
            Meal, CreateMealRequest, UpdateMealRequest,
            Event, CreateEventRequest, UpdateEventRequest,
            DeleteResponse,
            api::health::HealthResponse,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and token verification"),
        (name = "users", description = "Profile and password management"),
        (name = "exercises", description = "Exercise log"),
        (name = "meals", description = "Meal log"),
        (name = "events", description = "Schedule events"),
        (name = "health", description = "Liveness check")
    ),
    info(
        title = "FitSync API",
        description = "Accounts, stateless sessions and fitness records for the FitSync app",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_auth_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/register",
            "/api/auth/login",
            "/api/auth/logout",
            "/api/auth/verify",
            "/api/users/password",
            "/api/exercises/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
