// Authentication HTTP routes
// Decision: Use /api/auth/* prefix, the path the mobile client already speaks
// Decision: Tokens are stateless, so logout only acknowledges; the client drops its copy
// Decision: Login failures are indistinguishable (same status, code and message)

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use fitsync_core::{
    normalize_email, validation::validate_registration, AuthResponse, LoginRequest,
    LogoutResponse, RegisterRequest, ValidationError, VerifyResponse,
};
use tokio::sync::OnceCell;

use super::{
    middleware::{AuthError, AuthState, AuthUser},
    rate_limit::ClientIp,
};
use crate::api::common::{ApiError, ApiJson};
use crate::storage::{
    password::{hash_password_async, verify_password_async},
    CreateUserRow, StorageError,
};

/// Hash compared against when the email is unknown, so both login failure
/// paths pay for one Argon2 verification
static DUMMY_HASH: OnceCell<String> = OnceCell::const_new();

/// Create auth routes
pub fn routes(state: AuthState) -> Router {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/verify", get(verify))
        .with_state(state)
}

/// POST /api/auth/register - Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Invalid input", body = fitsync_core::ErrorResponse),
        (status = 409, description = "Email already registered", body = fitsync_core::ErrorResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AuthState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    validate_registration(&req)?;
    let email = normalize_email(&req.email);

    // Fast path only; the store's uniqueness constraint is authoritative
    if state.db.get_user_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict);
    }

    let password_hash = hash_password_async(req.password).await?;

    let user = state
        .db
        .create_user(CreateUserRow {
            name: req.name.trim().to_string(),
            email,
            password_hash,
        })
        .await
        .map_err(|e| {
            if StorageError::is_duplicate_email(&e) {
                ApiError::Conflict
            } else {
                ApiError::Internal(e)
            }
        })?;

    let token = state.jwt_service.issue(&user)?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.summary(),
        }),
    ))
}

/// POST /api/auth/login - Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Invalid input", body = fitsync_core::ErrorResponse),
        (status = 401, description = "Invalid email or password", body = fitsync_core::ErrorResponse),
        (status = 429, description = "Too many failed attempts", body = fitsync_core::ErrorResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AuthState>,
    ClientIp(source): ClientIp,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = normalize_email(&req.email);
    if email.is_empty() {
        return Err(ValidationError::MissingField("email").into());
    }
    if req.password.is_empty() {
        return Err(ValidationError::MissingField("password").into());
    }

    // The reserved slot stays counted unless the login succeeds
    if let Err(retry_after) = state.login_limiter.try_acquire(&source) {
        tracing::warn!(source = %source, "Login blocked by rate limit");
        return Err(AuthError::TooManyAttempts {
            retry_after_secs: retry_after.as_secs().max(1),
        }
        .into());
    }

    let user = state.db.get_user_by_email(&email).await?;

    let verified = match &user {
        Some(user) => verify_password_async(req.password, user.password_hash.clone()).await?,
        None => {
            if let Ok(dummy) = DUMMY_HASH
                .get_or_try_init(|| hash_password_async("fitsync-dummy-password".to_string()))
                .await
            {
                let _ = verify_password_async(req.password, dummy.clone()).await;
            }
            false
        }
    };

    let user = match user {
        Some(user) if verified => user,
        _ => {
            tracing::debug!(source = %source, "Failed login attempt");
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    state.login_limiter.reset(&source);
    let token = state.jwt_service.issue(&user)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        token,
        user: user.summary(),
    }))
}

/// POST /api/auth/logout - Acknowledge logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = LogoutResponse)
    ),
    tag = "auth"
)]
pub async fn logout() -> Json<LogoutResponse> {
    Json(LogoutResponse {
        message: "Logged out".to_string(),
    })
}

/// GET /api/auth/verify - Check the presented token
#[utoipa::path(
    get,
    path = "/api/auth/verify",
    responses(
        (status = 200, description = "Token is valid", body = VerifyResponse),
        (status = 401, description = "Token missing, invalid, expired or superseded", body = fitsync_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn verify(user: AuthUser) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        valid: true,
        user: user.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::config::AuthConfig;
    use crate::storage::{StorageBackend, UpdateUser};
    use axum::{body::Body, http::Request, response::Response};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AuthState {
        AuthState::new(
            AuthConfig::with_secret("routes-test-secret"),
            Arc::new(StorageBackend::in_memory()),
        )
    }

    fn post_json(uri: &str, body: Value, source: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-forwarded-for", source)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with_token(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn register_ada(state: &AuthState) -> Value {
        let response = routes(state.clone())
            .oneshot(post_json(
                "/api/auth/register",
                json!({"name": "Ada", "email": "a@b.com", "password": "secret1"}),
                "10.0.0.1",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }

    #[tokio::test]
    async fn test_register_then_verify() {
        let state = test_state();
        let body = register_ada(&state).await;
        assert_eq!(body["user"]["email"], "a@b.com");
        assert!(body["user"].get("password").is_none());

        let token = body["token"].as_str().unwrap();
        let response = routes(state)
            .oneshot(get_with_token("/api/auth/verify", token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let verified = body_json(response).await;
        assert_eq!(verified["valid"], true);
        assert_eq!(verified["user"]["id"], body["user"]["id"]);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let state = test_state();
        let cases = [
            json!({"name": "", "email": "a@b.com", "password": "secret1"}),
            json!({"name": "Ada", "email": "a@b.com", "password": "short"}),
            json!({"name": "Ada", "email": "not-an-email", "password": "secret1"}),
            json!({"name": "Ada", "email": "a@b.com"}),
            json!("a@b.com"),
        ];

        for case in cases {
            let response = routes(state.clone())
                .oneshot(post_json("/api/auth/register", case.clone(), "10.0.0.1"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", case);
            assert_eq!(body_json(response).await["error"], "validation_error");
        }
    }

    #[tokio::test]
    async fn test_duplicate_register_differing_in_case() {
        let state = test_state();
        register_ada(&state).await;

        let response = routes(state.clone())
            .oneshot(post_json(
                "/api/auth/register",
                json!({"name": "Other", "email": "  A@B.COM ", "password": "secret2"}),
                "10.0.0.1",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["error"], "user_already_exists");

        let stored = state.db.get_user_by_email("a@b.com").await.unwrap().unwrap();
        assert_eq!(stored.name, "Ada");
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let state = test_state();
        register_ada(&state).await;

        let wrong_password = routes(state.clone())
            .oneshot(post_json(
                "/api/auth/login",
                json!({"email": "a@b.com", "password": "wrong-password"}),
                "10.0.0.2",
            ))
            .await
            .unwrap();
        let unknown_email = routes(state.clone())
            .oneshot(post_json(
                "/api/auth/login",
                json!({"email": "nobody@b.com", "password": "secret1"}),
                "10.0.0.3",
            ))
            .await
            .unwrap();

        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(wrong_password).await, body_json(unknown_email).await);
    }

    #[tokio::test]
    async fn test_login_normalizes_email() {
        let state = test_state();
        register_ada(&state).await;

        let response = routes(state)
            .oneshot(post_json(
                "/api/auth/login",
                json!({"email": " A@B.com", "password": "secret1"}),
                "10.0.0.1",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["user"]["name"], "Ada");
    }

    #[tokio::test]
    async fn test_sixth_attempt_is_rate_limited() {
        let state = test_state();
        register_ada(&state).await;

        for _ in 0..5 {
            let response = routes(state.clone())
                .oneshot(post_json(
                    "/api/auth/login",
                    json!({"email": "a@b.com", "password": "wrong-password"}),
                    "198.51.100.9",
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        // Correct password is still refused: the store is never consulted
        let response = routes(state.clone())
            .oneshot(post_json(
                "/api/auth/login",
                json!({"email": "a@b.com", "password": "secret1"}),
                "198.51.100.9",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key("retry-after"));
        assert_eq!(body_json(response).await["error"], "too_many_attempts");

        // Other sources are unaffected
        let response = routes(state)
            .oneshot(post_json(
                "/api/auth/login",
                json!({"email": "a@b.com", "password": "secret1"}),
                "198.51.100.10",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_concurrent_failed_logins_are_capped() {
        let state = test_state();
        register_ada(&state).await;

        let attempts: Vec<_> = (0..20)
            .map(|_| {
                let app = routes(state.clone());
                tokio::spawn(async move {
                    app.oneshot(post_json(
                        "/api/auth/login",
                        json!({"email": "a@b.com", "password": "wrong-password"}),
                        "203.0.113.50",
                    ))
                    .await
                    .unwrap()
                    .status()
                })
            })
            .collect();

        let mut unauthorized = 0;
        let mut limited = 0;
        for attempt in attempts {
            let status = attempt.await.unwrap();
            if status == StatusCode::UNAUTHORIZED {
                unauthorized += 1;
            } else if status == StatusCode::TOO_MANY_REQUESTS {
                limited += 1;
            } else {
                panic!("unexpected status {}", status);
            }
        }
        assert_eq!(unauthorized, 5);
        assert_eq!(limited, 15);
    }

    #[tokio::test]
    async fn test_successful_login_resets_failures() {
        let state = test_state();
        register_ada(&state).await;
        let login = |password: &str| {
            post_json(
                "/api/auth/login",
                json!({"email": "a@b.com", "password": password}),
                "192.0.2.44",
            )
        };

        for _ in 0..4 {
            routes(state.clone()).oneshot(login("nope-nope")).await.unwrap();
        }
        let ok = routes(state.clone()).oneshot(login("secret1")).await.unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        for _ in 0..4 {
            let response = routes(state.clone()).oneshot(login("nope-nope")).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_logout_is_acknowledged() {
        let response = routes(test_state())
            .oneshot(post_json("/api/auth/logout", json!({}), "10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["message"], "Logged out");
    }

    #[tokio::test]
    async fn test_verify_error_codes() {
        let state = test_state();

        let response = routes(state.clone())
            .oneshot(Request::builder().uri("/api/auth/verify").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "missing_token");

        let response = routes(state)
            .oneshot(get_with_token("/api/auth/verify", "not.a.jwt"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "invalid_token");
    }

    #[tokio::test]
    async fn test_password_change_supersedes_token() {
        let state = test_state();
        let body = register_ada(&state).await;
        let token = body["token"].as_str().unwrap().to_string();

        let user = state.db.get_user_by_email("a@b.com").await.unwrap().unwrap();
        let new_hash = hash_password_async("another-secret".to_string()).await.unwrap();
        state
            .db
            .update_user(
                user.id,
                UpdateUser {
                    password_hash: Some(new_hash),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let response = routes(state)
            .oneshot(get_with_token("/api/auth/verify", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "session_superseded");
    }
}
