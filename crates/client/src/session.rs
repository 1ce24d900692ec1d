// Session client: the device-side half of authentication
// Decision: Session state is an explicit object owned by SessionClient, never a global
// Decision: login/register/logout/restore and the 401 handler run under one async
//           mutex so transitions apply one at a time
// Decision: Network calls whose result changes the session snapshot the token first
//           and apply the result only if it is still current
// Decision: A restored session whose verification cannot reach the server stays
//           usable (Unverified) until the server actually rejects it

use fitsync_core::{
    normalize_email, validation::validate_registration, AuthResponse, ChangePasswordRequest,
    CreateEventRequest, CreateExerciseRequest, CreateMealRequest, DeleteResponse, Event,
    Exercise, LoginRequest, LogoutResponse, Meal, Profile, RegisterRequest,
    UpdateEventRequest, UpdateExerciseRequest, UpdateMealRequest, UpdateProfileRequest,
    UserSummary, VerifyResponse,
};
use parking_lot::RwLock;
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::{ClientConfig, RetryPolicy};
use crate::error::ClientError;
use crate::storage::{KeyValueStore, TOKEN_KEY, USER_KEY};
use crate::transport::{with_retry, ApiClient};

const LOGIN_PATH: &str = "/api/auth/login";
const REGISTER_PATH: &str = "/api/auth/register";
const LOGOUT_PATH: &str = "/api/auth/logout";
const VERIFY_PATH: &str = "/api/auth/verify";
const PROFILE_PATH: &str = "/api/users/profile";

/// 401s on these paths never clear the session: the auth endpoints report bad
/// credentials, and the profile fetch right after login can race token propagation
const INTERCEPTOR_EXEMPT_PATHS: [&str; 3] = [LOGIN_PATH, REGISTER_PATH, PROFILE_PATH];

/// Where the client's session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No session
    Absent,
    /// Restored from storage; the server has not confirmed it yet
    Unverified,
    /// Established by login/register or confirmed by the server
    Verified,
}

/// Token and user summary held for the signed-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug)]
struct SessionState {
    session: Option<Session>,
    status: SessionStatus,
    last_auth_time: Option<Instant>,
}

impl SessionState {
    fn empty() -> Self {
        Self {
            session: None,
            status: SessionStatus::Absent,
            last_auth_time: None,
        }
    }
}

pub struct SessionClient {
    api: ApiClient,
    store: Arc<dyn KeyValueStore>,
    retry: RetryPolicy,
    auth_grace: Duration,
    state: RwLock<SessionState>,
    transitions: Mutex<()>,
}

impl SessionClient {
    pub fn new(config: ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self, ClientError> {
        Ok(Self {
            api: ApiClient::new(&config)?,
            store,
            retry: config.retry,
            auth_grace: config.auth_grace,
            state: RwLock::new(SessionState::empty()),
            transitions: Mutex::new(()),
        })
    }

    pub fn status(&self) -> SessionStatus {
        self.state.read().status
    }

    pub fn session(&self) -> Option<Session> {
        self.state.read().session.clone()
    }

    pub fn user(&self) -> Option<UserSummary> {
        self.state.read().session.as_ref().map(|s| s.user.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.state.read().session.as_ref().map(|s| s.token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() != SessionStatus::Absent
    }

    // ============================================
    // Transitions
    // ============================================

    /// Log in. On failure the existing session and storage are left untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserSummary, ClientError> {
        let req = LoginRequest {
            email: normalize_email(email),
            password: password.to_string(),
        };

        let _guard = self.transitions.lock().await;
        let response: AuthResponse = with_retry(&self.retry, || {
            self.api
                .request(Method::POST, LOGIN_PATH, None, Some(&req))
        })
        .await?;

        self.establish(response).await
    }

    /// Register and log in as the new user.
    /// Input is checked locally with the server's rules before any request.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserSummary, ClientError> {
        let req = RegisterRequest {
            name: name.trim().to_string(),
            email: normalize_email(email),
            password: password.to_string(),
        };
        validate_registration(&req)?;

        let _guard = self.transitions.lock().await;
        // Not retried: a lost response would turn the retry into a conflict
        let response: AuthResponse = self
            .api
            .request(Method::POST, REGISTER_PATH, None, Some(&req))
            .await?;

        self.establish(response).await
    }

    /// Log out. The server call is best effort; local state is always cleared.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let _guard = self.transitions.lock().await;

        let token = self.token();
        if let Some(token) = token.as_deref() {
            let result: Result<LogoutResponse, ClientError> = self
                .api
                .request(Method::POST, LOGOUT_PATH, Some(token), Some(&serde_json::json!({})))
                .await;
            if let Err(e) = result {
                tracing::debug!("Logout request failed, clearing locally anyway: {}", e);
            }
        }

        self.clear().await
    }

    /// Rehydrate the session from storage at startup.
    /// Reads storage only; the restored session is `Unverified` until
    /// `verify_restored` (or `spawn_verify`) hears back from the server.
    pub async fn restore_session(&self) -> Result<SessionStatus, ClientError> {
        let _guard = self.transitions.lock().await;

        let token = self.store.get(TOKEN_KEY).await?;
        let user_json = self.store.get(USER_KEY).await?;
        let (token, user_json) = match (token, user_json) {
            (Some(token), Some(user_json)) => (token, user_json),
            _ => {
                tracing::debug!("No stored session");
                return Ok(SessionStatus::Absent);
            }
        };

        let user: UserSummary = match serde_json::from_str(&user_json) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("Stored user info is corrupt, clearing session: {}", e);
                self.clear().await?;
                return Ok(SessionStatus::Absent);
            }
        };

        let mut state = self.state.write();
        state.session = Some(Session { token, user });
        state.status = SessionStatus::Unverified;
        state.last_auth_time = None;
        Ok(SessionStatus::Unverified)
    }

    /// Confirm a restored session with the server.
    /// Runs without holding the transition lock while the request is in flight;
    /// the result is dropped if the session changed meanwhile.
    pub async fn verify_restored(&self) -> Result<SessionStatus, ClientError> {
        let token = {
            let state = self.state.read();
            match (&state.session, state.status) {
                (Some(session), SessionStatus::Unverified) => session.token.clone(),
                (_, status) => return Ok(status),
            }
        };

        let verified: Result<VerifyResponse, ClientError> =
            self.api.get(VERIFY_PATH, Some(&token)).await;

        let _guard = self.transitions.lock().await;
        if self.token().as_deref() != Some(token.as_str()) {
            tracing::debug!("Session changed while verifying, discarding result");
            return Ok(self.status());
        }

        match verified {
            Ok(response) if response.valid => {
                let mut state = self.state.write();
                if let Some(session) = state.session.as_mut() {
                    session.user = response.user;
                }
                state.status = SessionStatus::Verified;
                Ok(SessionStatus::Verified)
            }
            Ok(_) | Err(ClientError::Auth { .. }) => {
                tracing::info!("Stored session rejected by server, clearing");
                self.clear().await?;
                Ok(SessionStatus::Absent)
            }
            Err(e) => {
                tracing::warn!("Could not verify stored session, keeping it: {}", e);
                Ok(SessionStatus::Unverified)
            }
        }
    }

    /// Run `verify_restored` in the background
    pub fn spawn_verify(self: &Arc<Self>) -> JoinHandle<Result<SessionStatus, ClientError>> {
        let client = Arc::clone(self);
        tokio::spawn(async move { client.verify_restored().await })
    }

    async fn establish(&self, response: AuthResponse) -> Result<UserSummary, ClientError> {
        let user_json =
            serde_json::to_string(&response.user).map_err(|e| ClientError::Internal(e.to_string()))?;
        self.store
            .set_many(&[
                (TOKEN_KEY, response.token.as_str()),
                (USER_KEY, user_json.as_str()),
            ])
            .await?;

        let mut state = self.state.write();
        state.session = Some(Session {
            token: response.token,
            user: response.user.clone(),
        });
        state.status = SessionStatus::Verified;
        state.last_auth_time = Some(Instant::now());
        tracing::info!(user_id = %response.user.id, "Session established");
        Ok(response.user)
    }

    async fn clear(&self) -> Result<(), ClientError> {
        *self.state.write() = SessionState::empty();
        self.store.remove_many(&[TOKEN_KEY, USER_KEY]).await
    }

    // ============================================
    // Authenticated requests
    // ============================================

    async fn send<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        retry: bool,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_as(self.token(), method, path, body, retry).await
    }

    /// Send with an explicit token snapshot, so callers can tell afterwards
    /// whether the session changed while the request was in flight
    async fn send_as<T, B>(
        &self,
        token: Option<String>,
        method: Method,
        path: &str,
        body: Option<&B>,
        retry: bool,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let policy = if retry {
            self.retry.clone()
        } else {
            RetryPolicy::none()
        };

        let result = with_retry(&policy, || {
            self.api
                .request(method.clone(), path, token.as_deref(), body)
        })
        .await;

        if let Err(ClientError::Auth { code, .. }) = &result {
            self.on_unauthorized(path, token.as_deref(), *code).await;
        }
        result
    }

    /// Response-side 401 handler: clears the session unless the request is exempt,
    /// a login happened within the grace window, or the session already changed.
    async fn on_unauthorized(&self, path: &str, token: Option<&str>, code: fitsync_core::ErrorCode) {
        if INTERCEPTOR_EXEMPT_PATHS.contains(&path) {
            return;
        }

        let _guard = self.transitions.lock().await;
        {
            let state = self.state.read();
            let current = state.session.as_ref().map(|s| s.token.as_str());
            if current.is_none() || current != token {
                return;
            }
            if state
                .last_auth_time
                .is_some_and(|t| t.elapsed() <= self.auth_grace)
            {
                tracing::debug!(%path, "401 within grace window after login, keeping session");
                return;
            }
        }

        tracing::info!(%path, %code, "Server rejected session, clearing");
        if let Err(e) = self.clear().await {
            tracing::warn!("Failed to clear stored session: {}", e);
        }
    }

    /// Re-check the current token with the server
    pub async fn verify(&self) -> Result<UserSummary, ClientError> {
        let sent_with = self.token();
        let response: VerifyResponse = self
            .send_as::<_, ()>(sent_with.clone(), Method::GET, VERIFY_PATH, None, true)
            .await?;

        let _guard = self.transitions.lock().await;
        let mut state = self.state.write();
        if sent_with.is_some() && state.session.as_ref().map(|s| &s.token) == sent_with.as_ref() {
            state.status = SessionStatus::Verified;
        }
        Ok(response.user)
    }

    pub async fn profile(&self) -> Result<Profile, ClientError> {
        self.send::<_, ()>(Method::GET, PROFILE_PATH, None, true).await
    }

    pub async fn update_profile(&self, name: &str) -> Result<Profile, ClientError> {
        let sent_with = self.token();
        let profile: Profile = self
            .send_as(
                sent_with.clone(),
                Method::PUT,
                PROFILE_PATH,
                Some(&UpdateProfileRequest {
                    name: name.to_string(),
                }),
                true,
            )
            .await?;

        // Keep the persisted summary in step with the new name
        let summary = UserSummary::from(profile.clone());
        let user_json =
            serde_json::to_string(&summary).map_err(|e| ClientError::Internal(e.to_string()))?;
        let _guard = self.transitions.lock().await;
        let updated = {
            let mut state = self.state.write();
            match state.session.as_mut() {
                Some(session) if Some(&session.token) == sent_with.as_ref() => {
                    session.user = summary;
                    true
                }
                _ => false,
            }
        };
        if updated {
            self.store.set(USER_KEY, &user_json).await?;
        }
        Ok(profile)
    }

    /// Change password. The server issues a new token and every other token
    /// for this user stops working; the new one replaces the local session
    /// unless the session changed while the request was in flight.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<UserSummary, ClientError> {
        fitsync_core::validation::validate_password(new_password)?;
        let sent_with = self.token();
        let response: AuthResponse = self
            .send_as(
                sent_with.clone(),
                Method::PUT,
                "/api/users/password",
                Some(&ChangePasswordRequest {
                    current_password: current_password.to_string(),
                    new_password: new_password.to_string(),
                }),
                false,
            )
            .await?;

        // A logout or re-login that finished meanwhile wins; the new token is dropped
        let _guard = self.transitions.lock().await;
        if sent_with.is_none() || self.token() != sent_with {
            tracing::info!("Session changed during password change, not storing the new token");
            return Ok(response.user);
        }
        self.establish(response).await
    }

    // ============================================
    // Records
    // ============================================

    pub async fn list_exercises(&self) -> Result<Vec<Exercise>, ClientError> {
        self.send::<_, ()>(Method::GET, "/api/exercises", None, true).await
    }

    pub async fn create_exercise(&self, req: &CreateExerciseRequest) -> Result<Exercise, ClientError> {
        req.validate()?;
        self.send(Method::POST, "/api/exercises", Some(req), false).await
    }

    pub async fn update_exercise(
        &self,
        id: Uuid,
        req: &UpdateExerciseRequest,
    ) -> Result<Exercise, ClientError> {
        self.send(Method::PUT, &format!("/api/exercises/{}", id), Some(req), true)
            .await
    }

    pub async fn delete_exercise(&self, id: Uuid) -> Result<DeleteResponse, ClientError> {
        self.send::<_, ()>(Method::DELETE, &format!("/api/exercises/{}", id), None, true)
            .await
    }

    pub async fn list_meals(&self) -> Result<Vec<Meal>, ClientError> {
        self.send::<_, ()>(Method::GET, "/api/meals", None, true).await
    }

    pub async fn create_meal(&self, req: &CreateMealRequest) -> Result<Meal, ClientError> {
        req.validate()?;
        self.send(Method::POST, "/api/meals", Some(req), false).await
    }

    pub async fn update_meal(&self, id: Uuid, req: &UpdateMealRequest) -> Result<Meal, ClientError> {
        self.send(Method::PUT, &format!("/api/meals/{}", id), Some(req), true)
            .await
    }

    pub async fn delete_meal(&self, id: Uuid) -> Result<DeleteResponse, ClientError> {
        self.send::<_, ()>(Method::DELETE, &format!("/api/meals/{}", id), None, true)
            .await
    }

    pub async fn list_events(&self) -> Result<Vec<Event>, ClientError> {
        self.send::<_, ()>(Method::GET, "/api/events", None, true).await
    }

    pub async fn create_event(&self, req: &CreateEventRequest) -> Result<Event, ClientError> {
        req.validate()?;
        self.send(Method::POST, "/api/events", Some(req), false).await
    }

    pub async fn update_event(&self, id: Uuid, req: &UpdateEventRequest) -> Result<Event, ClientError> {
        self.send(Method::PUT, &format!("/api/events/{}", id), Some(req), true)
            .await
    }

    pub async fn delete_event(&self, id: Uuid) -> Result<DeleteResponse, ClientError> {
        self.send::<_, ()>(Method::DELETE, &format!("/api/events/{}", id), None, true)
            .await
    }
}
