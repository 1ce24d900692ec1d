// FitSync shared types
//
// This crate holds the wire contract spoken between fitsync-server and
// fitsync-client.
//
// Key design decisions:
// - One typed request shape per endpoint; malformed bodies are rejected at the boundary
// - Error bodies carry a machine-readable code so clients never parse messages
// - Email normalization and registration validation are shared so the client
//   can pre-check input with the same rules the server enforces

pub mod auth;
pub mod error;
pub mod records;
pub mod user;
pub mod validation;

// Re-exports for convenience
pub use auth::{
    AuthResponse, ChangePasswordRequest, LoginRequest, LogoutResponse, RegisterRequest,
    UpdateProfileRequest, VerifyResponse,
};
pub use error::{ErrorCode, ErrorResponse};
pub use records::{
    CreateEventRequest, CreateExerciseRequest, CreateMealRequest, DeleteResponse, Event,
    Exercise, Meal, UpdateEventRequest, UpdateExerciseRequest, UpdateMealRequest,
};
pub use user::{Profile, UserSummary};
pub use validation::{normalize_email, ValidationError};
