// HTTP API routes
//
// Everything outside /api/auth. All resource routes share one state and sit
// behind the AuthUser extractor; records are always scoped to the caller.

pub mod common;
pub mod events;
pub mod exercises;
pub mod health;
pub mod meals;
pub mod users;

use axum::extract::FromRef;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthState;
use crate::storage::StorageBackend;

// Re-export common types
pub use common::{ApiError, ApiJson};

/// App state for the resource routes
#[derive(Clone)]
pub struct ApiState {
    pub db: Arc<StorageBackend>,
    pub auth: AuthState,
}

impl ApiState {
    pub fn new(auth: AuthState) -> Self {
        Self {
            db: auth.db.clone(),
            auth,
        }
    }
}

impl FromRef<ApiState> for AuthState {
    fn from_ref(input: &ApiState) -> Self {
        input.auth.clone()
    }
}

/// Parse a record id from the path; anything unparseable is simply not found
pub(crate) fn parse_record_id(raw: &str, what: &'static str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(what))
}
