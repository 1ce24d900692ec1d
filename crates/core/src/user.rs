// User-facing projections of the user record
//
// The stored user carries a password hash; nothing in this module does.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Summary returned alongside a token and persisted by the client under `user_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UserSummary {
    /// Unique identifier for the user.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Normalized (trimmed, lowercased) email address.
    pub email: String,
}

/// Profile returned by `GET /api/users/profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// When the account was registered.
    pub created_at: DateTime<Utc>,
}

impl From<Profile> for UserSummary {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            email: profile.email,
        }
    }
}
