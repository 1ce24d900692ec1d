// Database row types and write inputs
//
// Rows map 1:1 to the tables in migrations/. Conversions into the public
// DTOs from fitsync-core drop anything that must not leave the server
// (password hashes).

use chrono::{DateTime, Utc};
use fitsync_core::{Event, Exercise, Meal, Profile, UserSummary};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// Typed storage failures that callers need to distinguish.
/// Everything else travels as an opaque `anyhow::Error`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Email already registered")]
    DuplicateEmail,
}

impl StorageError {
    /// Check whether an opaque storage error is a duplicate-email rejection.
    pub fn is_duplicate_email(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<StorageError>(),
            Some(StorageError::DuplicateEmail)
        )
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    /// Always stored normalized (trimmed, lowercased)
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }

    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateUserRow {
    pub name: String,
    /// Must already be normalized
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ExerciseRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub sets: i32,
    pub reps: i32,
    pub duration: Option<i32>,
    pub completed: bool,
    pub date: DateTime<Utc>,
}

impl From<ExerciseRow> for Exercise {
    fn from(row: ExerciseRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            sets: row.sets,
            reps: row.reps,
            duration: row.duration,
            completed: row.completed,
            date: row.date,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct MealRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub calories: f64,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub date: DateTime<Utc>,
}

impl From<MealRow> for Meal {
    fn from(row: MealRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            calories: row.calories,
            protein: row.protein,
            carbs: row.carbs,
            fat: row.fat,
            date: row.date,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub date: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            start_time: row.start_time,
            end_time: row.end_time,
            date: row.date,
        }
    }
}
