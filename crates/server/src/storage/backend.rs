// Storage backend abstraction
// Decision: Use enum dispatch for simplicity over trait objects
//
// This module provides a unified StorageBackend enum that can work with
// either PostgreSQL (production) or in-memory (dev mode) storage.

use anyhow::Result;
use fitsync_core::{
    CreateEventRequest, CreateExerciseRequest, CreateMealRequest, UpdateEventRequest,
    UpdateExerciseRequest, UpdateMealRequest,
};
use std::sync::Arc;
use uuid::Uuid;

use super::memory::InMemoryDatabase;
use super::models::*;
use super::repositories::Database;

/// Storage backend that can be either PostgreSQL or in-memory
#[derive(Clone)]
pub enum StorageBackend {
    /// PostgreSQL database (production)
    Postgres(Database),
    /// In-memory database (dev mode)
    InMemory(Arc<InMemoryDatabase>),
}

impl StorageBackend {
    /// Create a PostgreSQL storage backend and apply migrations
    pub async fn postgres(database_url: &str) -> Result<Self> {
        let db = Database::from_url(database_url).await?;
        db.migrate().await?;
        Ok(Self::Postgres(db))
    }

    /// Create an in-memory storage backend
    pub fn in_memory() -> Self {
        Self::InMemory(Arc::new(InMemoryDatabase::new()))
    }

    /// Short name for logs and the health endpoint
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::InMemory(_) => "memory",
        }
    }

    // ============================================
    // Users
    // ============================================

    /// Insert a user. Fails with `StorageError::DuplicateEmail` when the
    /// email is taken, regardless of any earlier application-level check.
    pub async fn create_user(&self, input: CreateUserRow) -> Result<UserRow> {
        match self {
            Self::Postgres(db) => db.create_user(input).await,
            Self::InMemory(db) => db.create_user(input).await,
        }
    }

    /// Case-insensitive lookup
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        match self {
            Self::Postgres(db) => db.get_user_by_email(email).await,
            Self::InMemory(db) => db.get_user_by_email(email).await,
        }
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>> {
        match self {
            Self::Postgres(db) => db.get_user(id).await,
            Self::InMemory(db) => db.get_user(id).await,
        }
    }

    pub async fn update_user(&self, id: Uuid, input: UpdateUser) -> Result<Option<UserRow>> {
        match self {
            Self::Postgres(db) => db.update_user(id, input).await,
            Self::InMemory(db) => db.update_user(id, input).await,
        }
    }

    // ============================================
    // Exercises
    // ============================================

    pub async fn list_exercises(&self, user_id: Uuid) -> Result<Vec<ExerciseRow>> {
        match self {
            Self::Postgres(db) => db.list_exercises(user_id).await,
            Self::InMemory(db) => db.list_exercises(user_id).await,
        }
    }

    pub async fn create_exercise(
        &self,
        user_id: Uuid,
        input: CreateExerciseRequest,
    ) -> Result<ExerciseRow> {
        match self {
            Self::Postgres(db) => db.create_exercise(user_id, input).await,
            Self::InMemory(db) => db.create_exercise(user_id, input).await,
        }
    }

    pub async fn update_exercise(
        &self,
        id: Uuid,
        user_id: Uuid,
        input: UpdateExerciseRequest,
    ) -> Result<Option<ExerciseRow>> {
        match self {
            Self::Postgres(db) => db.update_exercise(id, user_id, input).await,
            Self::InMemory(db) => db.update_exercise(id, user_id, input).await,
        }
    }

    pub async fn delete_exercise(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.delete_exercise(id, user_id).await,
            Self::InMemory(db) => db.delete_exercise(id, user_id).await,
        }
    }

    // ============================================
    // Meals
    // ============================================

    pub async fn list_meals(&self, user_id: Uuid) -> Result<Vec<MealRow>> {
        match self {
            Self::Postgres(db) => db.list_meals(user_id).await,
            Self::InMemory(db) => db.list_meals(user_id).await,
        }
    }

    pub async fn create_meal(&self, user_id: Uuid, input: CreateMealRequest) -> Result<MealRow> {
        match self {
            Self::Postgres(db) => db.create_meal(user_id, input).await,
            Self::InMemory(db) => db.create_meal(user_id, input).await,
        }
    }

    pub async fn update_meal(
        &self,
        id: Uuid,
        user_id: Uuid,
        input: UpdateMealRequest,
    ) -> Result<Option<MealRow>> {
        match self {
            Self::Postgres(db) => db.update_meal(id, user_id, input).await,
            Self::InMemory(db) => db.update_meal(id, user_id, input).await,
        }
    }

    pub async fn delete_meal(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.delete_meal(id, user_id).await,
            Self::InMemory(db) => db.delete_meal(id, user_id).await,
        }
    }

    // ============================================
    // Events
    // ============================================

    pub async fn list_events(&self, user_id: Uuid) -> Result<Vec<EventRow>> {
        match self {
            Self::Postgres(db) => db.list_events(user_id).await,
            Self::InMemory(db) => db.list_events(user_id).await,
        }
    }

    pub async fn create_event(&self, user_id: Uuid, input: CreateEventRequest) -> Result<EventRow> {
        match self {
            Self::Postgres(db) => db.create_event(user_id, input).await,
            Self::InMemory(db) => db.create_event(user_id, input).await,
        }
    }

    pub async fn update_event(
        &self,
        id: Uuid,
        user_id: Uuid,
        input: UpdateEventRequest,
    ) -> Result<Option<EventRow>> {
        match self {
            Self::Postgres(db) => db.update_event(id, user_id, input).await,
            Self::InMemory(db) => db.update_event(id, user_id, input).await,
        }
    }

    pub async fn delete_event(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.delete_event(id, user_id).await,
            Self::InMemory(db) => db.delete_event(id, user_id).await,
        }
    }
}
