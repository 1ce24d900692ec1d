// In-memory storage implementation for dev mode
// Decision: Use parking_lot for thread-safe access
// Decision: UUIDs generated via uuid v7 (time-ordered)
//
// This implementation mirrors the PostgreSQL API with HashMaps, allowing the
// server to run (and be tested) without a database.

use anyhow::Result;
use chrono::{DateTime, Utc};
use fitsync_core::{
    CreateEventRequest, CreateExerciseRequest, CreateMealRequest, UpdateEventRequest,
    UpdateExerciseRequest, UpdateMealRequest,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::models::*;

/// In-memory database for dev mode
/// All data is stored in memory and lost on restart
#[derive(Default)]
pub struct InMemoryDatabase {
    users: RwLock<HashMap<Uuid, UserRow>>,
    exercises: RwLock<HashMap<Uuid, ExerciseRow>>,
    meals: RwLock<HashMap<Uuid, MealRow>>,
    events: RwLock<HashMap<Uuid, EventRow>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUserRow) -> Result<UserRow> {
        // Uniqueness check and insert happen under one write lock
        let mut users = self.users.write();
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&input.email))
        {
            return Err(StorageError::DuplicateEmail.into());
        }

        let now = Self::now();
        let id = Uuid::now_v7();
        let row = UserRow {
            id,
            name: input.name,
            email: input.email,
            password_hash: input.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.insert(id, row.clone());
        Ok(row)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email.trim()))
            .cloned())
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>> {
        Ok(self.users.read().get(&id).cloned())
    }

    pub async fn update_user(&self, id: Uuid, input: UpdateUser) -> Result<Option<UserRow>> {
        let mut users = self.users.write();
        if let Some(user) = users.get_mut(&id) {
            if let Some(name) = input.name {
                user.name = name;
            }
            if let Some(password_hash) = input.password_hash {
                user.password_hash = password_hash;
            }
            user.updated_at = Self::now();
            return Ok(Some(user.clone()));
        }
        Ok(None)
    }

    // ============================================
    // Exercises
    // ============================================

    pub async fn list_exercises(&self, user_id: Uuid) -> Result<Vec<ExerciseRow>> {
        let mut rows: Vec<_> = self
            .exercises
            .read()
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }

    pub async fn create_exercise(
        &self,
        user_id: Uuid,
        input: CreateExerciseRequest,
    ) -> Result<ExerciseRow> {
        let id = Uuid::now_v7();
        let row = ExerciseRow {
            id,
            user_id,
            name: input.name,
            sets: input.sets,
            reps: input.reps,
            duration: input.duration,
            completed: false,
            date: input.date.unwrap_or_else(Self::now),
        };
        self.exercises.write().insert(id, row.clone());
        Ok(row)
    }

    pub async fn update_exercise(
        &self,
        id: Uuid,
        user_id: Uuid,
        input: UpdateExerciseRequest,
    ) -> Result<Option<ExerciseRow>> {
        let mut exercises = self.exercises.write();
        let Some(row) = exercises.get_mut(&id).filter(|e| e.user_id == user_id) else {
            return Ok(None);
        };
        if let Some(name) = input.name {
            row.name = name;
        }
        if let Some(sets) = input.sets {
            row.sets = sets;
        }
        if let Some(reps) = input.reps {
            row.reps = reps;
        }
        if let Some(duration) = input.duration {
            row.duration = Some(duration);
        }
        if let Some(completed) = input.completed {
            row.completed = completed;
        }
        if let Some(date) = input.date {
            row.date = date;
        }
        Ok(Some(row.clone()))
    }

    pub async fn delete_exercise(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut exercises = self.exercises.write();
        if exercises.get(&id).is_some_and(|e| e.user_id == user_id) {
            exercises.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }

    // ============================================
    // Meals
    // ============================================

    pub async fn list_meals(&self, user_id: Uuid) -> Result<Vec<MealRow>> {
        let mut rows: Vec<_> = self
            .meals
            .read()
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }

    pub async fn create_meal(&self, user_id: Uuid, input: CreateMealRequest) -> Result<MealRow> {
        let id = Uuid::now_v7();
        let row = MealRow {
            id,
            user_id,
            name: input.name,
            calories: input.calories,
            protein: input.protein,
            carbs: input.carbs,
            fat: input.fat,
            date: input.date.unwrap_or_else(Self::now),
        };
        self.meals.write().insert(id, row.clone());
        Ok(row)
    }

    pub async fn update_meal(
        &self,
        id: Uuid,
        user_id: Uuid,
        input: UpdateMealRequest,
    ) -> Result<Option<MealRow>> {
        let mut meals = self.meals.write();
        let Some(row) = meals.get_mut(&id).filter(|m| m.user_id == user_id) else {
            return Ok(None);
        };
        if let Some(name) = input.name {
            row.name = name;
        }
        if let Some(calories) = input.calories {
            row.calories = calories;
        }
        if let Some(protein) = input.protein {
            row.protein = Some(protein);
        }
        if let Some(carbs) = input.carbs {
            row.carbs = Some(carbs);
        }
        if let Some(fat) = input.fat {
            row.fat = Some(fat);
        }
        if let Some(date) = input.date {
            row.date = date;
        }
        Ok(Some(row.clone()))
    }

    pub async fn delete_meal(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut meals = self.meals.write();
        if meals.get(&id).is_some_and(|m| m.user_id == user_id) {
            meals.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }

    // ============================================
    // Events
    // ============================================

    pub async fn list_events(&self, user_id: Uuid) -> Result<Vec<EventRow>> {
        let mut rows: Vec<_> = self
            .events
            .read()
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(rows)
    }

    pub async fn create_event(&self, user_id: Uuid, input: CreateEventRequest) -> Result<EventRow> {
        let id = Uuid::now_v7();
        let row = EventRow {
            id,
            user_id,
            title: input.title,
            description: input.description,
            start_time: input.start_time,
            end_time: input.end_time,
            date: input.date,
        };
        self.events.write().insert(id, row.clone());
        Ok(row)
    }

    pub async fn update_event(
        &self,
        id: Uuid,
        user_id: Uuid,
        input: UpdateEventRequest,
    ) -> Result<Option<EventRow>> {
        let mut events = self.events.write();
        let Some(row) = events.get_mut(&id).filter(|e| e.user_id == user_id) else {
            return Ok(None);
        };
        if let Some(title) = input.title {
            row.title = title;
        }
        if let Some(description) = input.description {
            row.description = Some(description);
        }
        if let Some(start_time) = input.start_time {
            row.start_time = start_time;
        }
        if let Some(end_time) = input.end_time {
            row.end_time = Some(end_time);
        }
        if let Some(date) = input.date {
            row.date = date;
        }
        Ok(Some(row.clone()))
    }

    pub async fn delete_event(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut events = self.events.write();
        if events.get(&id).is_some_and(|e| e.user_id == user_id) {
            events.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_input(email: &str) -> CreateUserRow {
        CreateUserRow {
            name: "Ada".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup_user() {
        let db = InMemoryDatabase::new();
        let user = db.create_user(user_input("ada@example.com")).await.unwrap();

        let by_id = db.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "ada@example.com");

        let by_email = db.get_user_by_email("ADA@Example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(user.id));

        assert!(db.get_user_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_case_insensitively() {
        let db = InMemoryDatabase::new();
        db.create_user(user_input("ada@example.com")).await.unwrap();

        let err = db
            .create_user(user_input("ADA@example.com"))
            .await
            .unwrap_err();
        assert!(StorageError::is_duplicate_email(&err));
        assert_eq!(db.users.read().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_inserts_leave_one_user() {
        let db = std::sync::Arc::new(InMemoryDatabase::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                db.create_user(user_input("race@example.com")).await.is_ok()
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(db.users.read().len(), 1);
    }

    #[tokio::test]
    async fn test_update_password_hash() {
        let db = InMemoryDatabase::new();
        let user = db.create_user(user_input("ada@example.com")).await.unwrap();

        let updated = db
            .update_user(
                user.id,
                UpdateUser {
                    password_hash: Some("new-hash".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.password_hash, "new-hash");
        assert_eq!(updated.name, "Ada");

        let missing = db
            .update_user(Uuid::now_v7(), UpdateUser::default())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_records_are_scoped_to_owner() {
        let db = InMemoryDatabase::new();
        let owner = Uuid::now_v7();
        let other = Uuid::now_v7();

        let exercise = db
            .create_exercise(
                owner,
                CreateExerciseRequest {
                    name: "Squat".to_string(),
                    sets: 5,
                    reps: 5,
                    duration: None,
                    date: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(db.list_exercises(owner).await.unwrap().len(), 1);
        assert!(db.list_exercises(other).await.unwrap().is_empty());

        let update = UpdateExerciseRequest {
            completed: Some(true),
            ..Default::default()
        };
        assert!(db
            .update_exercise(exercise.id, other, update.clone())
            .await
            .unwrap()
            .is_none());
        let updated = db
            .update_exercise(exercise.id, owner, update)
            .await
            .unwrap()
            .unwrap();
        assert!(updated.completed);

        assert!(!db.delete_exercise(exercise.id, other).await.unwrap());
        assert!(db.delete_exercise(exercise.id, owner).await.unwrap());
        assert!(db.list_exercises(owner).await.unwrap().is_empty());
    }
}
