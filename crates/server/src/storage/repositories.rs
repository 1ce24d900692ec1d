// PostgreSQL repository layer
// Decision: Runtime-checked sqlx queries (no DATABASE_URL needed at compile time)
// Decision: Email uniqueness is enforced by the lower(email) unique index, not by the caller

use anyhow::{Context, Result};
use fitsync_core::{
    CreateEventRequest, CreateExerciseRequest, CreateMealRequest, UpdateEventRequest,
    UpdateExerciseRequest, UpdateMealRequest,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::*;

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";
const EXERCISE_COLUMNS: &str = "id, user_id, name, sets, reps, duration, completed, date";
const MEAL_COLUMNS: &str = "id, user_id, name, calories, protein, carbs, fat, date";
const EVENT_COLUMNS: &str = "id, user_id, title, description, start_time, end_time, date";

/// Map a unique-index violation to the typed duplicate-email error
fn map_user_insert_error(err: sqlx::Error) -> anyhow::Error {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            StorageError::DuplicateEmail.into()
        }
        other => other.into(),
    }
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Apply embedded migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUserRow) -> Result<UserRow> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_user_insert_error)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn update_user(&self, id: Uuid, input: UpdateUser) -> Result<Option<UserRow>> {
        let sql = format!(
            r#"
            UPDATE users
            SET
                name = COALESCE($2, name),
                password_hash = COALESCE($3, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(&input.name)
            .bind(&input.password_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    // ============================================
    // Exercises
    // ============================================

    pub async fn list_exercises(&self, user_id: Uuid) -> Result<Vec<ExerciseRow>> {
        let sql = format!(
            "SELECT {EXERCISE_COLUMNS} FROM exercises WHERE user_id = $1 ORDER BY date DESC"
        );
        let rows = sqlx::query_as::<_, ExerciseRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn create_exercise(
        &self,
        user_id: Uuid,
        input: CreateExerciseRequest,
    ) -> Result<ExerciseRow> {
        let sql = format!(
            r#"
            INSERT INTO exercises (id, user_id, name, sets, reps, duration, date)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, NOW()))
            RETURNING {EXERCISE_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ExerciseRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(user_id)
            .bind(&input.name)
            .bind(input.sets)
            .bind(input.reps)
            .bind(input.duration)
            .bind(input.date)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn update_exercise(
        &self,
        id: Uuid,
        user_id: Uuid,
        input: UpdateExerciseRequest,
    ) -> Result<Option<ExerciseRow>> {
        let sql = format!(
            r#"
            UPDATE exercises
            SET
                name = COALESCE($3, name),
                sets = COALESCE($4, sets),
                reps = COALESCE($5, reps),
                duration = COALESCE($6, duration),
                completed = COALESCE($7, completed),
                date = COALESCE($8, date)
            WHERE id = $1 AND user_id = $2
            RETURNING {EXERCISE_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ExerciseRow>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(&input.name)
            .bind(input.sets)
            .bind(input.reps)
            .bind(input.duration)
            .bind(input.completed)
            .bind(input.date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn delete_exercise(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM exercises WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ============================================
    // Meals
    // ============================================

    pub async fn list_meals(&self, user_id: Uuid) -> Result<Vec<MealRow>> {
        let sql = format!("SELECT {MEAL_COLUMNS} FROM meals WHERE user_id = $1 ORDER BY date DESC");
        let rows = sqlx::query_as::<_, MealRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn create_meal(&self, user_id: Uuid, input: CreateMealRequest) -> Result<MealRow> {
        let sql = format!(
            r#"
            INSERT INTO meals (id, user_id, name, calories, protein, carbs, fat, date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, NOW()))
            RETURNING {MEAL_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, MealRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(user_id)
            .bind(&input.name)
            .bind(input.calories)
            .bind(input.protein)
            .bind(input.carbs)
            .bind(input.fat)
            .bind(input.date)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn update_meal(
        &self,
        id: Uuid,
        user_id: Uuid,
        input: UpdateMealRequest,
    ) -> Result<Option<MealRow>> {
        let sql = format!(
            r#"
            UPDATE meals
            SET
                name = COALESCE($3, name),
                calories = COALESCE($4, calories),
                protein = COALESCE($5, protein),
                carbs = COALESCE($6, carbs),
                fat = COALESCE($7, fat),
                date = COALESCE($8, date)
            WHERE id = $1 AND user_id = $2
            RETURNING {MEAL_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, MealRow>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(&input.name)
            .bind(input.calories)
            .bind(input.protein)
            .bind(input.carbs)
            .bind(input.fat)
            .bind(input.date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn delete_meal(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM meals WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ============================================
    // Events
    // ============================================

    pub async fn list_events(&self, user_id: Uuid) -> Result<Vec<EventRow>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE user_id = $1 ORDER BY start_time ASC"
        );
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn create_event(&self, user_id: Uuid, input: CreateEventRequest) -> Result<EventRow> {
        let sql = format!(
            r#"
            INSERT INTO events (id, user_id, title, description, start_time, end_time, date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {EVENT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(user_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.date)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn update_event(
        &self,
        id: Uuid,
        user_id: Uuid,
        input: UpdateEventRequest,
    ) -> Result<Option<EventRow>> {
        let sql = format!(
            r#"
            UPDATE events
            SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                start_time = COALESCE($5, start_time),
                end_time = COALESCE($6, end_time),
                date = COALESCE($7, date)
            WHERE id = $1 AND user_id = $2
            RETURNING {EVENT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn delete_event(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
