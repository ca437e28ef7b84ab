use chrono::Utc;
use serde::Deserialize;
use sqlx::types::Json;
use tracing::info;
use uuid::Uuid;

use crate::db::{with_pool, Db};
use crate::errors::AppError;
use crate::models::user::{LearningIntensity, UserRow};

/// Fields captured at registration. The password is already hashed.
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub background: Option<&'a str>,
    pub current_role: Option<&'a str>,
    pub target_role: Option<&'a str>,
    pub years_experience: i32,
    pub skills: &'a [String],
    pub learning_intensity: LearningIntensity,
}

/// Partial profile update. Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub background: Option<String>,
    pub current_role: Option<String>,
    pub target_role: Option<String>,
    pub years_experience: Option<i32>,
    pub skills: Option<Vec<String>>,
    pub learning_intensity: Option<LearningIntensity>,
}

// Rows owned by a user, removed before the user row itself. Modules and
// assessments go with their roadmap.
const OWNED_ROWS: [&str; 5] = [
    "DELETE FROM badges WHERE user_id = $1",
    "DELETE FROM learning_streaks WHERE user_id = $1",
    "DELETE FROM chat_history WHERE user_id = $1",
    "DELETE FROM progress WHERE user_id = $1",
    "DELETE FROM roadmaps WHERE user_id = $1",
];

/// Inserts a user. A concurrent registration of the same email surfaces as
/// `Conflict` through the unique index.
pub async fn insert_user(db: &Db, new: NewUser<'_>) -> Result<UserRow, AppError> {
    let now = Utc::now();
    let result = with_pool!(db, |pool| {
        sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users
                (id, name, email, password_hash, background, current_title, target_role,
                 years_experience, skills, learning_intensity, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, TRUE, $11, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.name)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.background)
        .bind(new.current_role)
        .bind(new.target_role)
        .bind(new.years_experience)
        .bind(Json(new.skills))
        .bind(new.learning_intensity.as_str())
        .bind(now)
        .fetch_one(pool)
        .await
    });
    result.map_err(|e| AppError::conflict_on_unique(e, "Email already registered"))
}

pub async fn find_by_email(db: &Db, email: &str) -> Result<Option<UserRow>, sqlx::Error> {
    with_pool!(db, |pool| {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await
    })
}

pub async fn find_by_id(db: &Db, id: Uuid) -> Result<Option<UserRow>, sqlx::Error> {
    with_pool!(db, |pool| {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    })
}

pub async fn update_profile(db: &Db, id: Uuid, update: &UserUpdate) -> Result<Option<UserRow>, sqlx::Error> {
    with_pool!(db, |pool| {
        sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET
                name               = COALESCE($2, name),
                background         = COALESCE($3, background),
                current_title      = COALESCE($4, current_title),
                target_role        = COALESCE($5, target_role),
                years_experience   = COALESCE($6, years_experience),
                skills             = COALESCE($7, skills),
                learning_intensity = COALESCE($8, learning_intensity),
                updated_at         = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.background.as_deref())
        .bind(update.current_role.as_deref())
        .bind(update.target_role.as_deref())
        .bind(update.years_experience)
        .bind(update.skills.as_ref().map(Json))
        .bind(update.learning_intensity.map(|i| i.as_str()))
        .bind(Utc::now())
        .fetch_optional(pool)
        .await
    })
}

/// Deletes the user and everything they own in one transaction.
/// Returns false when no such user existed.
pub async fn delete_user(db: &Db, id: Uuid) -> Result<bool, sqlx::Error> {
    let deleted = with_pool!(db, |pool| {
        let mut tx = pool.begin().await?;
        for statement in OWNED_ROWS {
            sqlx::query(statement).bind(id).execute(&mut *tx).await?;
        }
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        deleted
    });
    if deleted > 0 {
        info!("Deleted user {id} and owned rows");
    }
    Ok(deleted > 0)
}
