use chrono::Utc;
use serde_json::Value;
use sqlx::types::Json;
use uuid::Uuid;

use crate::db::{with_pool, Db};
use crate::models::roadmap::{Difficulty, ModuleRow, RoadmapRow};

/// A validated module waiting to be persisted. Ids are assigned up front so
/// prerequisites can point at siblings before anything is written.
#[derive(Debug, Clone)]
pub struct PlannedModule {
    pub id: Uuid,
    pub position: i32,
    pub title: String,
    pub description: String,
    pub content: String,
    pub difficulty: Difficulty,
    pub estimated_hours: f64,
    pub prerequisites: Vec<Uuid>,
    pub resources: Value,
    pub learning_objectives: Vec<String>,
}

pub struct NewRoadmap<'a> {
    pub user_id: Uuid,
    pub goal: &'a str,
    pub tech_stack: &'a [String],
    pub estimated_weeks: i32,
    pub modules: &'a [PlannedModule],
}

/// Replaces the user's active roadmap in one transaction: the previous
/// active roadmap is deactivated, then the new roadmap and all of its
/// modules are inserted.
pub async fn replace_active_roadmap(
    db: &Db,
    new: NewRoadmap<'_>,
) -> Result<(RoadmapRow, Vec<ModuleRow>), sqlx::Error> {
    let now = Utc::now();
    with_pool!(db, |pool| {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE roadmaps SET is_active = FALSE, updated_at = $2 WHERE user_id = $1 AND is_active = TRUE",
        )
        .bind(new.user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let roadmap = sqlx::query_as::<_, RoadmapRow>(
            r#"
            INSERT INTO roadmaps
                (id, user_id, goal, tech_stack, total_modules, completed_modules,
                 estimated_weeks, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 0, $6, TRUE, $7, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.goal)
        .bind(Json(new.tech_stack))
        .bind(new.modules.len() as i32)
        .bind(new.estimated_weeks)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let mut modules = Vec::with_capacity(new.modules.len());
        for planned in new.modules {
            let row = sqlx::query_as::<_, ModuleRow>(
                r#"
                INSERT INTO modules
                    (id, roadmap_id, title, description, content, difficulty, estimated_hours,
                     position, prerequisites, resources, learning_objectives, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                RETURNING *
                "#,
            )
            .bind(planned.id)
            .bind(roadmap.id)
            .bind(&planned.title)
            .bind(&planned.description)
            .bind(&planned.content)
            .bind(planned.difficulty.as_str())
            .bind(planned.estimated_hours)
            .bind(planned.position)
            .bind(Json(&planned.prerequisites))
            .bind(Json(&planned.resources))
            .bind(Json(&planned.learning_objectives))
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;
            modules.push(row);
        }

        tx.commit().await?;
        Ok((roadmap, modules))
    })
}

pub async fn active_roadmap(db: &Db, user_id: Uuid) -> Result<Option<RoadmapRow>, sqlx::Error> {
    with_pool!(db, |pool| {
        sqlx::query_as::<_, RoadmapRow>(
            "SELECT * FROM roadmaps WHERE user_id = $1 AND is_active = TRUE",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    })
}

/// Newest first.
pub async fn list_roadmaps(db: &Db, user_id: Uuid) -> Result<Vec<RoadmapRow>, sqlx::Error> {
    with_pool!(db, |pool| {
        sqlx::query_as::<_, RoadmapRow>(
            "SELECT * FROM roadmaps WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    })
}

pub async fn modules_for(db: &Db, roadmap_id: Uuid) -> Result<Vec<ModuleRow>, sqlx::Error> {
    with_pool!(db, |pool| {
        sqlx::query_as::<_, ModuleRow>(
            "SELECT * FROM modules WHERE roadmap_id = $1 ORDER BY position",
        )
        .bind(roadmap_id)
        .fetch_all(pool)
        .await
    })
}

/// A module, provided it belongs to one of the user's roadmaps.
pub async fn find_user_module(
    db: &Db,
    user_id: Uuid,
    module_id: Uuid,
) -> Result<Option<ModuleRow>, sqlx::Error> {
    with_pool!(db, |pool| {
        sqlx::query_as::<_, ModuleRow>(
            r#"
            SELECT m.* FROM modules m
            JOIN roadmaps r ON r.id = m.roadmap_id
            WHERE m.id = $1 AND r.user_id = $2
            "#,
        )
        .bind(module_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    })
}
