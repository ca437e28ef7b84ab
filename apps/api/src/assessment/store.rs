use chrono::Utc;
use sqlx::types::Json;
use uuid::Uuid;

use crate::db::{with_pool, Db};
use crate::models::assessment::{AssessmentKind, AssessmentRow, Question};

pub struct NewAssessment<'a> {
    pub module_id: Uuid,
    pub title: &'a str,
    pub kind: AssessmentKind,
    pub questions: &'a [Question],
    pub passing_score: f64,
    pub time_limit_minutes: Option<i32>,
}

pub async fn insert_assessment(db: &Db, new: NewAssessment<'_>) -> Result<AssessmentRow, sqlx::Error> {
    with_pool!(db, |pool| {
        sqlx::query_as::<_, AssessmentRow>(
            r#"
            INSERT INTO assessments
                (id, module_id, title, kind, questions, passing_score, time_limit_minutes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.module_id)
        .bind(new.title)
        .bind(new.kind.as_str())
        .bind(Json(new.questions))
        .bind(new.passing_score)
        .bind(new.time_limit_minutes)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    })
}

/// An assessment, provided its module sits on one of the user's roadmaps.
pub async fn find_user_assessment(
    db: &Db,
    user_id: Uuid,
    assessment_id: Uuid,
) -> Result<Option<AssessmentRow>, sqlx::Error> {
    with_pool!(db, |pool| {
        sqlx::query_as::<_, AssessmentRow>(
            r#"
            SELECT a.* FROM assessments a
            JOIN modules m ON m.id = a.module_id
            JOIN roadmaps r ON r.id = m.roadmap_id
            WHERE a.id = $1 AND r.user_id = $2
            "#,
        )
        .bind(assessment_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    })
}
