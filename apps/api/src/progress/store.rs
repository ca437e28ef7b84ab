use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::db::{with_pool, Db};
use crate::errors::AppError;
use crate::models::achievement::{BadgeRow, LearningStreakRow};
use crate::models::progress::{ProgressRow, ProgressStatus};
use crate::models::roadmap::RoadmapRow;
use crate::progress::badges::{self, Achievements};
use crate::progress::review::{self, ReviewState};
use crate::progress::streak::{self, StreakState};

// Taken first so that every write against one roadmap runs in sequence and
// the completed-module recount sees the other writers' commits.
const LOCK_ROADMAP: &str = "UPDATE roadmaps SET updated_at = $2 WHERE id = $1";

const UPSERT_PROGRESS: &str = r#"
    INSERT INTO progress
        (id, user_id, module_id, status, score, time_spent, attempts,
         started_at, completed_at, review_count, ease_factor, interval_days, updated_at)
    VALUES ($1, $2, $3, $4, $5, COALESCE($6, 0.0), 1, $7, $8, 0, 2.5, 0, $9)
    ON CONFLICT (user_id, module_id) DO UPDATE SET
        status       = excluded.status,
        score        = COALESCE($5, progress.score),
        time_spent   = COALESCE($6, progress.time_spent),
        attempts     = progress.attempts + 1,
        started_at   = COALESCE(progress.started_at, excluded.started_at),
        completed_at = COALESCE(progress.completed_at, excluded.completed_at),
        updated_at   = excluded.updated_at
    RETURNING *
"#;

const RECORD_REVIEW: &str = r#"
    UPDATE progress SET
        ease_factor = $2, interval_days = $3, review_count = $4,
        last_review = $5, next_review = $6
    WHERE id = $1
    RETURNING *
"#;

const RECOUNT_COMPLETED: &str = r#"
    UPDATE roadmaps SET completed_modules = (
        SELECT COUNT(*) FROM progress p
        JOIN modules m ON m.id = p.module_id
        WHERE m.roadmap_id = $1 AND p.user_id = $2 AND p.status = 'completed'
    )
    WHERE id = $1
    RETURNING *
"#;

// The no-op update makes the conflicting path lock the existing row.
const LOCK_OR_CREATE_STREAK: &str = r#"
    INSERT INTO learning_streaks
        (id, user_id, current_streak, longest_streak, last_activity_date, total_days_active)
    VALUES ($1, $2, 0, 0, NULL, 0)
    ON CONFLICT (user_id) DO UPDATE SET user_id = excluded.user_id
    RETURNING *
"#;

const SAVE_STREAK: &str = r#"
    UPDATE learning_streaks SET
        current_streak = $2, longest_streak = $3, last_activity_date = $4, total_days_active = $5
    WHERE id = $1
    RETURNING *
"#;

const COUNT_COMPLETED: &str =
    "SELECT COUNT(*) FROM progress WHERE user_id = $1 AND status = 'completed'";

const AWARD_BADGE: &str = r#"
    INSERT INTO badges (id, user_id, name, description, icon, category, earned_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    ON CONFLICT (user_id, name) DO NOTHING
    RETURNING *
"#;

/// One validated progress update for a module the user owns.
#[derive(Debug, Clone)]
pub struct ProgressWrite {
    pub user_id: Uuid,
    pub module_id: Uuid,
    pub roadmap_id: Uuid,
    pub status: ProgressStatus,
    pub score: Option<f64>,
    pub time_spent: Option<f64>,
    pub at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct RecordedProgress {
    pub progress: ProgressRow,
    pub roadmap: RoadmapRow,
    pub streak: LearningStreakRow,
    /// Badges first earned by this update.
    pub new_badges: Vec<BadgeRow>,
}

/// Applies a progress update and everything that follows from it in one
/// transaction: the (user, module) upsert, the SM-2 review on completion,
/// the roadmap's completed count, the learning streak and any badges.
pub async fn record_progress(db: &Db, write: &ProgressWrite) -> Result<RecordedProgress, AppError> {
    let completed = write.status == ProgressStatus::Completed;
    let started_at = (write.status != ProgressStatus::NotStarted).then_some(write.at);
    let completed_at = completed.then_some(write.at);

    with_pool!(db, |pool| {
        let mut tx = pool.begin().await?;

        sqlx::query(LOCK_ROADMAP)
            .bind(write.roadmap_id)
            .bind(write.at)
            .execute(&mut *tx)
            .await?;

        let mut progress = sqlx::query_as::<_, ProgressRow>(UPSERT_PROGRESS)
            .bind(Uuid::new_v4())
            .bind(write.user_id)
            .bind(write.module_id)
            .bind(write.status.as_str())
            .bind(write.score)
            .bind(write.time_spent)
            .bind(started_at)
            .bind(completed_at)
            .bind(write.at)
            .fetch_one(&mut *tx)
            .await?;

        if completed {
            let next = review::apply_review(
                ReviewState {
                    ease_factor: progress.ease_factor,
                    interval_days: progress.interval_days,
                    review_count: progress.review_count,
                },
                review::quality_from_score(write.score),
            );
            let next_review = write
                .at
                .checked_add_signed(Duration::days(i64::from(next.interval_days)))
                .ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!(
                        "next review for progress {} is out of range",
                        progress.id
                    ))
                })?;
            progress = sqlx::query_as::<_, ProgressRow>(RECORD_REVIEW)
                .bind(progress.id)
                .bind(next.ease_factor)
                .bind(next.interval_days)
                .bind(next.review_count)
                .bind(write.at)
                .bind(next_review)
                .fetch_one(&mut *tx)
                .await?;
        }

        let roadmap = sqlx::query_as::<_, RoadmapRow>(RECOUNT_COMPLETED)
            .bind(write.roadmap_id)
            .bind(write.user_id)
            .fetch_one(&mut *tx)
            .await?;

        let mut streak_row = sqlx::query_as::<_, LearningStreakRow>(LOCK_OR_CREATE_STREAK)
            .bind(Uuid::new_v4())
            .bind(write.user_id)
            .fetch_one(&mut *tx)
            .await?;
        let before = StreakState {
            current_streak: streak_row.current_streak,
            longest_streak: streak_row.longest_streak,
            last_activity_date: streak_row.last_activity_date,
            total_days_active: streak_row.total_days_active,
        };
        let after = streak::advance(before, write.at.date_naive());
        if after != before {
            streak_row = sqlx::query_as::<_, LearningStreakRow>(SAVE_STREAK)
                .bind(streak_row.id)
                .bind(after.current_streak)
                .bind(after.longest_streak)
                .bind(after.last_activity_date)
                .bind(after.total_days_active)
                .fetch_one(&mut *tx)
                .await?;
        }

        let modules_completed: i64 = sqlx::query_scalar(COUNT_COMPLETED)
            .bind(write.user_id)
            .fetch_one(&mut *tx)
            .await?;
        let achievements = Achievements {
            modules_completed,
            roadmap_finished: roadmap.total_modules > 0
                && roadmap.completed_modules >= roadmap.total_modules,
            current_streak: streak_row.current_streak,
            completion_score: if completed { progress.score } else { None },
        };

        let mut new_badges = Vec::new();
        for badge in badges::qualifying(&achievements) {
            let awarded = sqlx::query_as::<_, BadgeRow>(AWARD_BADGE)
                .bind(Uuid::new_v4())
                .bind(write.user_id)
                .bind(badge.name)
                .bind(badge.description)
                .bind(badge.icon)
                .bind(badge.category)
                .bind(write.at)
                .fetch_optional(&mut *tx)
                .await?;
            new_badges.extend(awarded);
        }

        tx.commit().await?;
        Ok(RecordedProgress {
            progress,
            roadmap,
            streak: streak_row,
            new_badges,
        })
    })
}

/// Most recently touched first.
pub async fn list_progress(db: &Db, user_id: Uuid) -> Result<Vec<ProgressRow>, sqlx::Error> {
    with_pool!(db, |pool| {
        sqlx::query_as::<_, ProgressRow>(
            "SELECT * FROM progress WHERE user_id = $1 ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    })
}

/// Rows whose next review is at or before `now`, most overdue first.
pub async fn due_reviews(
    db: &Db,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Vec<ProgressRow>, sqlx::Error> {
    with_pool!(db, |pool| {
        sqlx::query_as::<_, ProgressRow>(
            r#"
            SELECT * FROM progress
            WHERE user_id = $1 AND next_review IS NOT NULL AND next_review <= $2
            ORDER BY next_review
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(pool)
        .await
    })
}

pub async fn list_badges(db: &Db, user_id: Uuid) -> Result<Vec<BadgeRow>, sqlx::Error> {
    with_pool!(db, |pool| {
        sqlx::query_as::<_, BadgeRow>("SELECT * FROM badges WHERE user_id = $1 ORDER BY earned_at")
            .bind(user_id)
            .fetch_all(pool)
            .await
    })
}

pub async fn find_streak(db: &Db, user_id: Uuid) -> Result<Option<LearningStreakRow>, sqlx::Error> {
    with_pool!(db, |pool| {
        sqlx::query_as::<_, LearningStreakRow>("SELECT * FROM learning_streaks WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
    })
}
