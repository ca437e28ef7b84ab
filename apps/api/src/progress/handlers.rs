use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::achievement::{BadgeRow, LearningStreakRow};
use crate::models::progress::ProgressRow;
use crate::progress::store::{self, RecordedProgress};
use crate::progress::tracker::{update_progress, ProgressUpdateRequest};
use crate::state::AppState;

#[derive(Serialize)]
pub struct ProgressResponse {
    pub progress: ProgressRow,
    pub completed_modules: i32,
    pub total_modules: i32,
    pub streak: LearningStreakRow,
    pub new_badges: Vec<BadgeRow>,
}

impl From<RecordedProgress> for ProgressResponse {
    fn from(recorded: RecordedProgress) -> Self {
        Self {
            progress: recorded.progress,
            completed_modules: recorded.roadmap.completed_modules,
            total_modules: recorded.roadmap.total_modules,
            streak: recorded.streak,
            new_badges: recorded.new_badges,
        }
    }
}

/// POST /api/progress/update
pub async fn handle_update(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<ProgressUpdateRequest>,
) -> Result<Json<ProgressResponse>, AppError> {
    let recorded = update_progress(&state.db, user.id(), &req).await?;
    Ok(Json(recorded.into()))
}

/// GET /api/progress/me
pub async fn handle_list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<ProgressRow>>, AppError> {
    Ok(Json(store::list_progress(&state.db, user.id()).await?))
}

/// GET /api/progress/reviews
pub async fn handle_due_reviews(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<ProgressRow>>, AppError> {
    Ok(Json(store::due_reviews(&state.db, user.id(), Utc::now()).await?))
}

/// GET /api/badges
pub async fn handle_badges(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<BadgeRow>>, AppError> {
    Ok(Json(store::list_badges(&state.db, user.id()).await?))
}
