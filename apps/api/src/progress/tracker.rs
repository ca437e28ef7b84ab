//! Progress Tracker: validates an update, checks module ownership, then
//! hands off to the transactional store.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::db::Db;
use crate::errors::AppError;
use crate::models::progress::ProgressStatus;
use crate::progress::store::{self, ProgressWrite, RecordedProgress};
use crate::roadmap;

#[derive(Debug, Clone, Deserialize)]
pub struct ProgressUpdateRequest {
    pub module_id: Uuid,
    pub status: ProgressStatus,
    pub score: Option<f64>,
    pub time_spent: Option<f64>,
}

fn validate(req: &ProgressUpdateRequest) -> Result<(), AppError> {
    if let Some(score) = req.score {
        if !(0.0..=100.0).contains(&score) {
            return Err(AppError::Validation(
                "score must be between 0 and 100".into(),
            ));
        }
    }
    if let Some(hours) = req.time_spent {
        if !hours.is_finite() || hours < 0.0 {
            return Err(AppError::Validation(
                "time_spent must be a non-negative number of hours".into(),
            ));
        }
    }
    Ok(())
}

pub async fn update_progress(
    db: &Db,
    user_id: Uuid,
    req: &ProgressUpdateRequest,
) -> Result<RecordedProgress, AppError> {
    validate(req)?;

    let module = roadmap::store::find_user_module(db, user_id, req.module_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Module {} not found", req.module_id)))?;

    let recorded = store::record_progress(
        db,
        &ProgressWrite {
            user_id,
            module_id: module.id,
            roadmap_id: module.roadmap_id,
            status: req.status,
            score: req.score,
            time_spent: req.time_spent,
            at: Utc::now(),
        },
    )
    .await?;

    info!(
        "Progress for user {} on module {}: {} (attempt {})",
        user_id,
        module.id,
        req.status.as_str(),
        recorded.progress.attempts
    );
    for badge in &recorded.new_badges {
        info!("User {} earned badge '{}'", user_id, badge.name);
    }
    Ok(recorded)
}
