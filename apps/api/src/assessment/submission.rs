use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::assessment::grading::{grade, Grade};
use crate::assessment::store;
use crate::db::Db;
use crate::errors::AppError;
use crate::models::achievement::BadgeRow;
use crate::models::progress::ProgressStatus;
use crate::progress::tracker::{update_progress, ProgressUpdateRequest};

#[derive(Debug, Deserialize)]
pub struct SubmitAnswersRequest {
    pub answers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AssessmentResult {
    pub assessment_id: Uuid,
    #[serde(flatten)]
    pub grade: Grade,
    pub new_badges: Vec<BadgeRow>,
}

/// Grades a submission and records it against the module: a pass completes
/// the module, a fail leaves it in progress. Either way the score is stored.
pub async fn submit_answers(
    db: &Db,
    user_id: Uuid,
    assessment_id: Uuid,
    req: &SubmitAnswersRequest,
) -> Result<AssessmentResult, AppError> {
    let assessment = store::find_user_assessment(db, user_id, assessment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Assessment {assessment_id} not found")))?;

    let grade = grade(&assessment.questions.0, &req.answers, assessment.passing_score);

    let recorded = update_progress(
        db,
        user_id,
        &ProgressUpdateRequest {
            module_id: assessment.module_id,
            status: if grade.passed {
                ProgressStatus::Completed
            } else {
                ProgressStatus::InProgress
            },
            score: Some(grade.score),
            time_spent: None,
        },
    )
    .await?;

    info!(
        "User {} scored {:.1} on assessment {} (passed: {})",
        user_id, grade.score, assessment_id, grade.passed
    );
    Ok(AssessmentResult {
        assessment_id,
        grade,
        new_badges: recorded.new_badges,
    })
}
