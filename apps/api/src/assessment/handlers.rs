use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::assessment::store::{self, NewAssessment};
use crate::assessment::submission::{submit_answers, AssessmentResult, SubmitAnswersRequest};
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::assessment::{AssessmentKind, AssessmentRow, Question};
use crate::roadmap;
use crate::state::AppState;

const DEFAULT_PASSING_SCORE: f64 = 70.0;

#[derive(Debug, Deserialize)]
pub struct CreateAssessmentRequest {
    pub module_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub kind: AssessmentKind,
    pub questions: Vec<Question>,
    pub passing_score: Option<f64>,
    pub time_limit_minutes: Option<i32>,
}

/// A question as the learner sees it: no answer, no explanation.
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub question: String,
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct AssessmentView {
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub kind: AssessmentKind,
    pub questions: Vec<PublicQuestion>,
    pub passing_score: f64,
    pub time_limit_minutes: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<AssessmentRow> for AssessmentView {
    fn from(row: AssessmentRow) -> Self {
        Self {
            id: row.id,
            module_id: row.module_id,
            title: row.title,
            kind: row.kind,
            questions: row
                .questions
                .0
                .into_iter()
                .map(|q| PublicQuestion {
                    question: q.question,
                    options: q.options,
                })
                .collect(),
            passing_score: row.passing_score,
            time_limit_minutes: row.time_limit_minutes,
            created_at: row.created_at,
        }
    }
}

fn validate(req: &CreateAssessmentRequest) -> Result<f64, AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("title cannot be empty".into()));
    }
    if req.questions.is_empty() {
        return Err(AppError::Validation("an assessment needs at least one question".into()));
    }
    for (i, q) in req.questions.iter().enumerate() {
        if q.question.trim().is_empty() || q.correct_answer.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "question {i} needs both a question and a correct_answer"
            )));
        }
        if let Some(options) = &q.options {
            if options.len() < 2 {
                return Err(AppError::Validation(format!(
                    "question {i}: a multiple-choice question needs at least two options"
                )));
            }
            let listed = options
                .iter()
                .any(|o| o.trim().eq_ignore_ascii_case(q.correct_answer.trim()));
            if !listed {
                return Err(AppError::Validation(format!(
                    "question {i}: correct_answer must be one of the options"
                )));
            }
        }
    }
    if req.time_limit_minutes.is_some_and(|m| m <= 0) {
        return Err(AppError::Validation("time_limit_minutes must be positive".into()));
    }
    let passing_score = req.passing_score.unwrap_or(DEFAULT_PASSING_SCORE);
    if !(0.0..=100.0).contains(&passing_score) {
        return Err(AppError::Validation("passing_score must be between 0 and 100".into()));
    }
    Ok(passing_score)
}

/// POST /api/assessments
pub async fn handle_create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateAssessmentRequest>,
) -> Result<(StatusCode, Json<AssessmentView>), AppError> {
    let passing_score = validate(&req)?;
    roadmap::store::find_user_module(&state.db, user.id(), req.module_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Module {} not found", req.module_id)))?;

    let row = store::insert_assessment(
        &state.db,
        NewAssessment {
            module_id: req.module_id,
            title: req.title.trim(),
            kind: req.kind,
            questions: &req.questions,
            passing_score,
            time_limit_minutes: req.time_limit_minutes,
        },
    )
    .await?;

    info!("Created assessment {} for module {}", row.id, row.module_id);
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// GET /api/assessments/:id
pub async fn handle_get(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AssessmentView>, AppError> {
    store::find_user_assessment(&state.db, user.id(), id)
        .await?
        .map(|row| Json(row.into()))
        .ok_or_else(|| AppError::NotFound(format!("Assessment {id} not found")))
}

/// POST /api/assessments/:id/submit
pub async fn handle_submit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitAnswersRequest>,
) -> Result<Json<AssessmentResult>, AppError> {
    Ok(Json(submit_answers(&state.db, user.id(), id, &req).await?))
}
