use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct AssessmentRow {
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    #[sqlx(try_from = "String")]
    pub kind: AssessmentKind,
    pub questions: Json<Vec<Question>>,
    pub passing_score: f64,
    pub time_limit_minutes: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentKind {
    #[default]
    Quiz,
    CodingChallenge,
    Project,
}

impl AssessmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentKind::Quiz => "quiz",
            AssessmentKind::CodingChallenge => "coding_challenge",
            AssessmentKind::Project => "project",
        }
    }
}

impl TryFrom<String> for AssessmentKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "quiz" => Ok(AssessmentKind::Quiz),
            "coding_challenge" => Ok(AssessmentKind::CodingChallenge),
            "project" => Ok(AssessmentKind::Project),
            other => Err(format!("unknown assessment kind '{other}'")),
        }
    }
}
