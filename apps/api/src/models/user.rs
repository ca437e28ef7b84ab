use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// A full `users` row. Deliberately not `Serialize`: the password hash must
/// never reach a response body. Use [`UserProfile`] for that.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub background: Option<String>,
    #[sqlx(rename = "current_title")]
    pub current_role: Option<String>,
    pub target_role: Option<String>,
    pub years_experience: i32,
    pub skills: Json<Vec<String>>,
    #[sqlx(try_from = "String")]
    pub learning_intensity: LearningIntensity,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LearningIntensity {
    Low,
    #[default]
    Moderate,
    High,
}

impl LearningIntensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningIntensity::Low => "low",
            LearningIntensity::Moderate => "moderate",
            LearningIntensity::High => "high",
        }
    }
}

impl TryFrom<String> for LearningIntensity {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "low" => Ok(LearningIntensity::Low),
            "moderate" => Ok(LearningIntensity::Moderate),
            "high" => Ok(LearningIntensity::High),
            other => Err(format!("unknown learning intensity '{other}'")),
        }
    }
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub background: Option<String>,
    pub current_role: Option<String>,
    pub target_role: Option<String>,
    pub years_experience: i32,
    pub skills: Vec<String>,
    pub learning_intensity: LearningIntensity,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            background: row.background,
            current_role: row.current_role,
            target_role: row.target_role,
            years_experience: row.years_experience,
            skills: row.skills.0,
            learning_intensity: row.learning_intensity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
