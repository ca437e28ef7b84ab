use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RoadmapRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub goal: String,
    pub tech_stack: Json<Vec<String>>,
    pub total_modules: i32,
    pub completed_modules: i32,
    pub estimated_weeks: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ModuleRow {
    pub id: Uuid,
    pub roadmap_id: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    #[sqlx(try_from = "String")]
    pub difficulty: Difficulty,
    pub estimated_hours: f64,
    pub position: i32,
    pub prerequisites: Json<Vec<Uuid>>,
    pub resources: Json<Value>,
    pub learning_objectives: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    /// Reads a difficulty the way a model is likely to write it. Anything
    /// unrecognised is treated as beginner.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "intermediate" | "medium" => Difficulty::Intermediate,
            "advanced" | "expert" | "hard" => Difficulty::Advanced,
            _ => Difficulty::Beginner,
        }
    }
}

impl TryFrom<String> for Difficulty {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(format!("unknown difficulty '{other}'")),
        }
    }
}
