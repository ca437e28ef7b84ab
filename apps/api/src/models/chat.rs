use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ChatHistoryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub question: String,
    pub ai_response: String,
    pub context: Json<Value>,
    pub model_used: String,
    pub tokens_used: Option<i32>,
    pub created_at: DateTime<Utc>,
}
