use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use crate::db::{with_pool, Db};
use crate::mentor::chat::ChatContext;
use crate::models::chat::ChatHistoryRow;

pub struct NewExchange<'a> {
    pub user_id: Uuid,
    pub question: &'a str,
    pub ai_response: &'a str,
    pub context: &'a ChatContext,
    pub model_used: &'a str,
    pub tokens_used: Option<i32>,
    pub at: DateTime<Utc>,
}

/// Appends one question/answer pair. History is never pruned.
pub async fn insert_exchange(db: &Db, new: NewExchange<'_>) -> Result<ChatHistoryRow, sqlx::Error> {
    with_pool!(db, |pool| {
        sqlx::query_as::<_, ChatHistoryRow>(
            r#"
            INSERT INTO chat_history
                (id, user_id, question, ai_response, context, model_used, tokens_used, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.question)
        .bind(new.ai_response)
        .bind(Json(new.context))
        .bind(new.model_used)
        .bind(new.tokens_used)
        .bind(new.at)
        .fetch_one(pool)
        .await
    })
}

/// Newest first.
pub async fn history(db: &Db, user_id: Uuid, limit: i64) -> Result<Vec<ChatHistoryRow>, sqlx::Error> {
    with_pool!(db, |pool| {
        sqlx::query_as::<_, ChatHistoryRow>(
            "SELECT * FROM chat_history WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    })
}
