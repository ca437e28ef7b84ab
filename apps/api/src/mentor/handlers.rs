use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::mentor::chat::{ask_mentor, ChatRequest, MentorReply};
use crate::mentor::store;
use crate::models::chat::ChatHistoryRow;
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// POST /api/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<ChatRequest>,
) -> Result<Json<MentorReply>, AppError> {
    let reply = ask_mentor(&state.db, state.generator.as_ref(), &user, req).await?;
    Ok(Json(reply))
}

/// GET /api/chat/history
pub async fn handle_history(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ChatHistoryRow>>, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    Ok(Json(store::history(&state.db, user.id(), limit).await?))
}
