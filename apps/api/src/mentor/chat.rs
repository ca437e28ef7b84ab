use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::Db;
use crate::errors::AppError;
use crate::llm_client::prompts::NOT_SPECIFIED;
use crate::llm_client::{CompletionRequest, TextGenerator};
use crate::mentor::prompts::{MENTOR_PROMPT_TEMPLATE, MENTOR_SYSTEM, MENTOR_TEMPERATURE};
use crate::mentor::store::{self, NewExchange};
use crate::models::user::UserRow;
use crate::roadmap;

pub const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_background: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub context: Option<ChatContext>,
}

#[derive(Debug, Serialize)]
pub struct MentorReply {
    pub response: String,
    pub model_used: String,
    pub timestamp: DateTime<Utc>,
    pub context: ChatContext,
}

/// Fills the context from what the server knows: the title of an owned
/// module and, failing an explicit one, the profile background.
async fn resolve_context(db: &Db, user: &UserRow, given: ChatContext) -> Result<ChatContext, AppError> {
    let mut context = given;
    if let Some(module_id) = context.module_id {
        if let Some(module) = roadmap::store::find_user_module(db, user.id, module_id).await? {
            context.current_module = Some(module.title);
        }
    }
    if context.user_background.as_deref().map_or(true, |b| b.trim().is_empty()) {
        context.user_background = user.background.clone();
    }
    Ok(context)
}

pub fn build_mentor_prompt(message: &str, context: &ChatContext) -> String {
    let field = |v: &Option<String>| -> String {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(NOT_SPECIFIED)
            .to_string()
    };
    MENTOR_PROMPT_TEMPLATE
        .replace("{current_module}", &field(&context.current_module))
        .replace("{user_background}", &field(&context.user_background))
        .replace("{message}", message)
}

/// Asks the mentor and records the exchange. Nothing is stored when the
/// provider fails.
pub async fn ask_mentor(
    db: &Db,
    generator: &dyn TextGenerator,
    user: &UserRow,
    req: ChatRequest,
) -> Result<MentorReply, AppError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("message cannot be empty".into()));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "message cannot exceed {MAX_MESSAGE_CHARS} characters"
        )));
    }

    let context = resolve_context(db, user, req.context.unwrap_or_default()).await?;
    let prompt = build_mentor_prompt(message, &context);

    let completion = generator
        .complete(CompletionRequest {
            system: MENTOR_SYSTEM,
            prompt: &prompt,
            temperature: MENTOR_TEMPERATURE,
        })
        .await
        .map_err(|e| {
            warn!("Mentor reply failed for user {}: {e}", user.id);
            AppError::from(e)
        })?;

    let row = store::insert_exchange(
        db,
        NewExchange {
            user_id: user.id,
            question: message,
            ai_response: &completion.text,
            context: &context,
            model_used: generator.model(),
            tokens_used: completion.tokens_used.and_then(|t| i32::try_from(t).ok()),
            at: Utc::now(),
        },
    )
    .await?;

    info!("Mentor answered user {} (chat {})", user.id, row.id);
    Ok(MentorReply {
        response: row.ai_response,
        model_used: row.model_used,
        timestamp: row.created_at,
        context,
    })
}
