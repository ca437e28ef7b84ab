//! Text generation for roadmaps and mentor replies.
//!
//! Services only see the [`TextGenerator`] trait. [`LlmClient`] implements it
//! against an OpenAI-compatible chat-completions endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::LlmConfig;

pub mod prompts;

const MAX_TOKENS: u32 = 4096;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("provider did not respond within {0:?}")]
    Timeout(Duration),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// One prompt sent to the provider.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
}

/// The provider's answer.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub tokens_used: Option<u32>,
}

/// Seam between services and the text-generation provider.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier recorded alongside generated content.
    fn model(&self) -> &str;

    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion, LlmError>;
}

/// Calls the generator and deserializes the text response as JSON.
/// The prompt must instruct the model to return valid JSON.
pub async fn complete_json<T: DeserializeOwned>(
    generator: &dyn TextGenerator,
    request: CompletionRequest<'_>,
) -> Result<T, LlmError> {
    let completion = generator.complete(request).await?;

    // Strip markdown code fences if the model wraps JSON in them
    let text = strip_json_fences(&completion.text);
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }

    serde_json::from_str(text).map_err(LlmError::Parse)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

impl ChatResponse {
    /// Extracts the text of the first non-empty choice.
    fn into_completion(self) -> Result<Completion, LlmError> {
        let text = self
            .choices
            .into_iter()
            .filter_map(|c| c.message.content)
            .find(|t| !t.trim().is_empty())
            .ok_or(LlmError::EmptyContent)?;
        Ok(Completion {
            text,
            tokens_used: self.usage.map(|u| u.total_tokens),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
///
/// Calls are not retried. The reqwest client enforces the configured timeout,
/// and an elapsed timeout surfaces as [`LlmError::Timeout`].
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    timeout: Duration,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(LlmError::Http)?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            timeout: config.timeout,
        })
    }

    fn classify(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout(self.timeout)
        } else {
            LlmError::Http(err)
        }
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: request.temperature,
            messages: [
                ChatMessage {
                    role: "system",
                    content: request.system,
                },
                ChatMessage {
                    role: "user",
                    content: request.prompt,
                },
            ],
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, body);
            // Try to parse error message
            let message = serde_json::from_str::<ProviderError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| self.classify(e))?;
        let completion = parsed.into_completion()?;

        debug!(
            "LLM call succeeded: model={}, tokens_used={:?}",
            self.model, completion.tokens_used
        );

        Ok(completion)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
