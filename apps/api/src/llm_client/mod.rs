//! LLM client — the single point of entry for all OpenAI API calls.
//!
//! ARCHITECTURAL RULE: no other module may call the OpenAI API directly.
//! All model interactions go through `ChatModel`, which the orchestrator
//! receives as `Arc<dyn ChatModel>` so tests can substitute a scripted
//! double.
//!
//! Model: gpt-4o-mini (hardcoded — do not make configurable to prevent drift)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
/// The model used for all dialogue calls.
pub const MODEL: &str = "gpt-4o-mini";
const REQUEST_TIMEOUT_SECS: u64 = 60;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned no choices")]
    EmptyResponse,
}

/// One message in the chat transcript sent to the model.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// A callable function declared to the model: name, description, and a JSON
/// schema for its parameters.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// The model's answer, reduced to what the dialogue layer needs: free text
/// and/or a single requested action.
#[derive(Debug, Clone, Default)]
pub struct ChatOutcome {
    pub content: Option<String>,
    pub tool_call: Option<ToolCallRequest>,
}

/// A request from the model to invoke one declared function. `arguments` is
/// the raw JSON string exactly as the model produced it.
#[derive(Debug, Clone)]
pub struct ToolCallRequest {
    pub name: String,
    pub arguments: String,
}

/// Opaque model capability: given a transcript and a set of declared
/// functions, returns free text or a request to invoke exactly one of them.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        functions: &[FunctionSpec],
    ) -> Result<ChatOutcome, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolEnvelope<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ToolEnvelope<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a FunctionSpec,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

impl ChatResponse {
    /// Reduces the first choice to a `ChatOutcome`, taking only the first
    /// tool call — exactly one action is processed per turn.
    fn into_outcome(self) -> Result<ChatOutcome, LlmError> {
        let message = self
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?
            .message;
        Ok(ChatOutcome {
            content: message.content,
            tool_call: message.tool_calls.into_iter().next().map(|c| ToolCallRequest {
                name: c.function.name,
                arguments: c.function.arguments,
            }),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The production `ChatModel`. Wraps the OpenAI Chat Completions API with a
/// finite request timeout and retry on 429/5xx with exponential backoff.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    async fn call(
        &self,
        messages: &[ChatMessage],
        functions: &[FunctionSpec],
    ) -> Result<ChatOutcome, LlmError> {
        let request_body = ChatRequest {
            model: MODEL,
            messages,
            tools: functions
                .iter()
                .map(|f| ToolEnvelope {
                    kind: "function",
                    function: f,
                })
                .collect(),
            tool_choice: (!functions.is_empty()).then_some("auto"),
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(OPENAI_API_URL)
                .bearer_auth(&self.api_key)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<OpenAiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let chat_response: ChatResponse = response.json().await.map_err(LlmError::Http)?;

            if let Some(usage) = &chat_response.usage {
                debug!(
                    "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                    usage.prompt_tokens, usage.completion_tokens
                );
            }

            return chat_response.into_outcome();
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        functions: &[FunctionSpec],
    ) -> Result<ChatOutcome, LlmError> {
        self.call(messages, functions).await
    }
}
