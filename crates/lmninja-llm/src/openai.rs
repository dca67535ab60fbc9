//! OpenAI chat completions client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{self, BackendClient};
use crate::config::LlmConfig;
use crate::connection::ConnectionRecord;
use crate::error::BackendError;

const PROVIDER: &str = "OpenAI";

/// OpenAI API client.
pub struct OpenAIClient {
    client: reqwest::Client,
    record: ConnectionRecord,
    api_key: String,
    config: LlmConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Response from `/v1/models`.
#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<Model>,
}

#[derive(Debug, Deserialize)]
struct Model {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl OpenAIClient {
    /// Create a new OpenAI client.
    pub fn new(
        record: ConnectionRecord,
        api_key: impl Into<String>,
        config: LlmConfig,
    ) -> Result<Self, BackendError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(BackendError::MissingCredential(record.id));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            record,
            api_key,
            config,
        })
    }
}

#[async_trait]
impl BackendClient for OpenAIClient {
    async fn query(&self, prompt: &str) -> Result<String, BackendError> {
        let request = ChatRequest {
            model: &self.record.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let url = format!("{}/v1/chat/completions", self.config.openai_base_url);
        let builder = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request);

        let (status, body) = client::send(PROVIDER, builder, self.config.request_timeout).await?;
        interpret_chat_response(status, &body)
    }

    async fn list_available_models(&self) -> Result<Vec<String>, BackendError> {
        let url = format!("{}/v1/models", self.config.openai_base_url);
        let builder = self.client.get(&url).bearer_auth(&self.api_key);

        let (status, body) = client::send(PROVIDER, builder, self.config.list_timeout).await?;
        let models = interpret_model_list(status, &body)?;
        debug!("OpenAI offers {} chat model(s)", models.len());
        Ok(models)
    }

    fn describe(&self) -> &ConnectionRecord {
        &self.record
    }
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|e| e.error.message)
}

fn interpret_chat_response(status: u16, body: &str) -> Result<String, BackendError> {
    if !client::is_success(status) {
        return Err(client::upstream(PROVIDER, status, error_message(body), body));
    }

    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| BackendError::malformed(PROVIDER, e.to_string()))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::malformed(PROVIDER, "returned no choices"))?;

    choice
        .message
        .content
        .ok_or_else(|| BackendError::malformed(PROVIDER, "first choice has no content"))
}

/// Keep only chat models (`gpt-*`), alphabetically.
fn interpret_model_list(status: u16, body: &str) -> Result<Vec<String>, BackendError> {
    if !client::is_success(status) {
        return Err(client::upstream(PROVIDER, status, error_message(body), body));
    }

    let list: ModelList = serde_json::from_str(body)
        .map_err(|e| BackendError::malformed(PROVIDER, e.to_string()))?;

    let mut ids: Vec<String> = list
        .data
        .into_iter()
        .map(|m| m.id)
        .filter(|id| id.starts_with("gpt-"))
        .collect();
    ids.sort();
    Ok(ids)
}
