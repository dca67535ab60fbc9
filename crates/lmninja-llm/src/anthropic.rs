//! Anthropic messages API client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::{self, BackendClient};
use crate::config::LlmConfig;
use crate::connection::ConnectionRecord;
use crate::error::BackendError;

const PROVIDER: &str = "Anthropic";

/// Models offered for selection; Anthropic has no listing call we use.
const KNOWN_MODELS: &[&str] = &[
    "claude-3-5-sonnet-20240620",
    "claude-3-opus-20240229",
    "claude-3-sonnet-20240229",
    "claude-3-haiku-20240307",
];

/// Anthropic API client.
pub struct AnthropicClient {
    client: reqwest::Client,
    record: ConnectionRecord,
    api_key: String,
    config: LlmConfig,
}

/// Request to the messages API.
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

/// A message in the conversation.
#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response from the messages API.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

/// Error response from the API.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl AnthropicClient {
    /// Create a new Anthropic client.
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
impl BackendClient for AnthropicClient {
    async fn query(&self, prompt: &str) -> Result<String, BackendError> {
        let request = MessagesRequest {
            model: &self.record.model,
            max_tokens: self.config.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let url = format!("{}/v1/messages", self.config.anthropic_base_url);
        let builder = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.config.anthropic_version)
            .json(&request);

        let (status, body) = client::send(PROVIDER, builder, self.config.request_timeout).await?;
        interpret_response(status, &body)
    }

    async fn list_available_models(&self) -> Result<Vec<String>, BackendError> {
        Ok(KNOWN_MODELS.iter().map(|m| m.to_string()).collect())
    }

    fn describe(&self) -> &ConnectionRecord {
        &self.record
    }
}

/// Turn a raw messages-API reply into the answer text.
fn interpret_response(status: u16, body: &str) -> Result<String, BackendError> {
    if !client::is_success(status) {
        let parsed = serde_json::from_str::<ErrorResponse>(body)
            .ok()
            .map(|e| e.error.message);
        return Err(client::upstream(PROVIDER, status, parsed, body));
    }

    let response: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| BackendError::malformed(PROVIDER, e.to_string()))?;

    response
        .content
        .into_iter()
        .find(|block| block.block_type == "text")
        .and_then(|block| block.text)
        .ok_or_else(|| BackendError::malformed(PROVIDER, "no text content in response"))
}
