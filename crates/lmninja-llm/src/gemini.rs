//! Google Gemini client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::{self, BackendClient};
use crate::config::LlmConfig;
use crate::connection::ConnectionRecord;
use crate::error::BackendError;

const PROVIDER: &str = "Gemini";

const KNOWN_MODELS: &[&str] = &[
    "gemini-1.5-pro-latest",
    "gemini-1.5-flash-latest",
    "gemini-1.0-pro",
];

/// Gemini API client. Authenticates with the `x-goog-api-key` header.
pub struct GeminiClient {
    client: reqwest::Client,
    record: ConnectionRecord,
    api_key: String,
    config: LlmConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl GeminiClient {
    /// Create a new Gemini client.
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
impl BackendClient for GeminiClient {
    async fn query(&self, prompt: &str) -> Result<String, BackendError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.gemini_base_url, self.record.model
        );
        let builder = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
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

fn interpret_response(status: u16, body: &str) -> Result<String, BackendError> {
    if !client::is_success(status) {
        let parsed = serde_json::from_str::<ErrorResponse>(body)
            .ok()
            .map(|e| e.error.message);
        return Err(client::upstream(PROVIDER, status, parsed, body));
    }

    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| BackendError::malformed(PROVIDER, e.to_string()))?;

    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|content| content.parts.into_iter().next())
        .map(|part| part.text)
        .ok_or_else(|| BackendError::malformed(PROVIDER, "no content in response"))
}
