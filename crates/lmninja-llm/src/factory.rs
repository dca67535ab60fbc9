//! Building backend clients from connection records.

use std::sync::Arc;

use lmninja_engine::ControlProtocol;
use tracing::debug;

use crate::anthropic::AnthropicClient;
use crate::client::BackendClient;
use crate::config::LlmConfig;
use crate::connection::{BackendKind, ConnectionRecord};
use crate::credentials::CredentialStore;
use crate::error::BackendError;
use crate::gemini::GeminiClient;
use crate::local::LocalEngineClient;
use crate::openai::OpenAIClient;

/// Turns a connection record into a ready client.
pub trait ClientFactory: Send + Sync {
    fn build(&self, connection: &ConnectionRecord) -> Result<Arc<dyn BackendClient>, BackendError>;
}

/// Factory for the built-in backends.
pub struct DefaultClientFactory {
    credentials: Arc<dyn CredentialStore>,
    control: Arc<dyn ControlProtocol>,
    config: LlmConfig,
}

impl DefaultClientFactory {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        control: Arc<dyn ControlProtocol>,
        config: LlmConfig,
    ) -> Self {
        Self {
            credentials,
            control,
            config,
        }
    }
}

impl ClientFactory for DefaultClientFactory {
    fn build(&self, connection: &ConnectionRecord) -> Result<Arc<dyn BackendClient>, BackendError> {
        debug!("Building {} client for {}", connection.kind, connection.id);

        let record = connection.clone();
        let config = self.config.clone();

        let client: Arc<dyn BackendClient> = match connection.kind {
            BackendKind::OpenAI => {
                let key = self.credentials.get_secret(connection)?;
                Arc::new(OpenAIClient::new(record, key, config)?)
            }
            BackendKind::Anthropic => {
                let key = self.credentials.get_secret(connection)?;
                Arc::new(AnthropicClient::new(record, key, config)?)
            }
            BackendKind::Gemini => {
                let key = self.credentials.get_secret(connection)?;
                Arc::new(GeminiClient::new(record, key, config)?)
            }
            BackendKind::Gguf | BackendKind::Ollama => {
                Arc::new(LocalEngineClient::new(record, self.control.clone()))
            }
        };

        Ok(client)
    }
}
