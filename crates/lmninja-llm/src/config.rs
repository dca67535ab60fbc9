//! Backend client configuration.

use std::time::Duration;

/// Configuration shared by the cloud clients.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// OpenAI API base URL (default: https://api.openai.com)
    pub openai_base_url: String,
    /// Anthropic API base URL (default: https://api.anthropic.com)
    pub anthropic_base_url: String,
    /// Gemini API base URL (default: https://generativelanguage.googleapis.com)
    pub gemini_base_url: String,
    /// Value of the `anthropic-version` header
    pub anthropic_version: String,
    /// Maximum tokens in a response, where the provider requires it
    pub max_tokens: u32,
    /// Timeout for a single completion request
    pub request_timeout: Duration,
    /// Timeout for listing a provider's models
    pub list_timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_base_url: "https://api.openai.com".to_string(),
            anthropic_base_url: "https://api.anthropic.com".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            anthropic_version: "2023-06-01".to_string(),
            max_tokens: 2048,
            request_timeout: Duration::from_secs(120),
            list_timeout: Duration::from_secs(30),
        }
    }
}

impl LlmConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let openai_base_url =
            std::env::var("LMNINJA_OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url);
        let anthropic_base_url =
            std::env::var("LMNINJA_ANTHROPIC_BASE_URL").unwrap_or(defaults.anthropic_base_url);
        let gemini_base_url =
            std::env::var("LMNINJA_GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url);

        let max_tokens = std::env::var("LMNINJA_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_tokens);

        let request_timeout = std::env::var("LMNINJA_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        Self {
            openai_base_url,
            anthropic_base_url,
            gemini_base_url,
            anthropic_version: defaults.anthropic_version,
            max_tokens,
            request_timeout,
            list_timeout: defaults.list_timeout,
        }
    }

    /// Create a builder for configuration.
    pub fn builder() -> LlmConfigBuilder {
        LlmConfigBuilder::default()
    }
}

/// Builder for backend configuration.
#[derive(Debug, Default)]
pub struct LlmConfigBuilder {
    config: LlmConfig,
}

impl LlmConfigBuilder {
    pub fn openai_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.openai_base_url = url.into();
        self
    }

    pub fn anthropic_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.anthropic_base_url = url.into();
        self
    }

    pub fn gemini_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.gemini_base_url = url.into();
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = tokens;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn list_timeout(mut self, timeout: Duration) -> Self {
        self.config.list_timeout = timeout;
        self
    }

    pub fn build(self) -> LlmConfig {
        self.config
    }
}
