//! Local engine configuration.

use std::time::Duration;

use crate::{DEFAULT_HOST, DEFAULT_PORT};

/// Configuration for supervising and talking to the local engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Host the engine listens on
    pub host: String,
    /// Port the engine listens on (default: 1337)
    pub port: u16,
    /// Explicit launch command; overrides the packaged/dev probe
    pub command: Option<Vec<String>>,
    /// Delay between readiness probes
    pub poll_interval: Duration,
    /// Overall readiness deadline
    pub startup_deadline: Duration,
    /// Per-attempt readiness probe timeout
    pub probe_timeout: Duration,
    /// Timeout for loading a model file
    pub load_file_timeout: Duration,
    /// Timeout for loading a named model (may include a remote fetch)
    pub load_named_timeout: Duration,
    /// Timeout for unloading the current model
    pub unload_timeout: Duration,
    /// Timeout for a non-streamed generation
    pub query_timeout: Duration,
    /// Timeout for a compliance evaluation
    pub evaluate_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            command: None,
            poll_interval: Duration::from_millis(500),
            startup_deadline: Duration::from_secs(120),
            probe_timeout: Duration::from_millis(200),
            load_file_timeout: Duration::from_secs(5 * 60),
            load_named_timeout: Duration::from_secs(10 * 60),
            unload_timeout: Duration::from_secs(30),
            query_timeout: Duration::from_secs(120),
            evaluate_timeout: Duration::from_secs(60),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(port) = std::env::var("LMNINJA_ENGINE_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.port = port;
        }

        // Whitespace-separated, e.g. `python3 engine/main.py`
        if let Ok(cmd) = std::env::var("LMNINJA_ENGINE_CMD") {
            let parts: Vec<String> = cmd.split_whitespace().map(str::to_string).collect();
            if !parts.is_empty() {
                config.command = Some(parts);
            }
        }

        if let Some(secs) = std::env::var("LMNINJA_ENGINE_STARTUP_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.startup_deadline = Duration::from_secs(secs);
        }

        config
    }

    /// Base URL of the engine, e.g. `http://127.0.0.1:1337`.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Create a builder for configuration.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

/// Builder for engine configuration.
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.command = Some(command.into_iter().map(Into::into).collect());
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn startup_deadline(mut self, deadline: Duration) -> Self {
        self.config.startup_deadline = deadline;
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout = timeout;
        self
    }

    pub fn load_file_timeout(mut self, timeout: Duration) -> Self {
        self.config.load_file_timeout = timeout;
        self
    }

    pub fn load_named_timeout(mut self, timeout: Duration) -> Self {
        self.config.load_named_timeout = timeout;
        self
    }

    pub fn unload_timeout(mut self, timeout: Duration) -> Self {
        self.config.unload_timeout = timeout;
        self
    }

    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.config.query_timeout = timeout;
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}
