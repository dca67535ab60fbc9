//! Session configuration.

use std::time::Duration;

/// Timeouts visible to the caller of the application surface.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Bound on a single prompt, shorter than any load/unload timeout
    pub prompt_timeout: Duration,
    /// Bound on a connection test
    pub test_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prompt_timeout: Duration::from_secs(90),
            test_timeout: Duration::from_secs(30),
        }
    }
}

impl SessionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let prompt_timeout = std::env::var("LMNINJA_PROMPT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.prompt_timeout);

        Self {
            prompt_timeout,
            test_timeout: defaults.test_timeout,
        }
    }

    pub fn with_prompt_timeout(mut self, timeout: Duration) -> Self {
        self.prompt_timeout = timeout;
        self
    }

    pub fn with_test_timeout(mut self, timeout: Duration) -> Self {
        self.test_timeout = timeout;
        self
    }
}
