//! Error types for backend clients and collaborators.

use std::time::Duration;

use thiserror::Error;

use lmninja_engine::LocalEngineError;

/// Provider label used for errors coming from the local engine.
pub(crate) const LOCAL_ENGINE: &str = "local engine";

/// Uniform failure classes for every backend client.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The remote endpoint could not be reached.
    #[error("could not reach {provider}: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },

    /// The call exceeded its timeout and was cancelled.
    #[error("{provider} request timed out after {}s", .timeout.as_secs())]
    Timeout {
        provider: &'static str,
        timeout: Duration,
    },

    /// Non-success status; `message` is the provider's own error text.
    #[error("{provider} API error ({status}): {message}")]
    Upstream {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// A 2xx response without usable content.
    #[error("malformed response from {provider}: {reason}")]
    MalformedResponse {
        provider: &'static str,
        reason: String,
    },

    /// No secret stored for a cloud connection.
    #[error("no API key stored for connection '{0}'")]
    MissingCredential(String),
}

impl BackendError {
    /// The URL is stripped from the message; it can carry credentials.
    pub(crate) fn from_reqwest(provider: &'static str, err: reqwest::Error, timeout: Duration) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            BackendError::Timeout { provider, timeout }
        } else {
            BackendError::Transport {
                provider,
                message: err.to_string(),
            }
        }
    }

    pub(crate) fn malformed(provider: &'static str, reason: impl Into<String>) -> Self {
        BackendError::MalformedResponse {
            provider,
            reason: reason.into(),
        }
    }
}

impl From<LocalEngineError> for BackendError {
    fn from(err: LocalEngineError) -> Self {
        match err {
            LocalEngineError::Transport { message, .. } => BackendError::Transport {
                provider: LOCAL_ENGINE,
                message,
            },
            LocalEngineError::Timeout { timeout, .. } => BackendError::Timeout {
                provider: LOCAL_ENGINE,
                timeout,
            },
            LocalEngineError::Status { status, body } => BackendError::Upstream {
                provider: LOCAL_ENGINE,
                status,
                message: body,
            },
            LocalEngineError::MalformedResponse(reason) => BackendError::MalformedResponse {
                provider: LOCAL_ENGINE,
                reason,
            },
            other => BackendError::Transport {
                provider: LOCAL_ENGINE,
                message: other.to_string(),
            },
        }
    }
}

/// Errors from the connection store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not determine the user config directory")]
    NoConfigDir,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_status_becomes_upstream() {
        let err: BackendError = LocalEngineError::Status {
            status: 422,
            body: r#"{"detail":"bad path"}"#.to_string(),
        }
        .into();

        match err {
            BackendError::Upstream {
                provider,
                status,
                message,
            } => {
                assert_eq!(provider, LOCAL_ENGINE);
                assert_eq!(status, 422);
                assert_eq!(message, r#"{"detail":"bad path"}"#);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_engine_timeout_is_preserved() {
        let err: BackendError = LocalEngineError::Timeout {
            route: "/query-local".to_string(),
            timeout: Duration::from_secs(120),
        }
        .into();
        assert!(matches!(err, BackendError::Timeout { .. }));
        assert_eq!(err.to_string(), "local engine request timed out after 120s");
    }
}
