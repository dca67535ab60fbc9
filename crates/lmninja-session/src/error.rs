//! Session-level errors.

use std::time::Duration;

use thiserror::Error;

use lmninja_engine::LocalEngineError;
use lmninja_llm::{BackendError, StoreError};

/// Everything the application surface can report to its caller.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The local engine never became healthy.
    #[error("local engine did not become healthy within {}s", .0.as_secs())]
    StartupTimeout(Duration),

    /// The local engine refused or failed a load/unload call.
    #[error("local engine failed to load '{connection_id}': {message}")]
    BackendUnavailable {
        connection_id: String,
        message: String,
    },

    #[error("no API key stored for connection '{0}'")]
    MissingCredential(String),

    #[error("connection not found: {0}")]
    NotFound(String),

    #[error("no model is loaded")]
    NoActiveModel,

    /// The backend answered with an error of its own.
    #[error("{provider} API error ({status}): {message}")]
    UpstreamError {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("malformed response from {provider}: {reason}")]
    MalformedResponse {
        provider: &'static str,
        reason: String,
    },

    #[error("could not reach {provider}: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },

    #[error("{operation} timed out after {}s", .timeout.as_secs())]
    Timeout {
        operation: String,
        timeout: Duration,
    },

    /// The active model changed while the prompt was in flight.
    #[error("the active model changed while the prompt was running; answer discarded")]
    StaleSession,

    #[error("connection store: {0}")]
    Store(#[from] StoreError),

    /// Local engine failures outside of model loading.
    #[error(transparent)]
    Engine(LocalEngineError),
}

impl From<BackendError> for SessionError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Transport { provider, message } => {
                SessionError::Transport { provider, message }
            }
            BackendError::Timeout { provider, timeout } => SessionError::Timeout {
                operation: format!("{provider} request"),
                timeout,
            },
            BackendError::Upstream {
                provider,
                status,
                message,
            } => SessionError::UpstreamError {
                provider,
                status,
                message,
            },
            BackendError::MalformedResponse { provider, reason } => {
                SessionError::MalformedResponse { provider, reason }
            }
            BackendError::MissingCredential(id) => SessionError::MissingCredential(id),
        }
    }
}

impl SessionError {
    /// Map a supervisor start failure.
    pub(crate) fn from_startup(err: LocalEngineError) -> Self {
        match err {
            LocalEngineError::StartupTimeout(deadline) => SessionError::StartupTimeout(deadline),
            other => SessionError::Engine(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_errors_keep_their_class() {
        let err: SessionError = BackendError::MissingCredential("1".into()).into();
        assert!(matches!(err, SessionError::MissingCredential(id) if id == "1"));

        let err: SessionError = BackendError::Upstream {
            provider: "OpenAI",
            status: 429,
            message: "Rate limit reached".into(),
        }
        .into();
        assert_eq!(err.to_string(), "OpenAI API error (429): Rate limit reached");
    }

    #[test]
    fn test_startup_timeout_mapping() {
        let err = SessionError::from_startup(LocalEngineError::StartupTimeout(Duration::from_secs(120)));
        assert!(matches!(err, SessionError::StartupTimeout(d) if d.as_secs() == 120));

        let err = SessionError::from_startup(LocalEngineError::ProcessExited("exit status: 1".into()));
        assert!(matches!(err, SessionError::Engine(_)));
    }
}
