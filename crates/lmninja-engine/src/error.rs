//! Error types for local engine operations.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while supervising or talking to the local engine.
#[derive(Debug, Error)]
pub enum LocalEngineError {
    /// The engine could not be reached at all.
    #[error("Local engine unreachable at {url}: {message}")]
    Transport { url: String, message: String },

    /// The request did not complete within its timeout class.
    #[error("Local engine request to {route} timed out after {}s", .timeout.as_secs())]
    Timeout { route: String, timeout: Duration },

    /// The engine answered with a non-success status.
    #[error("Local engine error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The engine answered 2xx with a body we could not use.
    #[error("Malformed response from local engine: {0}")]
    MalformedResponse(String),

    /// The engine never became healthy within the startup deadline.
    #[error("Local engine did not become healthy within {}s", .0.as_secs())]
    StartupTimeout(Duration),

    /// The engine process could not be launched.
    #[error("Failed to start local engine `{command}`: {message}")]
    SpawnFailed { command: String, message: String },

    /// The engine process exited while we were waiting for it.
    #[error("Local engine process exited during startup: {0}")]
    ProcessExited(String),

    /// The engine process could not be terminated.
    #[error("Failed to stop local engine: {0}")]
    StopFailed(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LocalEngineError {
    /// Map a reqwest failure for `route` into the matching variant.
    pub(crate) fn from_reqwest(err: reqwest::Error, url: &str, route: &str, timeout: Duration) -> Self {
        if err.is_timeout() {
            LocalEngineError::Timeout {
                route: route.to_string(),
                timeout,
            }
        } else {
            LocalEngineError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}
