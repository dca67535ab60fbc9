//! The backend capability surface.

use std::time::Duration;

use async_trait::async_trait;

use crate::connection::ConnectionRecord;
use crate::error::BackendError;

/// What the session layer needs from any backend.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Send a single-turn prompt and return the answer text.
    async fn query(&self, prompt: &str) -> Result<String, BackendError>;

    /// Models this backend offers. Local backends report none; their
    /// models are discovered on disk.
    async fn list_available_models(&self) -> Result<Vec<String>, BackendError>;

    /// The connection this client was built from.
    fn describe(&self) -> &ConnectionRecord;
}

/// Send `request` and collect `(status, body)`.
pub(crate) async fn send(
    provider: &'static str,
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<(u16, String), BackendError> {
    let response = request
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| BackendError::from_reqwest(provider, e, timeout))?;

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| BackendError::from_reqwest(provider, e, timeout))?;

    Ok((status, body))
}

/// Build an upstream error, preferring the provider's parsed message over
/// the raw body.
pub(crate) fn upstream(
    provider: &'static str,
    status: u16,
    parsed: Option<String>,
    body: &str,
) -> BackendError {
    let message = match parsed {
        Some(message) if !message.is_empty() => message,
        _ => body.to_string(),
    };
    BackendError::Upstream {
        provider,
        status,
        message,
    }
}

pub(crate) fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}
