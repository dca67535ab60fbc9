//! Control protocol for the local engine.
//!
//! Every command is a plain JSON request/response against the engine's
//! loopback endpoint, bounded by its own timeout class.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LocalEngineError;
use crate::EngineConfig;

/// Which model a local query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalQuery<'a> {
    /// A model file on disk (GGUF).
    File(&'a str),
    /// A model served by name (Ollama).
    Named(&'a str),
}

/// Commands understood by the local engine.
#[async_trait]
pub trait ControlProtocol: Send + Sync {
    /// Readiness probe.
    async fn health(&self) -> Result<(), LocalEngineError>;

    /// Materialize a model file, offloading `accelerator_layers` layers.
    async fn load_file_model(&self, path: &str, accelerator_layers: i32)
        -> Result<(), LocalEngineError>;

    /// Load a model by its served name.
    async fn load_named_model(&self, name: &str) -> Result<(), LocalEngineError>;

    /// Release whatever model the engine holds.
    async fn unload(&self) -> Result<(), LocalEngineError>;

    /// Run a non-streamed generation.
    async fn query(&self, model: LocalQuery<'_>, prompt: &str) -> Result<String, LocalEngineError>;

    /// Ask the engine to judge a prompt/response pair. The verdict JSON is
    /// returned as text.
    async fn evaluate_compliance(&self, prompt: &str, response: &str)
        -> Result<String, LocalEngineError>;
}

#[derive(Debug, Serialize)]
struct LoadFileRequest<'a> {
    model_path: &'a str,
    n_gpu_layers: i32,
}

#[derive(Debug, Serialize)]
struct LoadNamedRequest<'a> {
    model_name: &'a str,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model_path: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ollama_model: Option<&'a str>,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct EvaluateRequest<'a> {
    prompt: &'a str,
    response: &'a str,
}

/// HTTP implementation of [`ControlProtocol`].
pub struct HttpControlClient {
    client: reqwest::Client,
    base_url: String,
    config: EngineConfig,
}

impl HttpControlClient {
    /// Create a client for the engine described by `config`.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url(),
            config,
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post(
        &self,
        route: &str,
        body: &impl Serialize,
        timeout: Duration,
    ) -> Result<String, LocalEngineError> {
        let url = format!("{}{}", self.base_url, route);
        debug!("POST {} (timeout {:?})", url, timeout);

        let response = self
            .client
            .post(&url)
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| LocalEngineError::from_reqwest(e, &url, route, timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LocalEngineError::from_reqwest(e, &url, route, timeout))?;

        if !status.is_success() {
            return Err(LocalEngineError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(text)
    }
}

#[async_trait]
impl ControlProtocol for HttpControlClient {
    async fn health(&self) -> Result<(), LocalEngineError> {
        let url = format!("{}/health", self.base_url);
        let timeout = self.config.probe_timeout;

        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| LocalEngineError::from_reqwest(e, &url, "/health", timeout))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(LocalEngineError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }

    async fn load_file_model(
        &self,
        path: &str,
        accelerator_layers: i32,
    ) -> Result<(), LocalEngineError> {
        let request = LoadFileRequest {
            model_path: path,
            n_gpu_layers: accelerator_layers,
        };
        self.post("/load-gguf", &request, self.config.load_file_timeout)
            .await?;
        Ok(())
    }

    async fn load_named_model(&self, name: &str) -> Result<(), LocalEngineError> {
        let request = LoadNamedRequest { model_name: name };
        self.post("/load-ollama", &request, self.config.load_named_timeout)
            .await?;
        Ok(())
    }

    async fn unload(&self) -> Result<(), LocalEngineError> {
        self.post("/unload", &serde_json::json!({}), self.config.unload_timeout)
            .await?;
        Ok(())
    }

    async fn query(&self, model: LocalQuery<'_>, prompt: &str) -> Result<String, LocalEngineError> {
        let request = match model {
            LocalQuery::File(path) => QueryRequest {
                model_path: Some(path),
                ollama_model: None,
                prompt,
            },
            LocalQuery::Named(name) => QueryRequest {
                model_path: None,
                ollama_model: Some(name),
                prompt,
            },
        };

        let body = self
            .post("/query-local", &request, self.config.query_timeout)
            .await?;
        let parsed: QueryResponse = serde_json::from_str(&body)
            .map_err(|e| LocalEngineError::MalformedResponse(format!("{}: {}", e, body)))?;
        Ok(parsed.response)
    }

    async fn evaluate_compliance(
        &self,
        prompt: &str,
        response: &str,
    ) -> Result<String, LocalEngineError> {
        let request = EvaluateRequest { prompt, response };
        self.post("/evaluate_compliance", &request, self.config.evaluate_timeout)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubResponse, StubServer};

    fn client_for(server: &StubServer) -> HttpControlClient {
        HttpControlClient::new(EngineConfig::builder().port(server.port()).build())
    }

    #[test]
    fn test_query_body_shape() {
        let file = QueryRequest {
            model_path: Some("/models/a.gguf"),
            ollama_model: None,
            prompt: "hi",
        };
        assert_eq!(
            serde_json::to_value(&file).unwrap(),
            serde_json::json!({"model_path": "/models/a.gguf", "prompt": "hi"})
        );
    }

    #[tokio::test]
    async fn test_query_hits_query_route() {
        let server = StubServer::start(|path| match path {
            "/query-local" => StubResponse::ok(r#"{"response":"hello back"}"#),
            _ => StubResponse::status(404, r#"{"detail":"Not Found"}"#),
        })
        .await;

        let client = client_for(&server);
        let answer = client
            .query(LocalQuery::File("/models/a.gguf"), "hi")
            .await
            .unwrap();

        assert_eq!(answer, "hello back");
        assert_eq!(server.requests(), vec!["/query-local".to_string()]);
    }

    #[tokio::test]
    async fn test_non_success_keeps_body_verbatim() {
        let server = StubServer::start(|_| {
            StubResponse::status(500, r#"{"detail":"CUDA out of memory"}"#)
        })
        .await;

        let err = client_for(&server)
            .load_file_model("/models/a.gguf", 35)
            .await
            .unwrap_err();

        match err {
            LocalEngineError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, r#"{"detail":"CUDA out of memory"}"#);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_health_ok() {
        let server = StubServer::start(|_| StubResponse::ok(r#"{"status":"ok"}"#)).await;
        client_for(&server).health().await.unwrap();
        assert_eq!(server.requests(), vec!["/health".to_string()]);
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_transport_error() {
        let port = crate::test_support::unused_port();
        let client = HttpControlClient::new(EngineConfig::builder().port(port).build());
        let err = client.unload().await.unwrap_err();
        assert!(matches!(err, LocalEngineError::Transport { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_unload_respects_its_timeout_class() {
        let server = StubServer::start(|_| {
            StubResponse::ok("{}").delayed(std::time::Duration::from_secs(3))
        })
        .await;
        let client = HttpControlClient::new(
            EngineConfig::builder()
                .port(server.port())
                .unload_timeout(std::time::Duration::from_millis(100))
                .build(),
        );

        let err = client.unload().await.unwrap_err();
        match err {
            LocalEngineError::Timeout { route, .. } => assert_eq!(route, "/unload"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_query_body() {
        let server = StubServer::start(|_| StubResponse::ok(r#"{"unexpected":true}"#)).await;
        let err = client_for(&server)
            .query(LocalQuery::Named("llama3"), "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, LocalEngineError::MalformedResponse(_)));
    }
}
