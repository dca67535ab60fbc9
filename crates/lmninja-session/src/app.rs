//! The application surface: one supervisor, one coordinator.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use lmninja_engine::{
    scan_gguf_dir, ControlProtocol, EngineConfig, GgufFile, HttpControlClient, Supervisor,
    SupervisorStatus,
};
use lmninja_llm::{
    BackendError, ClientFactory, ConnectionRecord, ConnectionStore, CredentialStore,
    DefaultClientFactory, LlmConfig,
};

use crate::config::SessionConfig;
use crate::coordinator::{ActiveInfo, Coordinator};
use crate::error::SessionError;

/// Result of one prompt in a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptOutcome {
    pub prompt: String,
    pub response: Option<String>,
    pub error: Option<String>,
}

impl PromptOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// LMNinja application.
///
/// Owns the engine supervisor and the session coordinator; everything the
/// UI or CLI does goes through here.
pub struct LmNinja {
    supervisor: Arc<Supervisor>,
    control: Arc<dyn ControlProtocol>,
    connections: Arc<dyn ConnectionStore>,
    factory: Arc<dyn ClientFactory>,
    coordinator: Coordinator,
    config: SessionConfig,
}

impl LmNinja {
    /// Wire up the real engine client, supervisor and client factory.
    pub fn new(
        engine: EngineConfig,
        llm: LlmConfig,
        session: SessionConfig,
        connections: Arc<dyn ConnectionStore>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        let control: Arc<dyn ControlProtocol> = Arc::new(HttpControlClient::new(engine.clone()));
        let supervisor = Arc::new(Supervisor::with_probe(engine, control.clone()));
        let factory = Arc::new(DefaultClientFactory::new(credentials, control.clone(), llm));
        Self::from_parts(supervisor, control, factory, connections, session)
    }

    pub fn from_parts(
        supervisor: Arc<Supervisor>,
        control: Arc<dyn ControlProtocol>,
        factory: Arc<dyn ClientFactory>,
        connections: Arc<dyn ConnectionStore>,
        config: SessionConfig,
    ) -> Self {
        let coordinator = Coordinator::new(
            connections.clone(),
            factory.clone(),
            control.clone(),
            config.clone(),
        );
        Self {
            supervisor,
            control,
            connections,
            factory,
            coordinator,
            config,
        }
    }

    /// Start the engine in the background. The application is usable
    /// immediately; watch [`LmNinja::subscribe_status`] for readiness.
    pub fn startup(&self) -> JoinHandle<Result<(), SessionError>> {
        let supervisor = self.supervisor.clone();
        tokio::spawn(async move {
            supervisor.start().await.map_err(|e| {
                error!("Local engine unavailable: {}", e);
                SessionError::from_startup(e)
            })
        })
    }

    /// Start the engine and wait for it.
    pub async fn start_engine(&self) -> Result<(), SessionError> {
        self.supervisor
            .start()
            .await
            .map_err(SessionError::from_startup)
    }

    pub fn supervisor_status(&self) -> SupervisorStatus {
        self.supervisor.status()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SupervisorStatus> {
        self.supervisor.subscribe()
    }

    pub async fn list_connections(&self) -> Result<Vec<ConnectionRecord>, SessionError> {
        Ok(self.connections.list_connections().await?)
    }

    pub async fn load_model(&self, connection_id: &str) -> Result<ConnectionRecord, SessionError> {
        self.coordinator.load(connection_id).await
    }

    pub async fn unload_model(&self, connection_id: &str) -> Result<(), SessionError> {
        self.coordinator.unload(connection_id).await
    }

    pub async fn send_prompt(&self, prompt: &str) -> Result<String, SessionError> {
        self.coordinator.query(prompt).await
    }

    pub async fn active_model(&self) -> Option<ActiveInfo> {
        self.coordinator.active().await
    }

    /// Delete a saved connection, dropping it first if it is active.
    pub async fn delete_connection(&self, connection_id: &str) -> Result<bool, SessionError> {
        self.coordinator.invalidate(connection_id).await;
        Ok(self.connections.delete_connection(connection_id).await?)
    }

    async fn connection(&self, connection_id: &str) -> Result<ConnectionRecord, SessionError> {
        self.connections
            .get_connection(connection_id)
            .await?
            .ok_or_else(|| SessionError::NotFound(connection_id.to_string()))
    }

    /// Check that a connection is usable without loading it.
    pub async fn test_connection(&self, connection_id: &str) -> Result<String, SessionError> {
        let record = self.connection(connection_id).await?;
        let timeout = self.config.test_timeout;
        let timed_out = || SessionError::Timeout {
            operation: "connection test".to_string(),
            timeout,
        };

        if record.kind.is_local() {
            tokio::time::timeout(timeout, self.control.health())
                .await
                .map_err(|_| timed_out())?
                .map_err(BackendError::from)?;
            return Ok(format!(
                "Local engine is reachable; '{}' can be loaded.",
                record.name
            ));
        }

        let client = self.factory.build(&record)?;
        let models = tokio::time::timeout(timeout, client.list_available_models())
            .await
            .map_err(|_| timed_out())??;

        Ok(format!(
            "Connected to {}: {} model(s) available.",
            record.kind.display_name(),
            models.len()
        ))
    }

    /// Models the connection's provider offers.
    pub async fn list_provider_models(&self, connection_id: &str) -> Result<Vec<String>, SessionError> {
        let record = self.connection(connection_id).await?;
        let client = self.factory.build(&record)?;
        Ok(client.list_available_models().await?)
    }

    /// Ask the engine to judge whether `response` complied with `prompt`.
    pub async fn evaluate_compliance(&self, prompt: &str, response: &str) -> Result<String, SessionError> {
        self.control
            .evaluate_compliance(prompt, response)
            .await
            .map_err(|e| BackendError::from(e).into())
    }

    /// Send each prompt to the active model in order. Failures are
    /// recorded and the run continues.
    pub async fn run_prompts<I, S>(&self, prompts: I) -> Vec<PromptOutcome>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut outcomes = Vec::new();
        for prompt in prompts {
            let prompt = prompt.into();
            let outcome = match self.send_prompt(&prompt).await {
                Ok(response) => PromptOutcome {
                    prompt,
                    response: Some(response),
                    error: None,
                },
                Err(e) => {
                    warn!("Prompt failed: {}", e);
                    PromptOutcome {
                        prompt,
                        response: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    pub fn scan_gguf_dir(&self, dir: &Path) -> Result<Vec<GgufFile>, SessionError> {
        scan_gguf_dir(dir).map_err(SessionError::Engine)
    }

    /// Stop the engine.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        info!("Shutting down");
        self.supervisor.stop().await.map_err(SessionError::Engine)
    }
}
