//! The active session coordinator.
//!
//! Owns the single binding between a connection and a ready client.
//! `load`, `unload` and `invalidate` run one at a time under an async mutex
//! held across their network calls. The session slot itself sits behind a
//! separate lock that is only held to swap or copy it, so `query` never
//! waits for a slow model switch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use lmninja_engine::{ControlProtocol, LocalEngineError};
use lmninja_llm::{BackendClient, BackendKind, ClientFactory, ConnectionRecord, ConnectionStore};

use crate::config::SessionConfig;
use crate::error::SessionError;

/// The loaded model.
struct ActiveSession {
    connection_id: String,
    kind: BackendKind,
    client: Arc<dyn BackendClient>,
    generation: u64,
}

/// Read-only view of the active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveInfo {
    pub connection_id: String,
    pub kind: BackendKind,
    pub generation: u64,
}

pub struct Coordinator {
    connections: Arc<dyn ConnectionStore>,
    factory: Arc<dyn ClientFactory>,
    control: Arc<dyn ControlProtocol>,
    config: SessionConfig,
    /// Serializes `load`, `unload` and `invalidate`.
    ops: Mutex<()>,
    slot: RwLock<Option<ActiveSession>>,
    generation: AtomicU64,
}

impl Coordinator {
    pub fn new(
        connections: Arc<dyn ConnectionStore>,
        factory: Arc<dyn ClientFactory>,
        control: Arc<dyn ControlProtocol>,
        config: SessionConfig,
    ) -> Self {
        Self {
            connections,
            factory,
            control,
            config,
            ops: Mutex::new(()),
            slot: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Current generation. Advances on every session change.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub async fn active(&self) -> Option<ActiveInfo> {
        self.slot.read().await.as_ref().map(|session| ActiveInfo {
            connection_id: session.connection_id.clone(),
            kind: session.kind,
            generation: session.generation,
        })
    }

    fn bump(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Drop the active session, advancing the generation if there was one.
    async fn clear(&self) {
        if let Some(previous) = self.slot.write().await.take() {
            let generation = self.bump();
            debug!(
                "Cleared session for {} (generation {})",
                previous.connection_id, generation
            );
        }
    }

    /// Make `connection_id` the active model.
    ///
    /// Any failure leaves no session behind.
    pub async fn load(&self, connection_id: &str) -> Result<ConnectionRecord, SessionError> {
        let _op = self.ops.lock().await;

        let record = match self.connections.get_connection(connection_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.clear().await;
                return Err(SessionError::NotFound(connection_id.to_string()));
            }
            Err(e) => {
                self.clear().await;
                return Err(e.into());
            }
        };

        info!("Loading {} ({})", record.name, record.kind);

        if let Err(e) = self.load_into_engine(&record).await {
            self.clear().await;
            return Err(SessionError::BackendUnavailable {
                connection_id: record.id,
                message: e.to_string(),
            });
        }

        let engine_was_busy = self
            .slot
            .read()
            .await
            .as_ref()
            .is_some_and(|previous| previous.kind.is_local());
        let release_engine = engine_was_busy && !record.kind.is_local();

        let client = match self.factory.build(&record) {
            Ok(client) => client,
            Err(e) => {
                warn!("Could not build client for {}: {}", record.id, e);
                if release_engine {
                    self.release_engine().await;
                }
                self.clear().await;
                return Err(e.into());
            }
        };

        if release_engine {
            self.release_engine().await;
        }

        let generation = self.bump();
        *self.slot.write().await = Some(ActiveSession {
            connection_id: record.id.clone(),
            kind: record.kind,
            client,
            generation,
        });
        info!("{} is active (generation {})", record.name, generation);

        Ok(record)
    }

    /// Best-effort unload of a local model no session uses any more.
    async fn release_engine(&self) {
        if let Err(e) = self.control.unload().await {
            warn!("Failed to unload superseded local model: {}", e);
        }
    }

    async fn load_into_engine(&self, record: &ConnectionRecord) -> Result<(), LocalEngineError> {
        match record.kind {
            BackendKind::Gguf => {
                self.control
                    .load_file_model(&record.model, record.accelerator_layers())
                    .await
            }
            BackendKind::Ollama => self.control.load_named_model(&record.model).await,
            BackendKind::OpenAI | BackendKind::Anthropic | BackendKind::Gemini => Ok(()),
        }
    }

    /// Unload `connection_id` if it is the active model.
    ///
    /// A mismatch is a no-op. Engine unload failures are logged and the
    /// session is cleared regardless.
    pub async fn unload(&self, connection_id: &str) -> Result<(), SessionError> {
        let _op = self.ops.lock().await;

        let active_kind = self
            .slot
            .read()
            .await
            .as_ref()
            .filter(|session| session.connection_id == connection_id)
            .map(|session| session.kind);

        let is_local = match active_kind {
            Some(kind) => kind.is_local(),
            None => {
                debug!("Unload of inactive connection {} ignored", connection_id);
                return Ok(());
            }
        };

        if is_local {
            if let Err(e) = self.control.unload().await {
                warn!("Failed to unload local model {}: {}", connection_id, e);
            }
        }

        self.clear().await;
        info!("Unloaded {}", connection_id);
        Ok(())
    }

    /// Forget `connection_id` without contacting any backend.
    ///
    /// Returns whether it was the active model.
    pub async fn invalidate(&self, connection_id: &str) -> bool {
        let _op = self.ops.lock().await;

        let is_active = self
            .slot
            .read()
            .await
            .as_ref()
            .is_some_and(|session| session.connection_id == connection_id);
        if is_active {
            self.clear().await;
            info!("Invalidated active connection {}", connection_id);
        }
        is_active
    }

    /// Send `prompt` to the active model.
    pub async fn query(&self, prompt: &str) -> Result<String, SessionError> {
        let (client, generation) = {
            let slot = self.slot.read().await;
            match slot.as_ref() {
                Some(session) => (session.client.clone(), session.generation),
                None => return Err(SessionError::NoActiveModel),
            }
        };

        let timeout = self.config.prompt_timeout;
        let answer = match tokio::time::timeout(timeout, client.query(prompt)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(SessionError::Timeout {
                    operation: "prompt".to_string(),
                    timeout,
                })
            }
        };

        if self.generation() != generation {
            warn!(
                "Discarding answer from {}: session changed during the prompt",
                client.describe().id
            );
            return Err(SessionError::StaleSession);
        }

        Ok(answer)
    }
}
