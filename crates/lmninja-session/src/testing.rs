//! In-process fakes for the engine and the cloud backends.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use lmninja_engine::{ControlProtocol, LocalEngineError, LocalQuery};
use lmninja_llm::{BackendClient, BackendError, ClientFactory, ConnectionRecord, LocalEngineClient};

/// A local engine that records every call.
pub(crate) struct FakeControl {
    healthy: AtomicBool,
    calls: Mutex<Vec<String>>,
    load_gate: Mutex<Option<Arc<Notify>>>,
    load_started: Notify,
}

impl FakeControl {
    pub(crate) fn healthy() -> Self {
        Self {
            healthy: AtomicBool::new(true),
            calls: Mutex::new(Vec::new()),
            load_gate: Mutex::new(None),
            load_started: Notify::new(),
        }
    }

    pub(crate) fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    pub(crate) fn query_count(&self) -> usize {
        self.count("query:")
    }

    pub(crate) fn unload_count(&self) -> usize {
        self.count("unload")
    }

    /// Make model loads wait until the returned gate is notified.
    pub(crate) fn hold_loads(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.load_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub(crate) async fn wait_for_load(&self) {
        self.load_started.notified().await;
    }

    fn record(&self, call: String) -> Result<(), LocalEngineError> {
        self.calls.lock().unwrap().push(call);
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LocalEngineError::Transport {
                url: "http://127.0.0.1:1337".to_string(),
                message: "connection refused".to_string(),
            })
        }
    }

    async fn gate_load(&self) {
        self.load_started.notify_one();
        let gate = self.load_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl ControlProtocol for FakeControl {
    async fn health(&self) -> Result<(), LocalEngineError> {
        self.record("health".to_string())
    }

    async fn load_file_model(&self, path: &str, accelerator_layers: i32) -> Result<(), LocalEngineError> {
        self.gate_load().await;
        self.record(format!("load-file:{path}:{accelerator_layers}"))
    }

    async fn load_named_model(&self, name: &str) -> Result<(), LocalEngineError> {
        self.gate_load().await;
        self.record(format!("load-named:{name}"))
    }

    async fn unload(&self) -> Result<(), LocalEngineError> {
        self.record("unload".to_string())
    }

    async fn query(&self, model: LocalQuery<'_>, prompt: &str) -> Result<String, LocalEngineError> {
        let target = match model {
            LocalQuery::File(path) => format!("file:{path}"),
            LocalQuery::Named(name) => format!("named:{name}"),
        };
        self.record(format!("query:{target}:{prompt}"))?;
        Ok(format!("local: {prompt}"))
    }

    async fn evaluate_compliance(&self, prompt: &str, _response: &str) -> Result<String, LocalEngineError> {
        self.record(format!("evaluate:{prompt}"))?;
        Ok(r#"{"verdict":"refused"}"#.to_string())
    }
}

#[derive(Default)]
struct CloudState {
    queries: AtomicUsize,
    gate: Mutex<Option<Arc<Notify>>>,
    started: Notify,
}

struct FakeCloudClient {
    record: ConnectionRecord,
    state: Arc<CloudState>,
}

#[async_trait]
impl BackendClient for FakeCloudClient {
    async fn query(&self, prompt: &str) -> Result<String, BackendError> {
        self.state.queries.fetch_add(1, Ordering::SeqCst);
        self.state.started.notify_one();

        let gate = self.state.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if prompt == "fail" {
            return Err(BackendError::Upstream {
                provider: "OpenAI",
                status: 500,
                message: "server error".to_string(),
            });
        }
        Ok(format!("cloud: {prompt}"))
    }

    async fn list_available_models(&self) -> Result<Vec<String>, BackendError> {
        Ok(vec!["gpt-3.5-turbo".to_string(), "gpt-4o".to_string()])
    }

    fn describe(&self) -> &ConnectionRecord {
        &self.record
    }
}

/// Builds real local proxies over a [`FakeControl`] and fake cloud clients
/// for connections that have a secret.
pub(crate) struct FakeFactory {
    control: Arc<FakeControl>,
    secrets: HashSet<String>,
    cloud: Arc<CloudState>,
}

impl FakeFactory {
    pub(crate) fn new(control: Arc<FakeControl>) -> Self {
        Self {
            control,
            secrets: HashSet::new(),
            cloud: Arc::new(CloudState::default()),
        }
    }

    pub(crate) fn with_secret(mut self, id: &str) -> Self {
        self.secrets.insert(id.to_string());
        self
    }

    pub(crate) fn cloud_queries(&self) -> usize {
        self.cloud.queries.load(Ordering::SeqCst)
    }

    /// Make cloud answers wait until the returned gate is notified.
    pub(crate) fn hold_cloud_answers(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.cloud.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub(crate) async fn wait_for_cloud_query(&self) {
        self.cloud.started.notified().await;
    }
}

impl ClientFactory for FakeFactory {
    fn build(&self, connection: &ConnectionRecord) -> Result<Arc<dyn BackendClient>, BackendError> {
        if connection.kind.is_local() {
            return Ok(Arc::new(LocalEngineClient::new(
                connection.clone(),
                self.control.clone(),
            )));
        }

        if !self.secrets.contains(&connection.id) {
            return Err(BackendError::MissingCredential(connection.id.clone()));
        }

        Ok(Arc::new(FakeCloudClient {
            record: connection.clone(),
            state: self.cloud.clone(),
        }))
    }
}
