//! Proxy client for models hosted by the local engine.

use std::sync::Arc;

use async_trait::async_trait;
use lmninja_engine::{ControlProtocol, LocalQuery};

use crate::client::BackendClient;
use crate::connection::{BackendKind, ConnectionRecord};
use crate::error::BackendError;

/// Forwards prompts to the local engine.
///
/// Holds no model state of its own; the engine must already have the
/// record's model loaded.
pub struct LocalEngineClient {
    record: ConnectionRecord,
    control: Arc<dyn ControlProtocol>,
}

impl LocalEngineClient {
    pub fn new(record: ConnectionRecord, control: Arc<dyn ControlProtocol>) -> Self {
        Self { record, control }
    }

    fn target(&self) -> LocalQuery<'_> {
        match self.record.kind {
            BackendKind::Gguf => LocalQuery::File(&self.record.model),
            _ => LocalQuery::Named(&self.record.model),
        }
    }
}

#[async_trait]
impl BackendClient for LocalEngineClient {
    async fn query(&self, prompt: &str) -> Result<String, BackendError> {
        Ok(self.control.query(self.target(), prompt).await?)
    }

    async fn list_available_models(&self) -> Result<Vec<String>, BackendError> {
        Ok(Vec::new())
    }

    fn describe(&self) -> &ConnectionRecord {
        &self.record
    }
}
