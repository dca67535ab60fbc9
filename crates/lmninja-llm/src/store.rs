//! Connection persistence.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::connection::ConnectionRecord;
use crate::error::StoreError;

/// LMNinja's directory under the user config dir.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    dirs::config_dir()
        .map(|dir| dir.join("LMNinja"))
        .ok_or(StoreError::NoConfigDir)
}

/// Where saved connections live.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    async fn get_connection(&self, id: &str) -> Result<Option<ConnectionRecord>, StoreError>;

    /// All connections, newest first.
    async fn list_connections(&self) -> Result<Vec<ConnectionRecord>, StoreError>;

    /// Remove a connection. Returns whether it existed.
    async fn delete_connection(&self, id: &str) -> Result<bool, StoreError>;
}

fn newest_first(records: &mut [ConnectionRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Connections held in memory.
#[derive(Debug, Default)]
pub struct MemoryConnectionStore {
    records: RwLock<HashMap<String, ConnectionRecord>>,
}

impl MemoryConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = ConnectionRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Add or replace a connection.
    pub fn insert(&self, record: ConnectionRecord) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.id.clone(), record);
    }
}

#[async_trait]
impl ConnectionStore for MemoryConnectionStore {
    async fn get_connection(&self, id: &str) -> Result<Option<ConnectionRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned())
    }

    async fn list_connections(&self) -> Result<Vec<ConnectionRecord>, StoreError> {
        let mut records: Vec<ConnectionRecord> = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        newest_first(&mut records);
        Ok(records)
    }

    async fn delete_connection(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some())
    }
}

/// Connections persisted as a JSON array in `connections.json`.
///
/// The file is re-read on every call so edits made elsewhere are seen.
#[derive(Debug, Clone)]
pub struct JsonConnectionStore {
    path: PathBuf,
}

impl JsonConnectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config dir>/LMNinja/connections.json`.
    pub fn open_default() -> Result<Self, StoreError> {
        Ok(Self::new(data_dir()?.join("connections.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<ConnectionRecord>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No connections file at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_str(&content)?)
    }

    async fn write_all(&self, records: &[ConnectionRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(records)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl ConnectionStore for JsonConnectionStore {
    async fn get_connection(&self, id: &str) -> Result<Option<ConnectionRecord>, StoreError> {
        Ok(self.read_all().await?.into_iter().find(|r| r.id == id))
    }

    async fn list_connections(&self) -> Result<Vec<ConnectionRecord>, StoreError> {
        let mut records = self.read_all().await?;
        newest_first(&mut records);
        Ok(records)
    }

    async fn delete_connection(&self, id: &str) -> Result<bool, StoreError> {
        let mut records = self.read_all().await?;
        let before = records.len();
        records.retain(|r| r.id != id);

        if records.len() == before {
            warn!("Connection {} not found for deletion", id);
            return Ok(false);
        }

        self.write_all(&records).await?;
        Ok(true)
    }
}
