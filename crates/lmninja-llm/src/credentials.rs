//! Secret lookup for cloud connections.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::connection::{BackendKind, ConnectionRecord};
use crate::error::BackendError;

/// Source of API keys, keyed by connection id.
pub trait CredentialStore: Send + Sync {
    /// The secret for `connection`, or `MissingCredential`.
    fn get_secret(&self, connection: &ConnectionRecord) -> Result<String, BackendError>;
}

/// Secrets held in memory.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: impl Into<String>, secret: impl Into<String>) {
        self.secrets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.into(), secret.into());
    }

    pub fn remove(&self, id: &str) {
        self.secrets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get_secret(&self, connection: &ConnectionRecord) -> Result<String, BackendError> {
        self.secrets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&connection.id)
            .cloned()
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| BackendError::MissingCredential(connection.id.clone()))
    }
}

/// Secrets read from the process environment.
///
/// Looks up `LMNINJA_API_KEY_<ID>` first (id upper-cased, non-alphanumerics
/// replaced by `_`), then the provider's usual variable.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvCredentialStore;

impl EnvCredentialStore {
    pub fn new() -> Self {
        Self
    }

    /// Per-connection variable name.
    pub fn connection_var(id: &str) -> String {
        let suffix: String = id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("LMNINJA_API_KEY_{suffix}")
    }

    /// Provider-wide fallback variable.
    pub fn provider_var(kind: BackendKind) -> Option<&'static str> {
        match kind {
            BackendKind::OpenAI => Some("OPENAI_API_KEY"),
            BackendKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            BackendKind::Gemini => Some("GEMINI_API_KEY"),
            BackendKind::Gguf | BackendKind::Ollama => None,
        }
    }
}

impl CredentialStore for EnvCredentialStore {
    fn get_secret(&self, connection: &ConnectionRecord) -> Result<String, BackendError> {
        let lookup = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        lookup(Self::connection_var(&connection.id).as_str())
            .or_else(|| Self::provider_var(connection.kind).and_then(lookup))
            .ok_or_else(|| BackendError::MissingCredential(connection.id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryCredentialStore::new();
        let record = ConnectionRecord::new("k1", "GPT", BackendKind::OpenAI, "gpt-4o");

        assert!(matches!(
            store.get_secret(&record),
            Err(BackendError::MissingCredential(id)) if id == "k1"
        ));

        store.insert("k1", "sk-abc");
        assert_eq!(store.get_secret(&record).unwrap(), "sk-abc");

        store.remove("k1");
        assert!(store.get_secret(&record).is_err());
    }

    #[test]
    fn test_memory_store_survives_poisoned_lock() {
        let store = std::sync::Arc::new(MemoryCredentialStore::new());
        store.insert("k1", "sk-abc");

        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.secrets.write().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(store.secrets.is_poisoned());

        let record = ConnectionRecord::new("k1", "GPT", BackendKind::OpenAI, "gpt-4o");
        assert_eq!(store.get_secret(&record).unwrap(), "sk-abc");
    }

    #[test]
    fn test_empty_secret_counts_as_missing() {
        let store = MemoryCredentialStore::new();
        store.insert("k1", "");
        let record = ConnectionRecord::new("k1", "GPT", BackendKind::OpenAI, "gpt-4o");
        assert!(store.get_secret(&record).is_err());
    }

    #[test]
    fn test_connection_var_name() {
        assert_eq!(
            EnvCredentialStore::connection_var("1717-abc"),
            "LMNINJA_API_KEY_1717_ABC"
        );
    }

    #[test]
    fn test_env_store_prefers_connection_var() {
        let id = "env-test-specific";
        let record = ConnectionRecord::new(id, "Claude", BackendKind::Anthropic, "claude-3-haiku-20240307");
        std::env::set_var(EnvCredentialStore::connection_var(id), "per-connection");

        assert_eq!(EnvCredentialStore.get_secret(&record).unwrap(), "per-connection");
        std::env::remove_var(EnvCredentialStore::connection_var(id));
    }

    #[test]
    fn test_local_kinds_have_no_provider_var() {
        assert!(EnvCredentialStore::provider_var(BackendKind::Gguf).is_none());
        assert!(EnvCredentialStore::provider_var(BackendKind::Ollama).is_none());
    }
}
