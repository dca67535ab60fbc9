//! Connection records and backend kinds.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lmninja_engine::ALL_GPU_LAYERS;

/// Every backend LMNinja can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// OpenAI chat completions.
    OpenAI,
    /// Anthropic messages.
    Anthropic,
    /// Google Gemini.
    Gemini,
    /// A GGUF model file loaded by the local engine.
    Gguf,
    /// A named model served through the local engine (Ollama).
    Ollama,
}

impl BackendKind {
    /// Whether the backend runs inside the local engine.
    pub fn is_local(self) -> bool {
        matches!(self, BackendKind::Gguf | BackendKind::Ollama)
    }

    /// Tag used on the wire and in `connections.json`.
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::OpenAI => "openai",
            BackendKind::Anthropic => "anthropic",
            BackendKind::Gemini => "gemini",
            BackendKind::Gguf => "gguf",
            BackendKind::Ollama => "ollama",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            BackendKind::OpenAI => "OpenAI",
            BackendKind::Anthropic => "Anthropic",
            BackendKind::Gemini => "Gemini",
            BackendKind::Gguf => "GGUF (local)",
            BackendKind::Ollama => "Ollama (local)",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A saved connection to a model backend.
///
/// Owned by the persistence layer. Holders should re-read it per operation
/// since it can be renamed or deleted at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub id: String,
    /// Unique display name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(rename = "provider")]
    pub kind: BackendKind,
    /// API model id, model file path, or served model name.
    pub model: String,
    pub created_at: DateTime<Utc>,
    /// Accelerator layers to offload when loading a model file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_layers: Option<i32>,
}

impl ConnectionRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: BackendKind,
        model: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            group: None,
            kind,
            model: model.into(),
            created_at: Utc::now(),
            gpu_layers: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_gpu_layers(mut self, layers: i32) -> Self {
        self.gpu_layers = Some(layers);
        self
    }

    /// Layer count sent to the engine; everything when unset.
    pub fn accelerator_layers(&self) -> i32 {
        self.gpu_layers.unwrap_or(ALL_GPU_LAYERS)
    }
}
