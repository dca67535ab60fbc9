//! # LMNinja backend clients
//!
//! One capability surface ([`BackendClient`]) over every model backend:
//!
//! ```text
//! ┌──────────────────┐     ┌─────────────────┐     ┌──────────────────┐
//! │ ConnectionRecord │ --> │  ClientFactory  │ --> │ dyn BackendClient │
//! └──────────────────┘     └────────┬────────┘     └──────────────────┘
//!                                   │
//!               ┌───────────┬───────┴─────┬──────────────┐
//!               │  OpenAI   │  Anthropic  │    Gemini    │  Local engine
//!               └───────────┴─────────────┴──────────────┘  (proxy)
//! ```
//!
//! Cloud clients need a secret from a [`CredentialStore`]; the local proxy
//! forwards to the engine's [`ControlProtocol`].

mod anthropic;
mod client;
mod config;
mod connection;
mod credentials;
mod error;
mod factory;
mod gemini;
mod local;
mod openai;
mod store;

pub use anthropic::AnthropicClient;
pub use client::BackendClient;
pub use config::{LlmConfig, LlmConfigBuilder};
pub use connection::{BackendKind, ConnectionRecord};
pub use credentials::{CredentialStore, EnvCredentialStore, MemoryCredentialStore};
pub use error::{BackendError, StoreError};
pub use factory::{ClientFactory, DefaultClientFactory};
pub use gemini::GeminiClient;
pub use local::LocalEngineClient;
pub use openai::OpenAIClient;
pub use store::{data_dir, ConnectionStore, JsonConnectionStore, MemoryConnectionStore};

// Re-export local engine types
pub use lmninja_engine::{
    paths as engine_paths, scan_gguf_dir, ControlProtocol, EngineConfig, GgufFile,
    HttpControlClient, LocalEngineError, LocalQuery, Supervisor, SupervisorState,
    SupervisorStatus, ALL_GPU_LAYERS, DEFAULT_PORT as DEFAULT_ENGINE_PORT,
};
