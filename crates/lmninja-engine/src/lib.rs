//! Local inference engine support for LMNinja.
//!
//! The engine is a companion process listening on a loopback port. This
//! crate owns its lifecycle ([`Supervisor`]) and speaks its small JSON
//! command set ([`ControlProtocol`], implemented over HTTP by
//! [`HttpControlClient`]).

mod config;
mod control;
mod error;
mod models;
pub mod paths;
mod supervisor;

#[cfg(test)]
mod test_support;

pub use config::{EngineConfig, EngineConfigBuilder};
pub use control::{ControlProtocol, HttpControlClient, LocalQuery};
pub use error::LocalEngineError;
pub use models::{scan_gguf_dir, GgufFile};
pub use supervisor::{Supervisor, SupervisorState, SupervisorStatus};

/// Loopback host the engine binds to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port for the local engine.
pub const DEFAULT_PORT: u16 = 1337;

/// Accelerator layer count sent when a connection carries no hint.
/// `-1` asks the engine to offload every layer it can.
pub const ALL_GPU_LAYERS: i32 = -1;
