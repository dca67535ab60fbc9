//! LMNinja session layer.
//!
//! [`LmNinja`] composes the local engine [`Supervisor`](lmninja_engine::Supervisor)
//! with a [`Coordinator`] that owns the single active model. Engine startup
//! runs in the background so cloud connections are usable right away.

mod app;
mod config;
mod coordinator;
mod error;

#[cfg(test)]
mod testing;

pub use app::{LmNinja, PromptOutcome};
pub use config::SessionConfig;
pub use coordinator::{ActiveInfo, Coordinator};
pub use error::SessionError;
