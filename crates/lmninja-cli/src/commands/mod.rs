//! CLI commands.

use std::path::Path;
use std::sync::Arc;

use lmninja_engine::EngineConfig;
use lmninja_llm::{ConnectionStore, EnvCredentialStore, JsonConnectionStore, LlmConfig};
use lmninja_session::{LmNinja, SessionConfig};

pub mod ask;
pub mod chat;
pub mod connections;
pub mod engine;
pub mod info;
pub mod models;
pub mod scan;

/// Open the connections file, falling back to the default location.
pub(crate) fn open_store(path: Option<&Path>) -> miette::Result<JsonConnectionStore> {
    match path {
        Some(path) => Ok(JsonConnectionStore::new(path)),
        None => JsonConnectionStore::open_default()
            .map_err(|e| miette::miette!("Failed to locate connections file: {}", e)),
    }
}

/// Build the application from environment configuration.
pub(crate) fn app(connections: Option<&Path>) -> miette::Result<LmNinja> {
    let store: Arc<dyn ConnectionStore> = Arc::new(open_store(connections)?);
    Ok(LmNinja::new(
        EngineConfig::from_env(),
        LlmConfig::from_env(),
        SessionConfig::from_env(),
        store,
        Arc::new(EnvCredentialStore::new()),
    ))
}

/// Start the engine if `id` is a local connection.
pub(crate) async fn prepare(app: &LmNinja, id: &str) -> miette::Result<()> {
    let connections = app
        .list_connections()
        .await
        .map_err(|e| miette::miette!("Failed to read connections: {}", e))?;

    let record = connections
        .iter()
        .find(|c| c.id == id)
        .ok_or_else(|| miette::miette!("Connection not found: {}", id))?;

    if record.kind.is_local() {
        println!("Starting local engine...");
        app.start_engine()
            .await
            .map_err(|e| miette::miette!("Local engine unavailable: {}", e))?;
    }

    Ok(())
}

/// Stop the engine, reporting but not failing on errors.
pub(crate) async fn finish(app: &LmNinja) {
    if let Err(e) = app.shutdown().await {
        eprintln!("Warning: failed to stop local engine: {}", e);
    }
}
