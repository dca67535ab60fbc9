//! Models command - list a provider's models.

use std::path::Path;

use super::app;

pub(crate) async fn run(connections: Option<&Path>, id: &str) -> miette::Result<()> {
    let app = app(connections)?;
    let models = app
        .list_provider_models(id)
        .await
        .map_err(|e| miette::miette!("Failed to list models: {}", e))?;

    if models.is_empty() {
        println!("No models listed for this connection.");
        println!("Local models are files; use `lmninja scan <dir>` to find them.");
        return Ok(());
    }

    for model in models {
        println!("{}", model);
    }

    Ok(())
}
