//! Connections command - list saved connections.

use std::path::Path;

use lmninja_llm::ConnectionStore;

use super::open_store;

pub(crate) async fn run(connections: Option<&Path>, json: bool) -> miette::Result<()> {
    let store = open_store(connections)?;
    let records = store
        .list_connections()
        .await
        .map_err(|e| miette::miette!("Failed to read {}: {}", store.path().display(), e))?;

    if json {
        let out = serde_json::to_string_pretty(&records)
            .map_err(|e| miette::miette!("Failed to encode connections: {}", e))?;
        println!("{}", out);
        return Ok(());
    }

    if records.is_empty() {
        println!("No connections saved in {}", store.path().display());
        return Ok(());
    }

    println!("{:<16} {:<24} {:<10} MODEL", "ID", "NAME", "PROVIDER");
    for record in records {
        let name = match &record.group {
            Some(group) => format!("{} [{}]", record.name, group),
            None => record.name.clone(),
        };
        println!(
            "{:<16} {:<24} {:<10} {}",
            record.id, name, record.kind, record.model
        );
    }

    Ok(())
}
