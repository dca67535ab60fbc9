//! Engine command - start the local engine, report, stop.

use std::path::Path;

use lmninja_llm::SupervisorStatus;

use super::{app, finish};

pub(crate) async fn run(connections: Option<&Path>) -> miette::Result<()> {
    let app = app(connections)?;

    println!("Starting local engine...");
    let started = app.start_engine().await;

    match app.supervisor_status() {
        SupervisorStatus::Ready => println!("Status: ready"),
        SupervisorStatus::Error(message) => println!("Status: error ({})", message),
        other => println!("Status: {:?}", other),
    }

    finish(&app).await;
    println!("Local engine stopped.");

    started.map_err(|e| miette::miette!("Local engine failed to start: {}", e))
}
