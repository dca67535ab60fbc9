//! Chat command - interactive prompt loop.

use std::io::Write;
use std::path::Path;

use lmninja_llm::SupervisorStatus;
use lmninja_session::LmNinja;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{app, finish, prepare};

pub(crate) async fn run(connections: Option<&Path>, id: &str) -> miette::Result<()> {
    let app = app(connections)?;
    prepare(&app, id).await?;

    let record = app
        .load_model(id)
        .await
        .map_err(|e| miette::miette!("Failed to load model: {}", e))?;

    println!("Chatting with {} ({}).", record.name, record.model);
    println!("Commands: /unload, /status. Ctrl-D to exit.");
    println!();

    let result = repl(&app, id).await;
    finish(&app).await;
    result
}

async fn repl(app: &LmNinja, id: &str) -> miette::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| miette::miette!("Failed to read input: {}", e))?
        else {
            println!();
            break;
        };

        let line = line.trim();
        match line {
            "" => continue,
            "/unload" => match app.unload_model(id).await {
                Ok(()) => println!("Model unloaded."),
                Err(e) => eprintln!("Error: {}", e),
            },
            "/status" => print_status(app).await,
            prompt => match app.send_prompt(prompt).await {
                Ok(answer) => println!("{}\n", answer),
                Err(e) => eprintln!("Error: {}\n", e),
            },
        }
    }

    Ok(())
}

async fn print_status(app: &LmNinja) {
    let engine = match app.supervisor_status() {
        SupervisorStatus::Stopped => "stopped".to_string(),
        SupervisorStatus::Starting => "starting".to_string(),
        SupervisorStatus::Ready => "ready".to_string(),
        SupervisorStatus::Error(message) => format!("error ({})", message),
    };
    println!("Local engine: {}", engine);

    match app.active_model().await {
        Some(active) => println!(
            "Active model: {} [{}] (generation {})",
            active.connection_id, active.kind, active.generation
        ),
        None => println!("Active model: none"),
    }
}
