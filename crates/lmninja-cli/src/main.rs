//! LMNinja CLI - talk to cloud and local language models from the terminal.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

/// LMNinja - connect to language models, local or cloud
#[derive(Parser)]
#[command(name = "lmninja")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Connections file (default: <config dir>/LMNinja/connections.json)
    #[arg(long, global = true)]
    connections: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show configuration and paths
    Info,

    /// List saved connections
    Connections {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the local engine, report its status, then stop it
    Engine,

    /// List the models a connection's provider offers
    Models {
        /// Connection id
        id: String,
    },

    /// Check that a connection is usable
    Test {
        /// Connection id
        id: String,
    },

    /// List GGUF model files in a directory
    Scan {
        /// Directory to scan
        dir: PathBuf,
    },

    /// Send one prompt and print the answer
    Ask {
        /// Connection id
        id: String,
        /// Prompt text
        prompt: String,
    },

    /// Chat interactively with a connection
    Chat {
        /// Connection id
        id: String,
    },
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let connections = cli.connections.as_deref();

    match cli.command {
        Commands::Info => commands::info::run(connections),
        Commands::Scan { dir } => commands::scan::run(&dir),
        command => {
            let runtime = tokio::runtime::Runtime::new()
                .map_err(|e| miette::miette!("Failed to create async runtime: {}", e))?;

            runtime.block_on(async {
                match command {
                    Commands::Connections { json } => commands::connections::run(connections, json).await,
                    Commands::Engine => commands::engine::run(connections).await,
                    Commands::Models { id } => commands::models::run(connections, &id).await,
                    Commands::Test { id } => commands::test::run(connections, &id).await,
                    Commands::Ask { id, prompt } => commands::ask::run(connections, &id, &prompt).await,
                    Commands::Chat { id } => commands::chat::run(connections, &id).await,
                    Commands::Info | Commands::Scan { .. } => Ok(()),
                }
            })
        }
    }
}
