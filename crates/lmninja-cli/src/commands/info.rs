//! Info command - show configuration and paths.

use std::path::Path;

use lmninja_engine::{paths, EngineConfig};
use lmninja_llm::{BackendKind, EnvCredentialStore, LlmConfig};

use super::open_store;

pub(crate) fn run(connections: Option<&Path>) -> miette::Result<()> {
    println!("LMNinja");
    println!("=======");
    println!();
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    match open_store(connections) {
        Ok(store) => println!("Connections file: {}", store.path().display()),
        Err(e) => println!("Connections file: unavailable ({})", e),
    }
    println!();

    let engine = EngineConfig::from_env();
    println!("Local engine:");
    println!("  URL:     {}", engine.base_url());
    match paths::engine_command(&engine) {
        Ok(command) => println!("  Command: {}", command),
        Err(e) => println!("  Command: unavailable ({})", e),
    }
    println!(
        "  Startup deadline: {}s",
        engine.startup_deadline.as_secs()
    );
    println!();

    let llm = LlmConfig::from_env();
    println!("Cloud providers:");
    for (kind, url) in [
        (BackendKind::OpenAI, &llm.openai_base_url),
        (BackendKind::Anthropic, &llm.anthropic_base_url),
        (BackendKind::Gemini, &llm.gemini_base_url),
    ] {
        let key = EnvCredentialStore::provider_var(kind)
            .map(|var| {
                let state = if std::env::var(var).is_ok() { "set" } else { "not set" };
                format!("{} {}", var, state)
            })
            .unwrap_or_default();
        println!("  {:<10} {}  ({})", kind.display_name(), url, key);
    }

    Ok(())
}
