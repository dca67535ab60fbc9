//! Locating the local engine executable.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::EngineConfig;

/// Directory (next to our own executable) holding the packaged engine.
pub const PACKAGED_ENGINE_DIR: &str = "lmninja-engine";

/// Development entry point, relative to the working directory.
pub const DEV_ENGINE_SCRIPT: &str = "python-engine/main.py";

/// A resolved command line for launching the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Path the packaged engine would have beside `exe_dir`.
pub fn packaged_engine_path(exe_dir: &Path) -> PathBuf {
    let binary_name = if cfg!(target_os = "windows") {
        "lmninja-engine.exe"
    } else {
        "lmninja-engine"
    };
    exe_dir.join(PACKAGED_ENGINE_DIR).join(binary_name)
}

/// Pick the packaged executable when it exists beside `exe_dir`,
/// otherwise run the development script through python.
pub fn engine_command_in(exe_dir: &Path) -> EngineCommand {
    let packaged = packaged_engine_path(exe_dir);
    if packaged.is_file() {
        EngineCommand {
            program: packaged,
            args: Vec::new(),
        }
    } else {
        EngineCommand {
            program: PathBuf::from("python"),
            args: vec![DEV_ENGINE_SCRIPT.to_string()],
        }
    }
}

/// Resolve the command used to launch the engine.
pub fn engine_command(config: &EngineConfig) -> std::io::Result<EngineCommand> {
    if let Some((program, args)) = config.command.as_ref().and_then(|c| c.split_first()) {
        return Ok(EngineCommand {
            program: PathBuf::from(program),
            args: args.to_vec(),
        });
    }

    let exe = std::env::current_exe()?;
    let exe_dir = exe.parent().unwrap_or_else(|| Path::new("."));
    Ok(engine_command_in(exe_dir))
}
