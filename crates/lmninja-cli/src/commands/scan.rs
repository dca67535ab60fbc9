//! Scan command - list GGUF model files in a directory.

use std::path::Path;

use lmninja_engine::scan_gguf_dir;

pub(crate) fn run(dir: &Path) -> miette::Result<()> {
    let files = scan_gguf_dir(dir)
        .map_err(|e| miette::miette!("Failed to scan {}: {}", dir.display(), e))?;

    if files.is_empty() {
        println!("No GGUF models found in {}", dir.display());
        return Ok(());
    }

    println!("GGUF models in {}:", dir.display());
    for file in files {
        println!("  {:<40} {}", file.name, file.path.display());
    }

    Ok(())
}
