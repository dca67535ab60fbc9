//! Discovering local model files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::error::LocalEngineError;

/// A GGUF model file found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GgufFile {
    /// File name, including the extension.
    pub name: String,
    /// Full path to the file.
    pub path: PathBuf,
}

/// List the `.gguf` files directly inside `dir`, sorted by name.
///
/// Subdirectories are not descended into. The extension match ignores case.
pub fn scan_gguf_dir(dir: &Path) -> Result<Vec<GgufFile>, LocalEngineError> {
    let mut models: Vec<GgufFile> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            if name.to_lowercase().ends_with(".gguf") {
                Some(GgufFile {
                    name,
                    path: entry.path(),
                })
            } else {
                None
            }
        })
        .collect();

    models.sort_by(|a, b| a.name.cmp(&b.name));
    debug!("Found {} GGUF file(s) in {}", models.len(), dir.display());
    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("zeta.gguf"), b"").unwrap();
        fs::write(dir.path().join("Alpha.GGUF"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(dir.path().join("nested.gguf")).unwrap();

        let found = scan_gguf_dir(dir.path()).unwrap();
        let names: Vec<_> = found.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha.GGUF", "zeta.gguf"]);
        assert_eq!(found[1].path, dir.path().join("zeta.gguf"));
    }

    #[test]
    fn test_scan_missing_dir_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            scan_gguf_dir(&missing),
            Err(LocalEngineError::Io(_))
        ));
    }
}
