//! Codebase dump
//!
//! Concatenates the simulation's Java sources into one text blob for the
//! session's priming message, so the model can ground its suggestions in
//! the actual simulator logic.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Build the priming dump for a simulation directory.
///
/// Files are emitted in path order with a header line per file. Returns
/// `None` when the directory holds no Java sources at all.
pub fn codebase_dump(dir: &Path) -> Result<Option<String>> {
    let mut dump = String::new();
    let mut files = 0;

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some("java") {
            continue;
        }
        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let content = fs::read_to_string(entry.path())
            .with_context(|| format!("failed to read {}", entry.path().display()))?;
        dump.push_str(&format!("================ File: {} ================\n", relative.display()));
        dump.push_str(&content);
        if !content.ends_with('\n') {
            dump.push('\n');
        }
        dump.push('\n');
        files += 1;
    }

    Ok((files > 0).then_some(dump))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_concatenates_java_sources_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Wolf.java"), "class Wolf {}\n").unwrap();
        fs::write(dir.path().join("Main.java"), "class Main {}\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore me\n").unwrap();

        let dump = codebase_dump(dir.path()).unwrap().unwrap();
        let main_pos = dump.find("File: Main.java").unwrap();
        let wolf_pos = dump.find("File: Wolf.java").unwrap();
        assert!(main_pos < wolf_pos);
        assert!(dump.contains("class Wolf {}"));
        assert!(!dump.contains("ignore me"));
    }

    #[test]
    fn directory_without_sources_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.md"), "hi\n").unwrap();
        assert!(codebase_dump(dir.path()).unwrap().is_none());
    }
}
