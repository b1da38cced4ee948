//! Tuning log
//!
//! Append-only plain-text audit trail of a tuning run. Every entry is
//! echoed to the console so a run can be followed live and reviewed later.
//! Nothing machine-parses this file.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct TuningLog {
    file: File,
    path: PathBuf,
}

impl TuningLog {
    /// Create (truncating) the log file and write the run header.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("failed to create tuning log {}", path.display()))?;
        let mut log = Self {
            file,
            path: path.to_path_buf(),
        };
        log.note(&format!(
            "--- Simulation Tuning Log ({}) ---\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        Ok(log)
    }

    /// Append a line to the log file and echo it to the console.
    ///
    /// Log writes are best-effort; a full disk must not abort the run.
    pub fn note(&mut self, message: &str) {
        println!("{}", message);
        let _ = writeln!(self.file, "{}", message);
    }

    /// Append to the log file only, without console echo. Used for bulky
    /// payloads like raw oracle replies.
    pub fn note_quiet(&mut self, message: &str) {
        let _ = writeln!(self.file, "{}", message);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notes_are_appended_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tuning.txt");
        {
            let mut log = TuningLog::create(&path).unwrap();
            log.note("first");
            log.note_quiet("second");
            log.note("third");
        }
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("--- Simulation Tuning Log"));
        let first = content.find("first").unwrap();
        let second = content.find("second").unwrap();
        let third = content.find("third").unwrap();
        assert!(first < second && second < third);
    }
}
