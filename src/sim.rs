//! Simulator invocation
//!
//! Compiles and runs the external Java simulation as blocking subprocesses
//! with captured output. A non-zero exit is reported as a failed outcome
//! carrying stderr; failing to launch the toolchain at all is an error.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Class holding the simulation entry point.
pub const MAIN_CLASS: &str = "Main";

/// The fixed set of sources compiled each iteration. The tuner patches a
/// subset of these between runs.
pub const SOURCE_FILES: [&str; 8] = [
    "Main.java",
    "Simulator.java",
    "Wolf.java",
    "Bobcat.java",
    "Squirrel.java",
    "Grouse.java",
    "Seeds.java",
    "Berries.java",
];

/// Result of one compile or run invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Exit code zero; payload is captured stdout (empty for compiles).
    Completed(String),
    /// Non-zero exit; payload is captured stderr.
    Failed(String),
}

pub struct Simulator {
    dir: PathBuf,
    compiler: String,
    runner: String,
}

impl Simulator {
    pub fn new(dir: &Path, compiler: &str, runner: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            compiler: compiler.to_string(),
            runner: runner.to_string(),
        }
    }

    /// Compile all simulation sources.
    pub fn compile(&self) -> Result<Invocation> {
        let output = Command::new(&self.compiler)
            .current_dir(&self.dir)
            .args(SOURCE_FILES)
            .output()
            .with_context(|| format!("failed to launch compiler '{}'", self.compiler))?;

        if output.status.success() {
            Ok(Invocation::Completed(String::new()))
        } else {
            Ok(Invocation::Failed(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ))
        }
    }

    /// Run the compiled simulation and capture its full stdout.
    pub fn run(&self) -> Result<Invocation> {
        let output = Command::new(&self.runner)
            .current_dir(&self.dir)
            .arg(MAIN_CLASS)
            .output()
            .with_context(|| format!("failed to launch runtime '{}'", self.runner))?;

        if output.status.success() {
            Ok(Invocation::Completed(
                String::from_utf8_lossy(&output.stdout).into_owned(),
            ))
        } else {
            Ok(Invocation::Failed(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn compile_failure_is_an_outcome_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let sim = Simulator::new(dir.path(), "false", "true");
        assert!(matches!(sim.compile().unwrap(), Invocation::Failed(_)));
    }

    #[test]
    fn missing_toolchain_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let sim = Simulator::new(dir.path(), "ecotune-no-such-compiler", "true");
        assert!(sim.compile().is_err());
    }

    #[test]
    fn run_captures_stdout() {
        let dir = tempfile::tempdir().unwrap();
        // The runner is invoked as `<runner> Main` in the simulation
        // directory, so a shell script named Main stands in for the JVM.
        fs::write(dir.path().join(MAIN_CLASS), "echo '| Wolves | 3 | 1 | 2 |'\n").unwrap();
        let sim = Simulator::new(dir.path(), "true", "sh");
        match sim.run().unwrap() {
            Invocation::Completed(stdout) => assert!(stdout.contains("Wolves")),
            Invocation::Failed(stderr) => panic!("run failed: {stderr}"),
        }
    }
}
