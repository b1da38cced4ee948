//! Configuration
//!
//! Settings load from `ecotune.toml` in the simulation directory when
//! present, then from `~/.config/ecotune/config.toml`, then defaults. The
//! API key is resolved from the `OPENROUTER_API_KEY` environment variable
//! before any file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory config file.
const LOCAL_CONFIG_FILE: &str = "ecotune.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API key for the suggestion service. Prefer the environment variable;
    /// this field exists for setups without one.
    pub openrouter_api_key: Option<String>,
    /// Model identifier sent with every chat request.
    pub model: String,
    /// Upper bound on tuning iterations before the run times out.
    pub max_iterations: u32,
    /// Chat history retention: maximum messages kept beyond the priming
    /// exchange. 0 keeps everything.
    pub max_history_messages: usize,
    /// Send the full simulator codebase as the priming message.
    pub send_codebase: bool,
    /// Tuning log file name, created inside the simulation directory.
    pub log_file: String,
    /// Compiler executable. Overridable so tests can stub the toolchain.
    pub compiler: String,
    /// Runtime executable used to run the compiled simulation.
    pub runner: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openrouter_api_key: None,
            model: "google/gemini-2.0-flash-001".to_string(),
            max_iterations: 10,
            max_history_messages: 0,
            send_codebase: true,
            log_file: "attribute_tuning_log.txt".to_string(),
            compiler: "javac".to_string(),
            runner: "java".to_string(),
        }
    }
}

impl Config {
    /// Load config for a simulation directory, falling back through the
    /// global config file to defaults. A corrupt file is reported and
    /// ignored rather than aborting the run.
    pub fn load(sim_dir: &Path) -> Self {
        let candidates = [
            Some(sim_dir.join(LOCAL_CONFIG_FILE)),
            Self::global_config_path(),
        ];
        for path in candidates.into_iter().flatten() {
            if let Ok(content) = fs::read_to_string(&path) {
                match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(err) => {
                        eprintln!(
                            "  Warning: ignoring corrupt config {} ({})",
                            path.display(),
                            err
                        );
                    }
                }
            }
        }
        Self::default()
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ecotune").join("config.toml"))
    }

    /// Resolve the API key: environment first, then config file.
    pub fn api_key(&self) -> Option<String> {
        if let Ok(key) = std::env::var("OPENROUTER_API_KEY") {
            if !key.is_empty() {
                return Some(key);
            }
        }
        self.openrouter_api_key.clone()
    }
}
