//! Configuration file parsing
//!
//! `mutor.yaml` is optional; every field is optional so the file only
//! needs to name what differs from the defaults. CLI flags take
//! precedence over file values, the merge happens in the binary.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{MutationError, Result};

/// Default file name looked up in the project directory.
pub const CONFIG_FILE: &str = "mutor.yaml";

/// Optional settings loaded from `mutor.yaml`.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Test commands, one whitespace-separated command per entry.
    pub testcmds: Option<Vec<String>>,
    /// Run mode code: f, s, d, or sd.
    pub mode: Option<String>,
    /// Seed for the sampling draw.
    pub rseed: Option<u64>,
    /// Maximum number of locations to mutate.
    pub sample: Option<usize>,
    /// Multiplier applied to the clean-trial timeout basis.
    pub timeout_factor: Option<f64>,
    /// Maximum tolerated count of surviving mutants.
    pub threshold: Option<usize>,
    /// Category codes to include.
    pub include: Option<Vec<String>>,
    /// Category codes to exclude.
    pub exclude: Option<Vec<String>>,
    /// Worker count; above one, trials run in isolated project copies.
    pub workers: Option<usize>,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path).map_err(|e| MutationError::ConfigError {
            message: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        serde_yaml::from_str(&content).map_err(|e| MutationError::ConfigError {
            message: format!("failed to parse config file '{}': {}", path.display(), e),
        })
    }

    /// Load `mutor.yaml` from the project directory when present.
    pub fn find(project_dir: &Path) -> Result<Config> {
        let path = project_dir.join(CONFIG_FILE);
        if path.exists() {
            Config::load(&path)
        } else {
            Ok(Config::default())
        }
    }
}
