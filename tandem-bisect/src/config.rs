//! Configuration loading for tandem-bisect.
//!
//! Supports loading configuration from TOML files, with sensible defaults
//! for all settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for tandem-bisect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings for listing revision histories.
    pub history: HistoryConfig,
    /// Settings for judging each tested line.
    pub evaluator: EvaluatorConfig,
    /// Settings for where repositories are cloned.
    pub repos: ReposConfig,
    /// Settings for presenting the result.
    pub report: ReportConfig,
}

/// Configuration for revision listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Follow every merge parent instead of only the first parent.
    pub follow_merges: bool,
}

/// Configuration for the evaluator.
///
/// Exactly one of `script` and `interactive` selects the evaluator; setting
/// both is rejected when the evaluator is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Shell command run per line; exit code 0 means the line is good.
    pub script: Option<String>,
    /// Ask the user in an interactive shell instead of running a script.
    pub interactive: bool,
    /// Shell for interactive sessions (defaults to `$SHELL`, then `bash`).
    pub shell: Option<String>,
    /// Working directory of the script.
    pub workdir: Option<PathBuf>,
}

/// Configuration for repository checkouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReposConfig {
    /// Directory that remote projects without an explicit local path are cloned into.
    pub dir: PathBuf,
}

/// Configuration for result reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Also write the timeline and bisection trail to this JSON file.
    pub json_path: Option<PathBuf>,
    /// Colorize the terminal table.
    pub colors: bool,
}

impl Default for ReposConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("repos"),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            json_path: None,
            colors: true,
        }
    }
}

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = ".tandem-bisect.toml";

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from `.tandem-bisect.toml` in the current directory,
    /// or use defaults when it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be parsed.
    pub fn load_or_default() -> Result<Config> {
        let path = Path::new(DEFAULT_CONFIG_FILE);

        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from the specified path, or try the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the specified file cannot be read or parsed.
    pub fn load_from(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(p) => Self::load(p),
            None => Self::load_or_default(),
        }
    }
}
