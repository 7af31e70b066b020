//! Configuration loading and config path resolution
//!
//! Bootstrap configuration lives in a single TOML file (`cfix.toml`).
//! Resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`CFIX_CONFIG`)
//! 3. Per-user config directory (`<config_dir>/cfix/cfix.toml`)
//! 4. Built-in defaults (fallback)
//!
//! A missing config file is never fatal: the loader warns and uses defaults.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CFIX_CONFIG";

/// Default fuzzy-match threshold for name similarity
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Path to the artist lookup file (optional)
    ///
    /// If not specified, falls back to `<data_dir>/cfix/artists.csv`
    #[serde(default)]
    pub registry_path: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Reconciliation tuning (optional)
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Reconciliation settings
#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileConfig {
    /// Names scoring above this are treated as the same person
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Patterns for names containing `&` that must not be split
    #[serde(default = "default_ampersand_exceptions")]
    pub ampersand_exceptions: Vec<String>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            ampersand_exceptions: default_ampersand_exceptions(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_similarity_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}

/// "X & his Orchestra", "X and Chorus" style credits name one ensemble
pub fn default_ampersand_exceptions() -> Vec<String> {
    vec![
        r"(?i)(&|\band\b)\s+(his|her)\s+orchestra".to_string(),
        r"(?i)(&|\band\b)\s+chorus".to_string(),
    ]
}

impl TomlConfig {
    /// Parse a config file
    ///
    /// # Errors
    /// `Error::NotFound` when the file does not exist, `Error::Config` when it
    /// cannot be parsed or carries out-of-range values.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!("config file {}", path.display())));
        }
        let toml_str = std::fs::read_to_string(path)?;
        let config: TomlConfig = toml::from_str(&toml_str)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve and load the config, degrading to defaults when absent
    ///
    /// A file that exists but fails to parse is still an error.
    pub fn load_or_default(cli_arg: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_arg) {
            Some(path) => match Self::load(&path) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    Ok(config)
                }
                Err(Error::NotFound(what)) => {
                    warn!("No {} found, using built-in defaults", what);
                    Ok(Self::default())
                }
                Err(e) => Err(e),
            },
            None => {
                info!("No configuration file, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Registry path from config, or the platform default
    pub fn registry_path(&self) -> PathBuf {
        self.registry_path
            .clone()
            .unwrap_or_else(default_registry_path)
    }

    fn validate(&self) -> Result<()> {
        let threshold = self.reconcile.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::Config(format!(
                "reconcile.similarity_threshold must be within 0.0-1.0, got {}",
                threshold
            )));
        }
        Ok(())
    }
}

/// Find the config file to use, without reading it
///
/// Returns `None` when neither an explicit path nor a per-user file exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config directory
    let user_config = dirs::config_dir().map(|d| d.join("cfix").join("cfix.toml"))?;
    if user_config.exists() {
        Some(user_config)
    } else {
        None
    }
}

/// Get OS-dependent default registry path
pub fn default_registry_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("cfix"))
        .unwrap_or_else(|| PathBuf::from("./cfix_data"))
        .join("artists.csv")
}
