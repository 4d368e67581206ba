//! Run configuration
//!
//! Settings are read from TOML. Every field has a default, so an empty file
//! (or no file at all) gives the stock consolidation behavior:
//!
//! ```toml
//! base_path = "."
//! output_dir = "Consolidated_Reports"
//! identifier_columns = ["InstanceId", "Identifier", "DBInstanceIdentifier", "DBName", "InstanceName"]
//! highlight_low = 0.0
//! highlight_high = 14.0
//! highlight_mode = "static"
//! retry_attempts = 3
//! retry_delay_ms = 2000
//! environments = ["Patikar", "Batalan", "Production", "Shared_services"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the folder (under the base path) that receives the workbooks
pub const DEFAULT_OUTPUT_DIR: &str = "Consolidated_Reports";

/// Config file picked up from the base path when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "amsreport.toml";

/// How highlight columns are chosen
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightMode {
    /// Fixed per-environment column lists
    #[default]
    Static,
    /// Column-name pattern matching, environment independent
    Patterns,
}

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Folder holding the `MM-DD-YYYY` date folders
    pub base_path: PathBuf,
    /// Output folder, relative to `base_path` unless absolute
    pub output_dir: PathBuf,
    /// Candidate merge keys, in priority order
    pub identifier_columns: Vec<String>,
    pub highlight_low: f64,
    pub highlight_high: f64,
    pub highlight_mode: HighlightMode,
    /// Write attempts when the output workbook is locked
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    /// Environment folder names, processed in this order
    pub environments: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            identifier_columns: ["InstanceId", "Identifier", "DBInstanceIdentifier", "DBName", "InstanceName"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            highlight_low: 0.0,
            highlight_high: 14.0,
            highlight_mode: HighlightMode::Static,
            retry_attempts: 3,
            retry_delay_ms: 2000,
            environments: ["Patikar", "Batalan", "Production", "Shared_services"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

impl Settings {
    /// Parse and validate settings from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.highlight_low <= self.highlight_high) {
            return Err(ConfigError::Invalid(format!(
                "highlight_low ({}) must not exceed highlight_high ({})",
                self.highlight_low, self.highlight_high
            )));
        }
        if self.retry_attempts == 0 {
            return Err(ConfigError::Invalid("retry_attempts must be at least 1".into()));
        }
        if self.identifier_columns.iter().all(|c| c.trim().is_empty()) {
            return Err(ConfigError::Invalid("identifier_columns must name at least one column".into()));
        }
        if self.environments.is_empty() {
            return Err(ConfigError::Invalid("environments must not be empty".into()));
        }
        Ok(())
    }

    /// Resolved output folder
    pub fn output_path(&self) -> PathBuf {
        self.base_path.join(&self.output_dir)
    }

    pub fn retry_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.retry_delay_ms)
    }
}
