//! Analysis configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a layered resolution:
//! 1. An explicit path (`--config`), when given
//! 2. Override in data dir (~/.local/share/spendwise/config/analysis.toml)
//! 3. Embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/analysis.toml");

/// Largest scale a `rust_decimal::Decimal` supports
const MAX_DECIMAL_PLACES: u32 = 28;

/// Analysis settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Number of high-value transactions kept for the report summary
    pub high_value_limit: usize,
    /// Maximum number of groups analyzed concurrently
    pub max_concurrent_groups: usize,
    /// Append analyzed transactions to the historical store
    pub append_history: bool,
    /// Fractional digits for amounts in report output
    pub report_decimal_places: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            high_value_limit: 3,
            max_concurrent_groups: 4,
            append_history: true,
            report_decimal_places: 2,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration (explicit path, then data dir override, then embedded default)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            debug!("Loading analysis config from {}", path.display());
            return parse_config(&read_config(path)?);
        }

        if let Some(default_path) = default_config_path() {
            if default_path.exists() {
                debug!("Loading analysis config from {}", default_path.display());
                return parse_config(&read_config(&default_path)?);
            }
        }

        parse_config(DEFAULT_CONFIG)
    }

    fn validate(self) -> Result<Self> {
        if self.max_concurrent_groups == 0 {
            return Err(Error::Config(
                "max_concurrent_groups must be at least 1".to_string(),
            ));
        }
        if self.report_decimal_places > MAX_DECIMAL_PLACES {
            return Err(Error::Config(format!(
                "report_decimal_places must be at most {}",
                MAX_DECIMAL_PLACES
            )));
        }
        Ok(self)
    }
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config {}: {}", path.display(), e))
    })
}

/// Parse and validate a TOML config document
pub fn parse_config(content: &str) -> Result<AnalysisConfig> {
    let config: AnalysisConfig =
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))?;
    config.validate()
}

fn data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("spendwise"))
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    data_dir().map(|d| d.join("config").join("analysis.toml"))
}

/// Default location of the file-backed historical store
pub fn default_history_dir() -> PathBuf {
    data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("history")
}
