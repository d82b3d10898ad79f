//! Serializable backtest configuration.
//!
//! One TOML document configures a whole run:
//!
//! ```toml
//! [monitor]
//! min_wick_size = 3.0
//! stop_mode = { type = "structural", stop_buffer = 2.0 }
//!
//! [entry]
//! entry_mode = "confirmation_close"
//! target_points = 25.0
//!
//! [simulator]
//! path_policy = "worst_case"
//! trailing = { trigger = 15.0, offset = 10.0 }
//! ```
//!
//! Every section and field is optional and falls back to its default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use zonelab_core::sizing::EntryPlan;
use zonelab_core::{ConfigError, MonitorConfig, SimulatorConfig};

/// Content hash of a configuration (hex blake3).
pub type ConfigHash = String;

/// Errors from loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigError),
}

/// Everything needed to reproduce a backtest over a given bar feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BacktestConfig {
    pub monitor: MonitorConfig,
    pub entry: EntryPlan,
    pub simulator: SimulatorConfig,
}

impl BacktestConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.monitor.validate()?;
        self.entry.validate()?;
        self.simulator.validate()
    }

    /// Deterministic hash of this configuration.
    ///
    /// Two runs with identical configs over identical inputs share a hash,
    /// so results can be compared or cached by it.
    pub fn fingerprint(&self) -> Result<ConfigHash, serde_json::Error> {
        let json = serde_json::to_vec(self)?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}
