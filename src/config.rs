//! Engine Configuration
//!
//! JSON-backed settings for the simulation driver. Every field has a
//! default, so a partial (or empty) JSON object is valid.

use std::fs;
use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Invalid JSON or field types.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value outside its allowed range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Field name
        field: &'static str,
        /// What was wrong
        reason: String,
    },
}

/// Settings for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ticks per simulated second
    pub tick_rate: u32,
    /// Ticks to run before stopping
    pub max_ticks: u64,
    /// Fraction of overlap depth removed per separation (0..=1)
    pub separation_weight: f32,
    /// Let pathfinding take diagonal steps
    pub allow_diagonal_paths: bool,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate: crate::DEFAULT_TICK_RATE,
            max_ticks: 600, // 10 seconds at 60 Hz
            separation_weight: 1.0,
            allow_diagonal_paths: true,
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::Invalid {
                field: "tick_rate",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.separation_weight) {
            return Err(ConfigError::Invalid {
                field: "separation_weight",
                reason: format!("{} is outside 0..=1", self.separation_weight),
            });
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
