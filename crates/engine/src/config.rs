//! Snapshot configuration via `tablesnap.toml`
//!
//! Every field has a default, so an empty file is a valid config.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use tablesnap_core::{SnapshotDescription, SnapshotType};

/// Config file name placed in the root directory.
pub const CONFIG_FILE_NAME: &str = "tablesnap.toml";

/// Default snapshot deadline in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Snapshot configuration loaded from `tablesnap.toml`.
///
/// # Example
///
/// ```toml
/// timeout_ms = 60000
/// # disabled_timeout_ms = 30000
/// region_workers = 1
/// discard_failed_working_dir = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Deadline for one snapshot attempt.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Deadline override for disabled-table snapshots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_timeout_ms: Option<u64>,
    /// Regions processed concurrently. 1 means strictly sequential.
    #[serde(default = "default_region_workers")]
    pub region_workers: usize,
    /// Remove the working directory when an attempt fails.
    #[serde(default = "default_true")]
    pub discard_failed_working_dir: bool,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_region_workers() -> usize {
    1
}

fn default_true() -> bool {
    true
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            disabled_timeout_ms: None,
            region_workers: default_region_workers(),
            discard_failed_working_dir: true,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read or written
    #[error("Config file '{path}': {source}")]
    Io {
        /// File involved
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("Failed to parse config file '{path}': {message}")]
    Parse {
        /// File involved
        path: String,
        /// Parser message
        message: String,
    },

    /// Config could not be rendered as TOML
    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    /// A value is out of range
    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl SnapshotConfig {
    /// Sequential config with the given deadline
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the number of concurrent region workers
    pub fn with_region_workers(mut self, region_workers: usize) -> Self {
        self.region_workers = region_workers;
        self
    }

    /// Keep or discard failed working directories
    pub fn with_discard_failed_working_dir(mut self, discard: bool) -> Self {
        self.discard_failed_working_dir = discard;
        self
    }

    /// Deadline for `snapshot`: request override, then per-type, then default
    pub fn timeout_for(&self, snapshot: &SnapshotDescription) -> Duration {
        let ms = snapshot.timeout_ms.unwrap_or_else(|| match snapshot.snapshot_type {
            SnapshotType::Disabled => self.disabled_timeout_ms.unwrap_or(self.timeout_ms),
            SnapshotType::Flush | SnapshotType::SkipFlush => self.timeout_ms,
        });
        Duration::from_millis(ms)
    }

    /// Validate value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be > 0".to_string()));
        }
        if self.disabled_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "disabled_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.region_workers == 0 {
            return Err(ConfigError::Invalid(
                "region_workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# tablesnap configuration
#
# Deadline for one snapshot attempt, in milliseconds.
timeout_ms = 60000

# Deadline override for snapshots of disabled tables.
# disabled_timeout_ms = 30000

# Regions processed concurrently. 1 = one region at a time.
region_workers = 1

# Remove the working directory of a failed attempt.
discard_failed_working_dir = true
"#
    }

    /// Read, parse and validate config from a file path.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: SnapshotConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| ConfigError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }
}
