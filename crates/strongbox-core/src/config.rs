//! Runtime configuration read from the environment.

use std::path::PathBuf;

use thiserror::Error;

use crate::file::LocalFileStorage;
use crate::telemetry::{LogFormat, TelemetryConfig};

/// Directory that relative attachment locations resolve against.
pub const STORAGE_ROOT_VAR: &str = "STRONGBOX_STORAGE_ROOT";
/// `EnvFilter` directives for logging.
pub const LOG_FILTER_VAR: &str = "STRONGBOX_LOG";
/// `json` or `pretty`.
pub const LOG_FORMAT_VAR: &str = "STRONGBOX_LOG_FORMAT";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable was set to an unusable value.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// The variable name.
        key: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrongboxConfig {
    /// Root directory for the local binary storage.
    pub storage_root: PathBuf,
    /// Logging setup.
    pub telemetry: TelemetryConfig,
}

impl StrongboxConfig {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is set but unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`. Unset variables take defaults:
    /// the system temp directory, `info`, and JSON output.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is set but unusable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_root = match lookup(STORAGE_ROOT_VAR) {
            Some(value) if value.trim().is_empty() => {
                return Err(ConfigError::InvalidValue {
                    key: STORAGE_ROOT_VAR,
                    value,
                });
            }
            Some(value) => PathBuf::from(value),
            None => std::env::temp_dir(),
        };

        let filter = lookup(LOG_FILTER_VAR).unwrap_or_else(|| "info".to_owned());

        let format = match lookup(LOG_FORMAT_VAR) {
            Some(value) => value
                .parse::<LogFormat>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: LOG_FORMAT_VAR,
                    value,
                })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            storage_root,
            telemetry: TelemetryConfig { filter, format },
        })
    }

    /// Local binary storage rooted at `storage_root`.
    #[must_use]
    pub fn storage(&self) -> LocalFileStorage {
        LocalFileStorage::new(&self.storage_root)
    }
}
