//! Configuration for the mock server.
//!
//! Read once at startup from an optional YAML file; command-line flags and
//! environment variables override individual values (see `main.rs`).
//!
//! ```yaml
//! listen:
//!   host: 0.0.0.0
//!   port: 8080
//! mock_prefix: /mock
//! rules:
//!   directory: rules
//! recording:
//!   directory: requests
//! ```

mod listen;
mod storage;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use listen::ListenConfig;
pub use storage::{RecordingConfig, RulesConfig};

/// Mount point of the mock endpoint.
pub const DEFAULT_MOCK_PREFIX: &str = "/mock";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    /// Path prefix the mock endpoint is served under; stripped before matching
    #[serde(default = "default_mock_prefix")]
    pub mock_prefix: String,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
}

fn default_mock_prefix() -> String {
    DEFAULT_MOCK_PREFIX.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: ListenConfig::default(),
            mock_prefix: default_mock_prefix(),
            rules: RulesConfig::default(),
            recording: RecordingConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.mock_prefix.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "mock_prefix '{}' must start with '/'",
                self.mock_prefix
            )));
        }
        if self.mock_prefix.len() > 1 && self.mock_prefix.ends_with('/') {
            return Err(ConfigError::Invalid(format!(
                "mock_prefix '{}' must not end with '/'",
                self.mock_prefix
            )));
        }
        if self.mock_prefix.starts_with(crate::server::ADMIN_PREFIX) {
            return Err(ConfigError::Invalid(format!(
                "mock_prefix '{}' collides with the admin API",
                self.mock_prefix
            )));
        }
        if self.rules.directory.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("rules.directory is empty".into()));
        }
        if self.recording.directory.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("recording.directory is empty".into()));
        }
        Ok(())
    }
}
