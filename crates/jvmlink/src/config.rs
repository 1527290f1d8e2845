//! Binding configuration
//!
//! Loaded from TOML, e.g.
//!
//! ```toml
//! mute_exceptions = false
//! charset = "UTF8"
//! cache_members = true
//! ```
//!
//! Every key is optional.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Per-environment settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Start with exception descriptions suppressed.
    pub mute_exceptions: bool,

    /// Charset name used for every string conversion in both directions.
    pub charset: String,

    /// Remember resolved method and field ids of cached classes.
    pub cache_members: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mute_exceptions: true,
            charset: "UTF8".to_string(),
            cache_members: true,
        }
    }
}

impl Config {
    /// Load from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Check values a TOML parse cannot rule out.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.charset.trim().is_empty() {
            return Err(ConfigError::Invalid("charset must not be empty".to_string()));
        }
        if self.charset.contains('\0') {
            return Err(ConfigError::Invalid(
                "charset must not contain NUL".to_string(),
            ));
        }
        Ok(())
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(format!("cannot serialize: {}", e)))
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}
