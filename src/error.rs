//! Error types for configuration loading and settings reads.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while resolving agent configuration or reading dashboard settings.
///
/// Every variant is fatal for startup; nothing is downgraded to a default.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required configuration file does not exist.
    #[error("Config file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    /// A value could not be coerced to the type its key requires.
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// The file exists but could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON, or its top level has the wrong shape.
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A dotted key path runs through a value that is not a mapping.
    #[error("Cannot descend into non-mapping value at '{path}'")]
    NotAMapping { path: String },

    /// A dotted key path is empty or has an empty segment.
    #[error("Invalid key path: '{key}'")]
    InvalidKeyPath { key: String },
}

impl ConfigError {
    pub fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_missing_file(&self) -> bool {
        matches!(self, Self::MissingFile { .. })
    }

    pub fn is_invalid_value(&self) -> bool {
        matches!(self, Self::InvalidValue { .. })
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
