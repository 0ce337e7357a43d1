//! Error types for configuration assembly, override loading and validation.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Message carried by [`ConfigError::NoEntry`]. Callers match on it, so it is fixed.
pub const NO_ENTRY_MESSAGE: &str = "no webpack entry found";

#[derive(Debug, Error)]
pub enum ConfigError {
    // Validation errors
    #[error("no webpack entry found")]
    NoEntry,

    // Project manifest errors
    #[error("failed to parse package manifest {}: {source}", .path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // Override loading errors
    #[error("failed to parse override file {}: {message}", .path.display())]
    OverrideParse { path: PathBuf, message: String },

    #[error("override file {} must contain an object or a profiles table, found {found}", .path.display())]
    InvalidOverride { path: PathBuf, found: &'static str },

    #[error("unsupported override format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Stable error name, e.g. `"NoEntry"` for a configuration without entry points.
    pub fn name(&self) -> &'static str {
        match self {
            ConfigError::NoEntry => "NoEntry",
            ConfigError::Manifest { .. } => "ManifestError",
            ConfigError::OverrideParse { .. } => "OverrideParseError",
            ConfigError::InvalidOverride { .. } => "InvalidOverride",
            ConfigError::UnsupportedFormat(_) => "UnsupportedFormat",
            ConfigError::InvalidValue(_) => "InvalidValue",
            ConfigError::Io(_) => "IoError",
        }
    }
}
