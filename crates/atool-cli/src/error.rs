//! Error handling for the atool CLI.
//!
//! `CliError` is the top-level error returned by commands. Configuration and
//! compiler errors convert into it automatically; [`ResultExt`] attaches
//! paths and hints on the way up. Problems inside a compilation (missing
//! modules, failed loaders) are not errors here: they arrive in the build
//! result and only decide the exit status.

mod miette;

pub use self::miette::{build_error_to_miette, cli_error_to_miette};

use std::path::PathBuf;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Assembling, merging or validating the bundler configuration failed
    #[error("Configuration error: {0}")]
    Config(#[from] atool_config::ConfigError),

    /// Build bookkeeping around a compile failed
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// The bundling engine could not run
    #[error("Compiler error: {0}")]
    Compile(#[from] atool_bundler::CompileError),

    /// Invalid command-line arguments, environment variables or settings
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File watching errors
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An error annotated with context or a hint through [`ResultExt`]
    #[error("{0}")]
    Custom(String),
}

/// Errors raised while reporting on a finished compile.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The JSON stats report could not be written
    #[error("Failed to write stats report {}: {source}\n\nHint: Check output directory permissions", .path.display())]
    ReportWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// None of the configurations has an output path to place the report in
    #[error("No output path to write the stats report to\n\nHint: Set output.path in the override file or pass --output-path")]
    NoReportDirectory,
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for adding context to `Result` types.
pub trait ResultExt<T> {
    /// Turns a not-found I/O error into [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    /// Appends a hint line to the error message.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    /// Prefixes the error message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            match err {
                CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                    CliError::FileNotFound(path.as_ref().to_path_buf())
                }
                other => other,
            }
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}\n\nHint: {}", err, hint))
        })
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}: {}", msg, err))
        })
    }
}
