//! Miette diagnostic conversion for CLI errors.

use crate::error::{BuildError, CliError};
use atool_config::ConfigError;
use miette::Report;

/// Convert CliError to miette Report
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Build(e) => build_error_to_miette(e),
        CliError::Config(e) => config_error_to_miette(e),
        CliError::Compile(e) => miette::miette!(code = "CompileError", "Compiler error: {}", e),
        _ => miette::miette!("{}", err),
    }
}

/// Convert BuildError to miette Report
pub fn build_error_to_miette(err: BuildError) -> Report {
    match err {
        BuildError::ReportWriteFailed { path, source } => miette::miette!(
            help = "Check output directory permissions",
            "Failed to write stats report {}: {}",
            path.display(),
            source
        ),
        _ => miette::miette!("{}", err),
    }
}

fn config_error_to_miette(err: ConfigError) -> Report {
    let code = err.name();
    match err {
        ConfigError::NoEntry => miette::miette!(
            code = code,
            help = "Add an `entry` (a map, a module path or a list of paths) to package.json or to the override file",
            "{}",
            err
        ),
        ConfigError::OverrideParse { .. } | ConfigError::InvalidOverride { .. } => miette::miette!(
            code = code,
            help = "Override files hold a JSON or TOML object, optionally with a `profiles` table",
            "{}",
            err
        ),
        _ => miette::miette!(code = code, "Configuration error: {}", err),
    }
}
