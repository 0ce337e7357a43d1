//! Command-line interface definition for atool.
//!
//! # Command Structure
//!
//! - `atool build` - Assemble the bundler configuration and build the project
//! - `atool check` - Print the resolved configuration without building

mod commands;

use clap::Parser;

pub use commands::{BuildArgs, CheckArgs, Command, ConfigArgs};

/// atool - build web projects from package.json with zero configuration
#[derive(Parser, Debug)]
#[command(
    name = "atool",
    version,
    about = "Build web projects from package.json with zero configuration",
    long_about = "atool derives a complete bundler configuration from package.json and a few\n\
                  flags, applies the project's webpack.config.json override and builds it.\n\
                  Watch mode rebuilds on every change."
)]
pub struct Cli {
    /// Enable verbose logging and the detailed stats report
    ///
    /// Shows debug logs from every atool crate and adds chunks, modules, the
    /// compilation hash and the version to the build report.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all log output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    ///
    /// Outputs plain text without ANSI color codes. Useful for logging to
    /// files or systems that don't support colored terminal output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
