//! atool command line entry point.
//!
//! Parses arguments, initializes logging and colors, dispatches the command
//! and turns its completion status into the process exit code.

use std::process::ExitCode;

use atool_cli::{cli, commands, error, logger, ui};
use clap::Parser;
use miette::Result;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let result = match args.command {
        cli::Command::Build(build_args) => commands::build_execute(build_args, args.verbose).await,
        cli::Command::Check(check_args) => commands::check_execute(check_args, args.verbose).await,
    };

    // Exit only after every report line above has been written.
    result
        .map(ExitCode::from)
        .map_err(error::cli_error_to_miette)
}
