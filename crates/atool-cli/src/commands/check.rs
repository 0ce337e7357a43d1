//! `atool check`: print the resolved configuration.

use atool_config::BuildArgs;

use crate::cli::CheckArgs;
use crate::error::Result;
use crate::orchestrator::CompletionStatus;
use crate::settings::Settings;
use crate::ui;

/// Execute the check command.
pub async fn execute(args: CheckArgs, verbose: bool) -> Result<CompletionStatus> {
    let settings = Settings::for_check(&args, verbose)?;
    let build_args = settings.into_build_args()?;

    println!("{}", render(&build_args)?);
    ui::success("Configuration is valid");
    Ok(CompletionStatus::Success)
}

/// Resolved configuration set as pretty JSON: an object for one
/// configuration, an array for several.
pub fn render(args: &BuildArgs) -> Result<String> {
    let configs = atool_config::prepare(args)?;
    Ok(serde_json::to_string_pretty(&configs)?)
}
