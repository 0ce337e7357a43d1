//! `atool build`.
//!
//! Resolves settings, prepares the configuration set (assemble, merge the
//! override, validate) and hands it to the orchestrator. A configuration
//! without entries fails here, before anything is compiled.

use std::future::Future;

use atool_bundler::{Compiler, NativeCompiler};
use atool_config::BuildArgs;

use crate::cli;
use crate::error::Result;
use crate::notification::{DesktopNotifier, Notifier};
use crate::orchestrator::{BuildOrchestrator, CompletionStatus};
use crate::settings::Settings;
use crate::ui;

/// Execute the build command.
pub async fn execute(args: cli::BuildArgs, verbose: bool) -> Result<CompletionStatus> {
    let settings = Settings::for_build(&args, verbose)?;
    tracing::debug!(?settings, "Resolved settings");
    run(&settings.into_build_args()?).await
}

/// Builds with the native compiler and desktop notifications; watch builds
/// stop on Ctrl+C.
pub async fn run(args: &BuildArgs) -> Result<CompletionStatus> {
    run_with(args, NativeCompiler::new(), DesktopNotifier, ctrl_c()).await
}

/// Builds with the given compiler and notifier; watch builds stop when
/// `shutdown` resolves.
pub async fn run_with<C, N, S>(
    args: &BuildArgs,
    compiler: C,
    notifier: N,
    shutdown: S,
) -> Result<CompletionStatus>
where
    C: Compiler,
    N: Notifier + 'static,
    S: Future<Output = ()>,
{
    let configs = atool_config::prepare(args)?.into_vec();
    tracing::debug!("Prepared {} configuration(s)", configs.len());

    let mut orchestrator = BuildOrchestrator::new(compiler, args).with_notifier(notifier);
    if args.watch.is_enabled() {
        ui::info("Watching for changes, press Ctrl+C to stop");
        orchestrator.watch(&configs, shutdown, |_| {}).await
    } else {
        Ok(orchestrator.run(&configs)?.status())
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Unable to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}
