//! Build orchestration.
//!
//! [`BuildOrchestrator`] drives a [`Compiler`] through one-shot and watch
//! builds. Every pass moves `Idle → Compiling → Reporting → Idle`; reporting
//! writes the JSON stats report, prints the textual report, sends
//! notifications and classifies the pass. The hash manifest lives here so
//! that it survives from one watch pass to the next.

use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use atool_bundler::{CompileContext, CompileError, Compiler, ManifestCache, MultiStats};
use atool_config::{BuildArgs, BundlerConfig, JsonReport, PluginSpec};
use owo_colors::Style;

use crate::error::{BuildError, Result, ResultExt};
use crate::friendly;
use crate::notification::{DesktopNotifier, Notification, Notifier};
use crate::ui::{self, BuildProgress};
use crate::watcher::{FileWatcher, WatchFilter, aggregate};

/// Where the orchestrator is within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Compiling,
    Reporting,
}

/// Classification of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Warning,
    Error,
}

/// Final status of an invocation; the binary maps it to the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    Success,
    Failure,
}

impl CompletionStatus {
    pub fn is_failure(self) -> bool {
        self == CompletionStatus::Failure
    }
}

impl From<CompletionStatus> for ExitCode {
    fn from(status: CompletionStatus) -> Self {
        match status {
            CompletionStatus::Success => ExitCode::SUCCESS,
            CompletionStatus::Failure => ExitCode::FAILURE,
        }
    }
}

/// Result of one compile pass.
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub outcome: Outcome,
    /// Stats of the pass; empty when the compiler failed as a whole.
    pub stats: MultiStats,
    /// Stats errors, or the compiler failure.
    pub errors: Vec<String>,
    /// JSON report written for this pass.
    pub report_path: Option<PathBuf>,
}

impl BuildResult {
    pub fn status(&self) -> CompletionStatus {
        match self.outcome {
            Outcome::Error => CompletionStatus::Failure,
            Outcome::Success | Outcome::Warning => CompletionStatus::Success,
        }
    }
}

/// Reporting options taken from [`BuildArgs`].
#[derive(Debug, Clone)]
struct ReportOptions {
    verbose: bool,
    silent: bool,
    json: JsonReport,
    watch: Option<Duration>,
    colors: bool,
}

pub struct BuildOrchestrator<C> {
    compiler: C,
    options: ReportOptions,
    manifest: ManifestCache,
    notifier: Box<dyn Notifier>,
    status_line: Option<bool>,
    phase: Phase,
}

impl<C: Compiler> BuildOrchestrator<C> {
    pub fn new(compiler: C, args: &BuildArgs) -> Self {
        Self {
            compiler,
            options: ReportOptions {
                verbose: args.verbose,
                silent: args.silent,
                json: args.json.clone(),
                watch: args.watch.interval(),
                colors: ui::colors_enabled(),
            },
            manifest: ManifestCache::new(),
            notifier: Box::new(DesktopNotifier),
            status_line: None,
            phase: Phase::Idle,
        }
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Forces the interactive progress line on or off instead of detecting it.
    pub fn with_status_line(mut self, enabled: bool) -> Self {
        self.status_line = Some(enabled);
        self
    }

    pub fn with_colors(mut self, colors: bool) -> Self {
        self.options.colors = colors;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Hashed file names recorded by every pass so far.
    pub fn manifest(&self) -> &ManifestCache {
        &self.manifest
    }

    /// Runs one compile pass and reports on it.
    ///
    /// Compilation problems are part of the returned result; `Err` means the
    /// report itself could not be produced.
    ///
    /// # Arguments
    ///
    /// * `configs` - Prepared configurations, compiled together as one pass
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ReportWriteFailed`] or
    /// [`BuildError::NoReportDirectory`] when a JSON report was requested and
    /// could not be written.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use atool_bundler::NativeCompiler;
    /// use atool_cli::BuildOrchestrator;
    /// use atool_config::BuildArgs;
    ///
    /// # fn main() -> atool_cli::Result<()> {
    /// let args = BuildArgs::new("/path/to/project");
    /// let configs = atool_config::prepare(&args)?.into_vec();
    /// let mut orchestrator = BuildOrchestrator::new(NativeCompiler::new(), &args);
    /// let result = orchestrator.run(&configs)?;
    /// println!("{:?}", result.outcome);
    /// # Ok(())
    /// # }
    /// ```
    pub fn run(&mut self, configs: &[BundlerConfig]) -> Result<BuildResult> {
        let span = tracing::info_span!("build", configs = configs.len());
        let _enter = span.enter();

        self.phase = Phase::Compiling;
        let mut progress = match self.status_line {
            Some(enabled) => BuildProgress::with_status_line(enabled),
            None => BuildProgress::new(),
        };
        let compiled = {
            let mut ctx = CompileContext::new(&mut self.manifest)
                .with_progress(|percentage, message| progress.update(percentage, message));
            self.compiler.compile(configs, &mut ctx)
        };
        drop(progress);

        self.phase = Phase::Reporting;
        let result = self.report(configs, compiled);
        self.phase = Phase::Idle;
        result
    }

    /// Builds once, then again after every batch of file changes until
    /// `shutdown` resolves.
    ///
    /// Changes arriving within the watch interval of the first one are
    /// compiled together. A pass whose report could not be written is logged
    /// and counts as failed; watching goes on.
    ///
    /// # Arguments
    ///
    /// * `configs` - Prepared configurations; the first context is watched
    /// * `shutdown` - Future that ends the session when it resolves
    /// * `on_result` - Called with the result of every reported pass
    ///
    /// # Errors
    ///
    /// Returns an error only when the file watcher cannot be started.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use atool_bundler::NativeCompiler;
    /// use atool_cli::BuildOrchestrator;
    /// use atool_config::{BuildArgs, WatchMode};
    ///
    /// # async fn watch() -> atool_cli::Result<()> {
    /// let mut args = BuildArgs::new("/path/to/project");
    /// args.watch = WatchMode::Enabled;
    /// let configs = atool_config::prepare(&args)?.into_vec();
    ///
    /// let status = BuildOrchestrator::new(NativeCompiler::new(), &args)
    ///     .watch(&configs, async { let _ = tokio::signal::ctrl_c().await; }, |result| {
    ///         println!("{:?}", result.outcome);
    ///     })
    ///     .await?;
    /// # let _ = status;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn watch<S, F>(
        &mut self,
        configs: &[BundlerConfig],
        shutdown: S,
        mut on_result: F,
    ) -> Result<CompletionStatus>
    where
        S: Future<Output = ()>,
        F: FnMut(&BuildResult),
    {
        let interval = self
            .options
            .watch
            .unwrap_or(Duration::from_millis(atool_config::DEFAULT_WATCH_INTERVAL_MS));
        let (watcher, mut rx) = FileWatcher::new(watch_filter(configs)?)?;
        tracing::debug!("Watching {} for changes", watcher.root().display());

        let mut status = self.watch_pass(configs, &mut on_result);

        tokio::pin!(shutdown);
        loop {
            let first = tokio::select! {
                _ = &mut shutdown => break,
                change = rx.recv() => match change {
                    Some(path) => path,
                    None => break,
                },
            };
            let changed = tokio::select! {
                _ = &mut shutdown => break,
                changed = aggregate(first, &mut rx, interval) => match changed {
                    Some(changed) => changed,
                    None => break,
                },
            };
            tracing::info!("{} file(s) changed, rebuilding", changed.len());
            for path in &changed {
                tracing::debug!("Changed: {}", path.display());
            }

            if self.watch_pass(configs, &mut on_result).is_failure() {
                status = CompletionStatus::Failure;
            }
        }

        tracing::debug!("Watch stopped");
        Ok(status)
    }

    fn watch_pass<F: FnMut(&BuildResult)>(
        &mut self,
        configs: &[BundlerConfig],
        on_result: &mut F,
    ) -> CompletionStatus {
        match self.run(configs) {
            Ok(result) => {
                on_result(&result);
                result.status()
            }
            Err(e) => {
                ui::error(&e.to_string());
                CompletionStatus::Failure
            }
        }
    }

    fn report(
        &mut self,
        configs: &[BundlerConfig],
        compiled: std::result::Result<MultiStats, CompileError>,
    ) -> Result<BuildResult> {
        let (stats, failure) = match compiled {
            Ok(stats) => (stats, None),
            Err(e) => {
                tracing::error!("Compilation failed: {e}");
                (MultiStats::default(), Some(e.to_string()))
            }
        };

        let report_path = match (&failure, self.options.json.file_name()) {
            (None, Some(name)) => Some(write_json_report(configs, &stats, name)?),
            _ => None,
        };

        let errors: Vec<String> = match &failure {
            Some(message) => vec![message.clone()],
            None => stats.errors().map(str::to_string).collect(),
        };
        let outcome = if !errors.is_empty() {
            Outcome::Error
        } else if stats.has_warnings() {
            Outcome::Warning
        } else {
            Outcome::Success
        };

        match &failure {
            Some(message) => ui::error(message),
            None => self.print_report(&stats),
        }

        let friendly_errors = configs
            .iter()
            .any(|config| config.has_plugin(PluginSpec::FriendlyErrors.name()));
        if friendly_errors {
            friendly::report(&stats, self.options.silent, self.notifier.as_ref());
        }

        Ok(BuildResult {
            outcome,
            stats,
            errors,
            report_path,
        })
    }

    /// Watch passes only print when they have errors.
    fn print_report(&self, stats: &MultiStats) {
        let has_errors = stats.has_errors();
        if self.options.watch.is_some() && !has_errors {
            return;
        }

        let text = ui::render_stats(stats, self.options.verbose, self.options.colors);
        if has_errors {
            eprintln!("{text}");
            return;
        }

        println!("{text}");
        if !self.options.silent {
            self.notifier
                .notify(&Notification::new("done").with_subtitle("build successfully"));
        }
    }
}

/// Output directory of a configuration, resolved against its context.
fn output_dir(config: &BundlerConfig) -> Option<PathBuf> {
    let path = config.output_path()?;
    if path.is_absolute() {
        return Some(path);
    }
    Some(match config.context() {
        Some(context) => context.join(path),
        None => path,
    })
}

/// Writes the stats report into the output directory of the last configuration.
fn write_json_report(configs: &[BundlerConfig], stats: &MultiStats, name: &str) -> Result<PathBuf> {
    let dir = configs
        .last()
        .and_then(output_dir)
        .ok_or(BuildError::NoReportDirectory)?;
    let path = dir.join(name);

    let report = stats.to_json().context("Failed to build stats report")?;
    let json = serde_json::to_string(&report)?;
    std::fs::create_dir_all(&dir)
        .and_then(|_| std::fs::write(&path, json))
        .map_err(|source| BuildError::ReportWriteFailed {
            path: path.clone(),
            source,
        })?;

    ui::info(&format!(
        "Generate Json File: {}",
        ui::paint(path.display(), Style::new().bold(), ui::colors_enabled())
    ));
    Ok(path)
}

fn watch_filter(configs: &[BundlerConfig]) -> Result<WatchFilter> {
    let root = match configs.first().and_then(BundlerConfig::context) {
        Some(context) => context,
        None => std::env::current_dir()?,
    };
    let ignored = configs.iter().filter_map(output_dir).collect();
    Ok(WatchFilter::new(root, ignored))
}

#[cfg(test)]
mod tests {
    use super::*;
    use atool_bundler::Stats;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Compiler returning canned results and counting its calls.
    struct Scripted {
        errors: Vec<String>,
        warnings: Vec<String>,
        fail: bool,
        calls: Arc<Mutex<usize>>,
    }

    impl Scripted {
        fn clean() -> Self {
            Self {
                errors: Vec::new(),
                warnings: Vec::new(),
                fail: false,
                calls: Arc::default(),
            }
        }
    }

    impl Compiler for Scripted {
        fn compile(
            &mut self,
            configs: &[BundlerConfig],
            ctx: &mut CompileContext<'_>,
        ) -> atool_bundler::Result<MultiStats> {
            *self.calls.lock().unwrap() += 1;
            ctx.progress(0.5, "working");
            ctx.manifest.record("demo/index.js", "demo/index-0000.js");
            ctx.progress(1.0, "");
            if self.fail {
                return Err(CompileError::InvalidConfig("broken".into()));
            }
            let children = configs
                .iter()
                .map(|_| Stats {
                    errors: self.errors.clone(),
                    warnings: self.warnings.clone(),
                    ..Stats::default()
                })
                .collect();
            Ok(MultiStats::new(children))
        }
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Notification>>>);

    impl Notifier for Recorder {
        fn notify(&self, notification: &Notification) {
            self.0.lock().unwrap().push(notification.clone());
        }
    }

    fn config(dir: &std::path::Path) -> BundlerConfig {
        BundlerConfig::from_value(json!({
            "context": dir,
            "entry": { "index": "./index.js" },
            "output": { "path": dir.join("dist") },
            "plugins": [{ "plugin": "friendly-errors" }]
        }))
        .unwrap()
    }

    fn orchestrator(compiler: Scripted, args: &BuildArgs, recorder: &Recorder) -> BuildOrchestrator<Scripted> {
        BuildOrchestrator::new(compiler, args)
            .with_notifier(recorder.clone())
            .with_status_line(false)
            .with_colors(false)
    }

    #[test]
    fn clean_build_succeeds_and_notifies() {
        let dir = TempDir::new().unwrap();
        let recorder = Recorder::default();
        let args = BuildArgs::new(dir.path());
        let mut orch = orchestrator(Scripted::clean(), &args, &recorder);

        let result = orch.run(&[config(dir.path())]).unwrap();

        assert_eq!(result.outcome, Outcome::Success);
        assert_eq!(result.status(), CompletionStatus::Success);
        assert_eq!(orch.phase(), Phase::Idle);
        assert_eq!(orch.manifest().get("demo/index.js"), Some("demo/index-0000.js"));
        let sent = recorder.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message, "done");
    }

    #[test]
    fn silent_build_does_not_notify() {
        let dir = TempDir::new().unwrap();
        let recorder = Recorder::default();
        let mut args = BuildArgs::new(dir.path());
        args.silent = true;

        orchestrator(Scripted::clean(), &args, &recorder)
            .run(&[config(dir.path())])
            .unwrap();

        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[test]
    fn stats_errors_fail_the_build() {
        let dir = TempDir::new().unwrap();
        let recorder = Recorder::default();
        let args = BuildArgs::new(dir.path());
        let compiler = Scripted {
            errors: vec!["./missing.js\nModule not found".into()],
            ..Scripted::clean()
        };

        let result = orchestrator(compiler, &args, &recorder)
            .run(&[config(dir.path())])
            .unwrap();

        assert_eq!(result.outcome, Outcome::Error);
        assert_eq!(result.status(), CompletionStatus::Failure);
        assert_eq!(result.errors.len(), 1);
        // Only the friendly-errors notification, no success notification.
        let sent = recorder.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message, "error : ModuleNotFoundError");
    }

    #[test]
    fn warnings_do_not_fail_the_build() {
        let dir = TempDir::new().unwrap();
        let recorder = Recorder::default();
        let args = BuildArgs::new(dir.path());
        let compiler = Scripted {
            warnings: vec!["Unknown plugin 'banner' was ignored".into()],
            ..Scripted::clean()
        };

        let result = orchestrator(compiler, &args, &recorder)
            .run(&[config(dir.path())])
            .unwrap();

        assert_eq!(result.outcome, Outcome::Warning);
        assert_eq!(result.status(), CompletionStatus::Success);
    }

    #[test]
    fn compiler_failure_is_a_failed_result() {
        let dir = TempDir::new().unwrap();
        let recorder = Recorder::default();
        let mut args = BuildArgs::new(dir.path());
        args.json = JsonReport::Default;
        let compiler = Scripted {
            fail: true,
            ..Scripted::clean()
        };

        let result = orchestrator(compiler, &args, &recorder)
            .run(&[config(dir.path())])
            .unwrap();

        assert_eq!(result.outcome, Outcome::Error);
        assert_eq!(result.errors, vec!["Invalid configuration: broken".to_string()]);
        assert!(result.report_path.is_none());
    }

    #[test]
    fn json_report_goes_to_last_output_path() {
        let dir = TempDir::new().unwrap();
        let recorder = Recorder::default();
        let mut args = BuildArgs::new(dir.path());
        args.json = JsonReport::File("stats.json".into());

        let first = config(dir.path());
        let mut second = config(dir.path());
        second
            .output_mut()
            .insert("path".into(), json!(dir.path().join("second")));

        let result = orchestrator(Scripted::clean(), &args, &recorder)
            .run(&[first, second])
            .unwrap();

        let expected = dir.path().join("second").join("stats.json");
        assert_eq!(result.report_path, Some(expected.clone()));
        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(expected).unwrap()).unwrap();
        assert_eq!(report["children"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn relative_output_path_resolves_against_context() {
        let config = BundlerConfig::from_value(json!({
            "context": "/project",
            "output": { "path": "build" }
        }))
        .unwrap();
        assert_eq!(output_dir(&config), Some(PathBuf::from("/project/build")));
    }

    #[tokio::test]
    async fn watch_survives_unwritable_report() {
        let dir = TempDir::new().unwrap();
        // A plain file where the output directory should be.
        std::fs::write(dir.path().join("dist"), "").unwrap();
        let recorder = Recorder::default();
        let mut args = BuildArgs::new(dir.path());
        args.watch = atool_config::WatchMode::Enabled;
        args.json = JsonReport::Default;
        let compiler = Scripted::clean();
        let calls = compiler.calls.clone();

        let mut outcomes = Vec::new();
        let mut orch = orchestrator(compiler, &args, &recorder);
        let status = orch
            .watch(&[config(dir.path())], async {}, |result| outcomes.push(result.outcome))
            .await
            .unwrap();

        assert_eq!(status, CompletionStatus::Failure);
        assert!(outcomes.is_empty());
        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(orch.phase(), Phase::Idle);
    }

    #[test]
    fn unwritable_report_is_an_error_for_single_builds() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("dist"), "").unwrap();
        let recorder = Recorder::default();
        let mut args = BuildArgs::new(dir.path());
        args.json = JsonReport::Default;

        let err = orchestrator(Scripted::clean(), &args, &recorder)
            .run(&[config(dir.path())])
            .unwrap_err();

        assert!(matches!(
            err,
            crate::CliError::Build(BuildError::ReportWriteFailed { .. })
        ));
    }

    #[tokio::test]
    async fn watch_reports_initial_pass_and_stops_on_shutdown() {
        let dir = TempDir::new().unwrap();
        let recorder = Recorder::default();
        let mut args = BuildArgs::new(dir.path());
        args.watch = atool_config::WatchMode::Enabled;
        let compiler = Scripted {
            errors: vec!["./missing.js\nModule not found".into()],
            ..Scripted::clean()
        };
        let calls = compiler.calls.clone();

        let mut outcomes = Vec::new();
        let status = orchestrator(compiler, &args, &recorder)
            .watch(&[config(dir.path())], async {}, |result| outcomes.push(result.outcome))
            .await
            .unwrap();

        assert_eq!(status, CompletionStatus::Failure);
        assert_eq!(outcomes, vec![Outcome::Error]);
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
