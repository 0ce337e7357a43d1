//! atool command line interface.
//!
//! Wires the configuration pipeline of `atool-config` to the bundling engine of
//! `atool-bundler` and owns everything user facing around a build.
//!
//! # Architecture
//!
//! - [`cli`] - clap argument definitions
//! - [`settings`] - figment layering of defaults, `ATOOL_*` variables and flags
//! - [`orchestrator`] - one-shot and watch builds, JSON report, exit policy
//! - [`friendly`] - error summaries and desktop notifications for failed builds
//! - [`watcher`] - file system watching for rebuilds
//! - [`ui`] - status lines, progress and the textual stats report
//! - [`error`] - error types and miette conversion
//! - [`logger`] - tracing subscriber setup

pub mod cli;
pub mod commands;
pub mod error;
pub mod friendly;
pub mod logger;
pub mod notification;
pub mod orchestrator;
pub mod settings;
pub mod ui;
pub mod watcher;

pub use error::{BuildError, CliError, Result, ResultExt};
pub use orchestrator::{BuildOrchestrator, BuildResult, CompletionStatus, Outcome, Phase};
pub use settings::Settings;
