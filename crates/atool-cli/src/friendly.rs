//! Friendly error summaries.
//!
//! Active when a configuration carries the `friendly-errors` plugin: after
//! each pass with errors or warnings a short summary is printed and, unless
//! the build is silent, a desktop notification names the first problem.

use atool_bundler::MultiStats;

use crate::notification::{Notification, Notifier};
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// One stats error or warning split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendlyError {
    pub name: String,
    /// Module request the problem was reported for.
    pub file: Option<String>,
    pub message: String,
}

impl FriendlyError {
    /// Parses a stats entry of the form `"<request>\n<message>"`.
    pub fn parse(raw: &str, severity: Severity) -> Self {
        let (file, message) = match raw.split_once('\n') {
            Some((file, message)) => (Some(file.to_string()), message.to_string()),
            None => (None, raw.to_string()),
        };
        let name = if message.starts_with("Module not found") {
            "ModuleNotFoundError"
        } else if message.starts_with("Unknown plugin") {
            "UnknownPluginWarning"
        } else if severity == Severity::Warning {
            "ModuleWarning"
        } else {
            "ModuleBuildError"
        };
        Self {
            name: name.to_string(),
            file,
            message,
        }
    }
}

/// Summary of one pass: errors win over warnings; duplicates are dropped.
pub fn summarize(stats: &MultiStats) -> Option<(Severity, Vec<FriendlyError>)> {
    let (severity, raw): (Severity, Vec<&str>) = if stats.has_errors() {
        (Severity::Error, stats.errors().collect())
    } else if stats.has_warnings() {
        (Severity::Warning, stats.warnings().collect())
    } else {
        return None;
    };

    let mut errors: Vec<FriendlyError> = Vec::new();
    for entry in raw {
        let parsed = FriendlyError::parse(entry, severity);
        if !errors.contains(&parsed) {
            errors.push(parsed);
        }
    }
    Some((severity, errors))
}

/// Notification for a summarized pass.
pub fn notification(severity: Severity, errors: &[FriendlyError]) -> Notification {
    match (severity, errors.first()) {
        (Severity::Error, Some(first)) => {
            Notification::new(format!("{} : {}", severity.as_str(), first.name))
                .with_subtitle(first.file.clone().unwrap_or_default())
        }
        _ => Notification::new("warn"),
    }
}

/// Prints the summary and notifies unless `silent`.
pub fn report(stats: &MultiStats, silent: bool, notifier: &dyn Notifier) {
    let Some((severity, errors)) = summarize(stats) else {
        return;
    };

    match severity {
        Severity::Error => ui::error(&format!("Failed to compile with {} error(s)", errors.len())),
        Severity::Warning => ui::warning(&format!("Compiled with {} warning(s)", errors.len())),
    }
    for error in &errors {
        let location = error.file.as_deref().unwrap_or("(build)");
        let headline = error.message.lines().next().unwrap_or("");
        eprintln!("  {} in {}: {}", error.name, location, headline);
    }

    if !silent {
        notifier.notify(&notification(severity, &errors));
    }
}
