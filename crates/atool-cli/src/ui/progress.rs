//! Build progress display.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::Style;

use super::{colors_enabled, paint};

/// Banner printed when a compile pass reaches 100%.
pub const FINISHED_BANNER: &str = "bundle build is now finished.";

/// Progress below this value is shown on the interactive status line.
pub const INTERACTIVE_LIMIT: f64 = 0.71;

/// Progress reporter for one compile pass.
///
/// On an interactive terminal the current step is shown on a single,
/// overwritten status line until the pass passes [`INTERACTIVE_LIMIT`];
/// without a terminal each step becomes a debug log line. Reaching 100%
/// prints [`FINISHED_BANNER`] either way.
pub struct BuildProgress {
    line: Option<ProgressBar>,
    finished: bool,
}

impl BuildProgress {
    /// Detects whether the status line can be drawn.
    pub fn new() -> Self {
        Self::with_status_line(Self::should_show())
    }

    /// Forces the status line on or off.
    pub fn with_status_line(interactive: bool) -> Self {
        let line = interactive.then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("📦  {msg:.magenta}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });
        Self {
            line,
            finished: false,
        }
    }

    /// Handles one `(percentage, message)` report from the compiler.
    pub fn update(&mut self, percentage: f64, message: &str) {
        if percentage >= 1.0 {
            self.finish();
            return;
        }

        match &self.line {
            Some(line) if percentage < INTERACTIVE_LIMIT => line.set_message(message.to_string()),
            Some(_) => {}
            None => tracing::debug!(percentage = percentage * 100.0, "{message}"),
        }
    }

    /// Whether the pass reached 100%.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Some(line) = self.line.take() {
            line.finish_and_clear();
        }
        eprintln!(
            "\n{}",
            paint(FINISHED_BANNER, Style::new().green(), colors_enabled())
        );
    }

    /// Returns `false` in CI environments or when stderr is not a terminal.
    pub fn should_show() -> bool {
        console::user_attended_stderr() && !super::is_ci()
    }
}

impl Default for BuildProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BuildProgress {
    fn drop(&mut self) {
        if let Some(line) = self.line.take() {
            line.finish_and_clear();
        }
    }
}
