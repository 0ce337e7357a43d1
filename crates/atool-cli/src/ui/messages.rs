//! Status message functions for terminal output.

use owo_colors::Style;

use super::{colors_enabled, paint};

/// Print a success message to stderr.
pub fn success(message: &str) {
    eprintln!("{} {}", mark("✓", Style::new().green().bold()), message);
}

/// Print an info message to stderr.
pub fn info(message: &str) {
    eprintln!("{} {}", mark("ℹ", Style::new().blue().bold()), message);
}

/// Print a warning message to stderr.
pub fn warning(message: &str) {
    eprintln!(
        "{} {}",
        mark("⚠", Style::new().yellow().bold()),
        paint(message, Style::new().yellow(), colors_enabled())
    );
}

/// Print an error message to stderr.
pub fn error(message: &str) {
    eprintln!(
        "{} {}",
        mark("✗", Style::new().red().bold()),
        paint(message, Style::new().red(), colors_enabled())
    );
}

fn mark(symbol: &str, style: Style) -> String {
    paint(symbol, style, colors_enabled())
}
