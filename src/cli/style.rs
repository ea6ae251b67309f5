//! Terminal styling helpers
//!
//! Output goes through `anstream`, which strips the escape codes when the
//! stream is not a terminal.

use indicatif::ProgressStyle;
use owo_colors::OwoColorize;
use std::fmt::Display;

/// Semantic colours for CLI output
pub trait Stylize {
    /// Names, ids and commands the user may act on
    fn accent(&self) -> String;
    /// Secondary detail
    fn muted(&self) -> String;
    /// Headings
    fn emphasis(&self) -> String;
    /// Success counts
    fn success(&self) -> String;
    /// Error counts
    fn failure(&self) -> String;
}

impl<T: Display> Stylize for T {
    fn accent(&self) -> String {
        self.cyan().to_string()
    }

    fn muted(&self) -> String {
        self.dimmed().to_string()
    }

    fn emphasis(&self) -> String {
        self.bold().to_string()
    }

    fn success(&self) -> String {
        self.green().to_string()
    }

    fn failure(&self) -> String {
        self.red().to_string()
    }
}

/// Green check mark
pub fn check() -> String {
    "✓".success()
}

/// Red cross
pub fn cross() -> String {
    "✗".failure()
}

/// Spinner used while waiting on a single request
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Bar used for entry runs
pub fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:>10} [{bar:30.cyan/blue}] {pos}/{len} ({eta})")
        .map(|style| style.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}
