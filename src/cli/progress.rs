//! Shared CLI progress reporter

use crate::cli::style::{bar_style, spinner_style};
use cms_migrate::tracking::ProgressReporter;
use indicatif::ProgressBar;
use std::time::Duration;

/// Progress bar on stderr
///
/// Shows a bar when the total is known and a spinner with a running count
/// otherwise.
pub struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    /// Create a reporter; nothing is drawn until `start`
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl Default for CliProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for CliProgress {
    fn start(&self, operation: &str, total: Option<u64>) {
        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        match total {
            Some(len) => {
                self.bar.set_length(len);
                self.bar.set_style(bar_style());
            }
            None => {
                self.bar.set_style(spinner_style());
                self.bar.enable_steady_tick(Duration::from_millis(80));
            }
        }
        self.bar.set_message(operation.to_string());
    }

    fn increment(&self) {
        self.bar.inc(1);
    }

    fn complete(&self) {
        self.bar.finish_and_clear();
    }
}
