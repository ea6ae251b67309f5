//! Progress reporting for interface-agnostic updates
//!
//! The pipeline reports progress through this trait so the CLI can render a
//! bar while tests and headless callers use a counter or nothing at all.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Progress reporter trait
///
/// Incremented once per entry-level outcome, successful or not. Used purely
/// for feedback; the run summary comes from the tracker.
pub trait ProgressReporter: Send + Sync {
    /// Called once before work begins; `total` is `None` when unknown
    fn start(&self, operation: &str, total: Option<u64>);

    /// Called after each entry-level outcome
    fn increment(&self);

    /// Called when the run ends, including early exits
    fn complete(&self);
}

/// No-op progress reporter
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn start(&self, _operation: &str, _total: Option<u64>) {}
    fn increment(&self) {}
    fn complete(&self) {}
}

/// Progress reporter that only counts
#[derive(Debug, Default)]
pub struct CountingProgress {
    operation: Mutex<Option<String>>,
    total: Mutex<Option<u64>>,
    completed: AtomicU64,
    finished: AtomicU64,
}

impl CountingProgress {
    /// Create a zeroed counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Name passed to the last `start`
    pub fn operation(&self) -> Option<String> {
        self.operation.lock().ok().and_then(|name| name.clone())
    }

    /// Total passed to the last `start`
    pub fn total(&self) -> Option<u64> {
        self.total.lock().ok().and_then(|total| *total)
    }

    /// Increments seen so far
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    /// Number of `complete` calls
    pub fn finished(&self) -> u64 {
        self.finished.load(Ordering::SeqCst)
    }
}

impl ProgressReporter for CountingProgress {
    fn start(&self, operation: &str, total: Option<u64>) {
        if let Ok(mut name) = self.operation.lock() {
            *name = Some(operation.to_string());
        }
        if let Ok(mut slot) = self.total.lock() {
            *slot = total;
        }
    }

    fn increment(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn complete(&self) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}
