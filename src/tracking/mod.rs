//! Per-run outcome tracking
//!
//! [`OperationTracker`] is the tally used for correctness (the run summary);
//! [`ProgressReporter`] is a separate signal used only for UI feedback.

mod progress;

pub use progress::{CountingProgress, NoopProgress, ProgressReporter};

use crate::types::{Operation, OperationCounts, OperationResult, OperationTrackResult};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Thread-safe tally of operation outcomes
#[derive(Debug, Default)]
pub struct OperationTracker {
    state: Mutex<TrackerState>,
}

#[derive(Debug, Default)]
struct TrackerState {
    operations: BTreeMap<Operation, OperationCounts>,
    /// Entity id -> whether any operation on it failed
    entities: HashMap<String, bool>,
    /// Outcomes without an entity id, counted individually
    unnamed_total: u64,
    unnamed_successful: u64,
}

impl OperationTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count a successful `operation` on `entity_id`
    pub fn increment_success_count(&self, operation: Operation, entity_id: &str) {
        let mut state = self.lock();
        state.operations.entry(operation).or_default().success_count += 1;
        if entity_id.is_empty() {
            state.unnamed_total += 1;
            state.unnamed_successful += 1;
        } else {
            state.entities.entry(entity_id.to_string()).or_insert(false);
        }
    }

    /// Count a failed `operation` on `entity_id`
    pub fn increment_error_count(&self, operation: Operation, entity_id: &str) {
        let mut state = self.lock();
        state.operations.entry(operation).or_default().error_count += 1;
        if entity_id.is_empty() {
            state.unnamed_total += 1;
        } else {
            state.entities.insert(entity_id.to_string(), true);
        }
    }

    /// Record an outcome; cancelled outcomes are not counted
    pub fn record(&self, result: &OperationResult) {
        if result.is_cancelled() {
            return;
        }
        if result.is_success() {
            self.increment_success_count(result.operation, &result.entity_id);
        } else {
            self.increment_error_count(result.operation, &result.entity_id);
        }
    }

    /// Point-in-time snapshot of the tally
    pub fn get_result(&self) -> OperationTrackResult {
        let state = self.lock();
        let named_successful = state.entities.values().filter(|failed| !**failed).count() as u64;
        OperationTrackResult {
            total_entries: state.entities.len() as u64 + state.unnamed_total,
            successful_entries: named_successful + state.unnamed_successful,
            operations: state.operations.clone(),
        }
    }
}
