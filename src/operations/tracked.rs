//! Tracking decorator

use crate::operations::{EntryOperations, UpsertRequest};
use crate::tracking::OperationTracker;
use crate::types::{Entry, OperationResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Records every outcome of the wrapped operations
pub struct TrackedOperations {
    inner: Arc<dyn EntryOperations>,
    tracker: Arc<OperationTracker>,
}

impl TrackedOperations {
    /// Wrap `inner`, recording into `tracker`
    pub fn new(inner: Arc<dyn EntryOperations>, tracker: Arc<OperationTracker>) -> Self {
        Self { inner, tracker }
    }

    fn recorded(&self, result: OperationResult) -> OperationResult {
        self.tracker.record(&result);
        result
    }

    fn recorded_all(&self, results: Vec<OperationResult>) -> Vec<OperationResult> {
        for result in &results {
            self.tracker.record(result);
        }
        results
    }
}

#[async_trait]
impl EntryOperations for TrackedOperations {
    async fn upsert(&self, entry: &Entry, request: UpsertRequest) -> OperationResult {
        self.recorded(self.inner.upsert(entry, request).await)
    }

    async fn publish(&self, entry: &Entry) -> OperationResult {
        self.recorded(self.inner.publish(entry).await)
    }

    async fn unpublish(&self, entry: &Entry) -> OperationResult {
        self.recorded(self.inner.unpublish(entry).await)
    }

    async fn archive(&self, entry: &Entry) -> OperationResult {
        self.recorded(self.inner.archive(entry).await)
    }

    async fn unarchive(&self, entry: &Entry) -> OperationResult {
        self.recorded(self.inner.unarchive(entry).await)
    }

    async fn delete(&self, entry: &Entry) -> OperationResult {
        self.recorded(self.inner.delete(entry).await)
    }

    async fn bulk_publish(&self, entries: &[Entry]) -> Vec<OperationResult> {
        self.recorded_all(self.inner.bulk_publish(entries).await)
    }

    async fn bulk_unpublish(&self, entries: &[Entry]) -> Vec<OperationResult> {
        self.recorded_all(self.inner.bulk_unpublish(entries).await)
    }
}
