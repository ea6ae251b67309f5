//! Entry operations
//!
//! [`EntryOperations`] is the entry-level surface the pipeline drives. Every
//! method returns outcomes instead of errors, so callers can fan out over a
//! batch and collect every result:
//! - [`EntryOperationExecutor`] performs the version-aware transitions
//! - [`TrackedOperations`] records each outcome in an
//!   [`OperationTracker`](crate::tracking::OperationTracker)

mod executor;
mod tracked;

pub use executor::EntryOperationExecutor;
pub use tracked::TrackedOperations;

use crate::types::{Entry, OperationResult};
use async_trait::async_trait;

/// Parameters of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertRequest {
    /// Last observed version (0 for new entries)
    pub version: u64,
    /// Whether the entry is currently archived and must be unarchived first
    pub archived: bool,
    /// Whether to publish after saving
    pub publish: bool,
}

impl UpsertRequest {
    /// Derive the request from the entry's own state
    pub const fn for_entry(entry: &Entry, publish: bool) -> Self {
        Self {
            version: entry.version(),
            archived: entry.is_archived(),
            publish,
        }
    }
}

/// Entry-level operations that never fail outright
#[async_trait]
pub trait EntryOperations: Send + Sync {
    /// Unarchive if needed, create or update, then optionally publish
    async fn upsert(&self, entry: &Entry, request: UpsertRequest) -> OperationResult;

    /// Publish a draft entry; published and archived entries are left alone
    async fn publish(&self, entry: &Entry) -> OperationResult;

    /// Unpublish a published entry; other entries are left alone
    async fn unpublish(&self, entry: &Entry) -> OperationResult;

    /// Archive an entry, unpublishing it first when published
    async fn archive(&self, entry: &Entry) -> OperationResult;

    /// Unarchive an archived entry; other entries are left alone
    async fn unarchive(&self, entry: &Entry) -> OperationResult;

    /// Delete an entry, unpublishing or unarchiving it first as needed
    async fn delete(&self, entry: &Entry) -> OperationResult;

    /// Publish many entries with one bulk action
    async fn bulk_publish(&self, entries: &[Entry]) -> Vec<OperationResult>;

    /// Unpublish many entries with one bulk action
    async fn bulk_unpublish(&self, entries: &[Entry]) -> Vec<OperationResult>;
}
