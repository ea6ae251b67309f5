//! Version-aware entry transitions
//!
//! Each transition is a short sequential pipeline: every step returns the
//! entry as the server left it and the next step uses that version, never
//! the one the caller started with.

use crate::api::ManagementApi;
use crate::bulk::BulkActionClient;
use crate::error::Result;
use crate::operations::{EntryOperations, UpsertRequest};
use crate::types::{Entry, EntryState, Operation, OperationResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Drives single entries through publish-state transitions
pub struct EntryOperationExecutor {
    api: Arc<dyn ManagementApi>,
    bulk: BulkActionClient,
}

impl EntryOperationExecutor {
    /// Create an executor over `api`, using `bulk` for bulk actions
    pub fn new(api: Arc<dyn ManagementApi>, bulk: BulkActionClient) -> Self {
        Self { api, bulk }
    }

    /// Returns the id of the saved entry so failures after creation still
    /// name it.
    async fn run_upsert(
        &self,
        entry: &Entry,
        request: UpsertRequest,
        entity_id: &mut String,
    ) -> Result<()> {
        let mut version = request.version;

        if request.archived && !entry.id().is_empty() {
            let unarchived = self.api.unarchive_entry(entry.id(), version).await?;
            version = unarchived.version();
        }

        let saved = self.api.create_or_update_entry(entry, version).await?;
        entity_id.clone_from(&saved.sys.id);
        version = saved.version();

        if request.publish {
            self.api.publish_entry(entity_id, version).await?;
        }
        Ok(())
    }

    async fn run_archive(&self, entry: &Entry) -> Result<()> {
        let mut version = entry.version();
        if entry.state() == EntryState::Published {
            version = self.api.unpublish_entry(entry.id(), version).await?.version();
        }
        self.api.archive_entry(entry.id(), version).await?;
        Ok(())
    }

    async fn run_delete(&self, entry: &Entry) -> Result<()> {
        let version = match entry.state() {
            EntryState::Published => {
                self.api
                    .unpublish_entry(entry.id(), entry.version())
                    .await?
                    .version()
            }
            EntryState::Archived => {
                self.api
                    .unarchive_entry(entry.id(), entry.version())
                    .await?
                    .version()
            }
            EntryState::Draft => entry.version(),
        };
        self.api.delete_entry(entry.id(), version).await
    }
}

fn outcome(entity_id: &str, operation: Operation, result: Result<()>) -> OperationResult {
    match result {
        Ok(()) => OperationResult::success(entity_id, operation),
        Err(e) => {
            debug!(entity_id, %operation, error = %e, "entry operation failed");
            OperationResult::failure(entity_id, operation, e)
        }
    }
}

fn settled(entry: &Entry, operation: Operation, state: EntryState) -> OperationResult {
    debug!(entry_id = entry.id(), %operation, ?state, "nothing to do");
    OperationResult::success(entry.id(), operation)
}

#[async_trait]
impl EntryOperations for EntryOperationExecutor {
    async fn upsert(&self, entry: &Entry, request: UpsertRequest) -> OperationResult {
        let mut entity_id = entry.id().to_string();
        let result = self.run_upsert(entry, request, &mut entity_id).await;
        outcome(&entity_id, Operation::Upload, result)
    }

    async fn publish(&self, entry: &Entry) -> OperationResult {
        match entry.state() {
            state @ (EntryState::Published | EntryState::Archived) => {
                settled(entry, Operation::Publish, state)
            }
            EntryState::Draft => {
                let result = self
                    .api
                    .publish_entry(entry.id(), entry.version())
                    .await
                    .map(drop);
                outcome(entry.id(), Operation::Publish, result)
            }
        }
    }

    async fn unpublish(&self, entry: &Entry) -> OperationResult {
        match entry.state() {
            EntryState::Published => {
                let result = self
                    .api
                    .unpublish_entry(entry.id(), entry.version())
                    .await
                    .map(drop);
                outcome(entry.id(), Operation::Unpublish, result)
            }
            state => settled(entry, Operation::Unpublish, state),
        }
    }

    async fn archive(&self, entry: &Entry) -> OperationResult {
        match entry.state() {
            EntryState::Archived => settled(entry, Operation::Archive, EntryState::Archived),
            _ => outcome(entry.id(), Operation::Archive, self.run_archive(entry).await),
        }
    }

    async fn unarchive(&self, entry: &Entry) -> OperationResult {
        match entry.state() {
            EntryState::Archived => {
                let result = self
                    .api
                    .unarchive_entry(entry.id(), entry.version())
                    .await
                    .map(drop);
                outcome(entry.id(), Operation::Unarchive, result)
            }
            state => settled(entry, Operation::Unarchive, state),
        }
    }

    async fn delete(&self, entry: &Entry) -> OperationResult {
        outcome(entry.id(), Operation::Delete, self.run_delete(entry).await)
    }

    async fn bulk_publish(&self, entries: &[Entry]) -> Vec<OperationResult> {
        self.bulk.publish(entries).await
    }

    async fn bulk_unpublish(&self, entries: &[Entry]) -> Vec<OperationResult> {
        self.bulk.unpublish(entries).await
    }
}
