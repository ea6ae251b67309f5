//! Retrying, concurrency-limited decorator

use crate::api::ManagementApi;
use crate::error::Result;
use crate::resilience::ResiliencyExecutor;
use crate::types::{
    BulkAction, BulkActionKind, BulkActionRequest, Collection, ContentType, Entry, EntryQuery,
    Locale, Space,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Routes every call of the inner API through a [`ResiliencyExecutor`]
pub struct ResilientApi {
    inner: Arc<dyn ManagementApi>,
    executor: Arc<ResiliencyExecutor>,
    cancel: CancellationToken,
}

impl ResilientApi {
    /// Wrap `inner`; `cancel` aborts waits, calls and backoffs
    pub fn new(
        inner: Arc<dyn ManagementApi>,
        executor: Arc<ResiliencyExecutor>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inner,
            executor,
            cancel,
        }
    }

    /// Executor shared by all calls
    pub fn executor(&self) -> &Arc<ResiliencyExecutor> {
        &self.executor
    }
}

#[async_trait]
impl ManagementApi for ResilientApi {
    async fn get_space(&self) -> Result<Space> {
        let inner = self.inner.as_ref();
        self.executor
            .execute(&self.cancel, move || inner.get_space())
            .await
    }

    async fn get_content_types(&self) -> Result<Vec<ContentType>> {
        let inner = self.inner.as_ref();
        self.executor
            .execute(&self.cancel, move || inner.get_content_types())
            .await
    }

    async fn get_locales(&self) -> Result<Vec<Locale>> {
        let inner = self.inner.as_ref();
        self.executor
            .execute(&self.cancel, move || inner.get_locales())
            .await
    }

    async fn get_entries(&self, query: &EntryQuery) -> Result<Collection<Entry>> {
        let inner = self.inner.as_ref();
        self.executor
            .execute(&self.cancel, move || inner.get_entries(query))
            .await
    }

    async fn get_entry(&self, entry_id: &str) -> Result<Entry> {
        let inner = self.inner.as_ref();
        self.executor
            .execute(&self.cancel, move || inner.get_entry(entry_id))
            .await
    }

    async fn create_or_update_entry(&self, entry: &Entry, version: u64) -> Result<Entry> {
        let inner = self.inner.as_ref();
        self.executor
            .execute(&self.cancel, move || {
                inner.create_or_update_entry(entry, version)
            })
            .await
    }

    async fn publish_entry(&self, entry_id: &str, version: u64) -> Result<Entry> {
        let inner = self.inner.as_ref();
        self.executor
            .execute(&self.cancel, move || inner.publish_entry(entry_id, version))
            .await
    }

    async fn unpublish_entry(&self, entry_id: &str, version: u64) -> Result<Entry> {
        let inner = self.inner.as_ref();
        self.executor
            .execute(&self.cancel, move || {
                inner.unpublish_entry(entry_id, version)
            })
            .await
    }

    async fn archive_entry(&self, entry_id: &str, version: u64) -> Result<Entry> {
        let inner = self.inner.as_ref();
        self.executor
            .execute(&self.cancel, move || inner.archive_entry(entry_id, version))
            .await
    }

    async fn unarchive_entry(&self, entry_id: &str, version: u64) -> Result<Entry> {
        let inner = self.inner.as_ref();
        self.executor
            .execute(&self.cancel, move || {
                inner.unarchive_entry(entry_id, version)
            })
            .await
    }

    async fn delete_entry(&self, entry_id: &str, version: u64) -> Result<()> {
        let inner = self.inner.as_ref();
        self.executor
            .execute(&self.cancel, move || inner.delete_entry(entry_id, version))
            .await
    }

    async fn create_bulk_action(
        &self,
        kind: BulkActionKind,
        request: &BulkActionRequest,
    ) -> Result<BulkAction> {
        let inner = self.inner.as_ref();
        self.executor
            .execute(&self.cancel, move || inner.create_bulk_action(kind, request))
            .await
    }

    async fn get_bulk_action(&self, action_id: &str) -> Result<BulkAction> {
        let inner = self.inner.as_ref();
        self.executor
            .execute(&self.cancel, move || inner.get_bulk_action(action_id))
            .await
    }
}
