//! Dry-run decorator
//!
//! Reads are delegated to the wrapped API; mutations are answered with
//! fabricated responses and never leave the process.

use crate::api::ManagementApi;
use crate::error::Result;
use crate::types::{
    BulkAction, BulkActionKind, BulkActionRequest, BulkActionStatus, BulkActionSys, Collection,
    ContentType, Entry, EntryQuery, EntrySys, Locale, Space,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Prefix of fabricated bulk action ids
const DRY_RUN_ACTION_PREFIX: &str = "dry-run-";

/// Simulates mutations on top of a live read path
pub struct DryRunApi {
    inner: Arc<dyn ManagementApi>,
}

impl DryRunApi {
    /// Wrap `inner`, which only ever receives read calls
    pub fn new(inner: Arc<dyn ManagementApi>) -> Self {
        Self { inner }
    }

    fn bumped(entry_id: &str, version: u64) -> EntrySys {
        EntrySys {
            id: entry_id.to_string(),
            version: version + 1,
            ..EntrySys::default()
        }
    }
}

fn fabricated(sys: EntrySys) -> Entry {
    Entry {
        sys,
        fields: serde_json::Map::new(),
    }
}

#[async_trait]
impl ManagementApi for DryRunApi {
    async fn get_space(&self) -> Result<Space> {
        self.inner.get_space().await
    }

    async fn get_content_types(&self) -> Result<Vec<ContentType>> {
        self.inner.get_content_types().await
    }

    async fn get_locales(&self) -> Result<Vec<Locale>> {
        self.inner.get_locales().await
    }

    async fn get_entries(&self, query: &EntryQuery) -> Result<Collection<Entry>> {
        self.inner.get_entries(query).await
    }

    async fn get_entry(&self, entry_id: &str) -> Result<Entry> {
        self.inner.get_entry(entry_id).await
    }

    async fn create_or_update_entry(&self, entry: &Entry, version: u64) -> Result<Entry> {
        let mut result = entry.clone();
        if result.sys.id.is_empty() {
            result.sys.id = uuid::Uuid::new_v4().simple().to_string();
        }
        result.sys.version = version + 1;
        info!(entry_id = result.id(), version, "dry run: would save entry");
        Ok(result)
    }

    async fn publish_entry(&self, entry_id: &str, version: u64) -> Result<Entry> {
        info!(entry_id, version, "dry run: would publish entry");
        Ok(fabricated(EntrySys {
            published_version: Some(version),
            published_at: Some(Utc::now()),
            ..Self::bumped(entry_id, version)
        }))
    }

    async fn unpublish_entry(&self, entry_id: &str, version: u64) -> Result<Entry> {
        info!(entry_id, version, "dry run: would unpublish entry");
        Ok(fabricated(Self::bumped(entry_id, version)))
    }

    async fn archive_entry(&self, entry_id: &str, version: u64) -> Result<Entry> {
        info!(entry_id, version, "dry run: would archive entry");
        Ok(fabricated(EntrySys {
            archived_at: Some(Utc::now()),
            ..Self::bumped(entry_id, version)
        }))
    }

    async fn unarchive_entry(&self, entry_id: &str, version: u64) -> Result<Entry> {
        info!(entry_id, version, "dry run: would unarchive entry");
        Ok(fabricated(Self::bumped(entry_id, version)))
    }

    async fn delete_entry(&self, entry_id: &str, version: u64) -> Result<()> {
        info!(entry_id, version, "dry run: would delete entry");
        Ok(())
    }

    async fn create_bulk_action(
        &self,
        kind: BulkActionKind,
        request: &BulkActionRequest,
    ) -> Result<BulkAction> {
        info!(%kind, items = request.len(), "dry run: would submit bulk action");
        Ok(BulkAction {
            sys: BulkActionSys {
                id: format!("{DRY_RUN_ACTION_PREFIX}{}", uuid::Uuid::new_v4().simple()),
                status: BulkActionStatus::Succeeded,
            },
            action: Some(kind.path_segment().to_string()),
            error: None,
        })
    }

    async fn get_bulk_action(&self, action_id: &str) -> Result<BulkAction> {
        Ok(BulkAction {
            sys: BulkActionSys {
                id: action_id.to_string(),
                status: BulkActionStatus::Succeeded,
            },
            action: None,
            error: None,
        })
    }
}
