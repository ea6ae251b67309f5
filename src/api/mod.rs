//! Management API surface
//!
//! [`ManagementApi`] abstracts every remote call the engine makes. Cross
//! cutting behaviour is layered as decorators implementing the same trait:
//! [`ResilientApi`] (retries, concurrency ceiling) wraps the live
//! [`HttpManagementApi`], and [`DryRunApi`] is placed on top when mutations
//! should be simulated. [`create_management_api`] assembles the chain once.

mod dry_run;
mod factory;
mod http;
mod resilient;

pub use dry_run::DryRunApi;
pub use factory::create_management_api;
pub use http::HttpManagementApi;
pub use resilient::ResilientApi;

use crate::error::Result;
use crate::types::{
    BulkAction, BulkActionKind, BulkActionRequest, Collection, ContentType, Entry, EntryQuery,
    Locale, Space,
};
use async_trait::async_trait;

/// Remote calls against one space environment
///
/// Mutating calls take the version the caller last observed and return the
/// entry as the server left it, so callers can thread the new version into
/// the next step.
#[async_trait]
pub trait ManagementApi: Send + Sync {
    /// Read the configured space
    async fn get_space(&self) -> Result<Space>;

    /// List content types of the environment
    async fn get_content_types(&self) -> Result<Vec<ContentType>>;

    /// List locales of the environment
    async fn get_locales(&self) -> Result<Vec<Locale>>;

    /// Read one page of entries
    async fn get_entries(&self, query: &EntryQuery) -> Result<Collection<Entry>>;

    /// Read a single entry
    async fn get_entry(&self, entry_id: &str) -> Result<Entry>;

    /// Create the entry (empty id or unknown id) or update it at `version`
    async fn create_or_update_entry(&self, entry: &Entry, version: u64) -> Result<Entry>;

    /// Publish `version` of an entry
    async fn publish_entry(&self, entry_id: &str, version: u64) -> Result<Entry>;

    /// Unpublish an entry
    async fn unpublish_entry(&self, entry_id: &str, version: u64) -> Result<Entry>;

    /// Archive an entry
    async fn archive_entry(&self, entry_id: &str, version: u64) -> Result<Entry>;

    /// Unarchive an entry
    async fn unarchive_entry(&self, entry_id: &str, version: u64) -> Result<Entry>;

    /// Delete an entry
    async fn delete_entry(&self, entry_id: &str, version: u64) -> Result<()>;

    /// Submit a bulk action
    async fn create_bulk_action(
        &self,
        kind: BulkActionKind,
        request: &BulkActionRequest,
    ) -> Result<BulkAction>;

    /// Read the current state of a bulk action
    async fn get_bulk_action(&self, action_id: &str) -> Result<BulkAction>;
}
