//! Core data types
//!
//! Entries and bulk actions mirror the management API's JSON shapes; the
//! remaining types are the engine's own bookkeeping.

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Reference to another resource by id (`{ "sys": { "id": ... } }`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Link target
    pub sys: LinkSys,
}

/// System block of a [`Link`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSys {
    /// Target id
    pub id: String,
    /// Always `Link` on the wire
    #[serde(rename = "type", default = "link_type_name")]
    pub kind: String,
    /// Kind of the linked resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
}

fn link_type_name() -> String {
    "Link".to_string()
}

impl Link {
    /// Link to a content type
    pub fn content_type(id: impl Into<String>) -> Self {
        Self {
            sys: LinkSys {
                id: id.into(),
                kind: link_type_name(),
                link_type: Some("ContentType".to_string()),
            },
        }
    }
}

/// System metadata of an entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySys {
    /// Entry id; empty until the entry has been created remotely
    #[serde(default)]
    pub id: String,
    /// Optimistic-concurrency token, bumped by the server on every mutation
    #[serde(default)]
    pub version: u64,
    /// Content type the entry belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<Link>,
    /// Last publish time, if ever published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Version that was last published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_version: Option<u64>,
    /// Archive time, if archived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
}

/// A content entry
///
/// `fields` is opaque to the engine; it is carried through create/update
/// calls unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// System metadata
    pub sys: EntrySys,
    /// Localized field values
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Publication state derived from an entry's own fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Never published, or unpublished
    Draft,
    /// Has a published version
    Published,
    /// Archived (takes precedence over published)
    Archived,
}

impl Entry {
    /// Create a draft entry of the given content type
    pub fn new(id: impl Into<String>, content_type_id: impl Into<String>) -> Self {
        Self {
            sys: EntrySys {
                id: id.into(),
                content_type: Some(Link::content_type(content_type_id)),
                ..EntrySys::default()
            },
            fields: serde_json::Map::new(),
        }
    }

    /// Entry id (may be empty before creation)
    pub fn id(&self) -> &str {
        &self.sys.id
    }

    /// Current version
    pub const fn version(&self) -> u64 {
        self.sys.version
    }

    /// Content type id, if known
    pub fn content_type_id(&self) -> Option<&str> {
        self.sys.content_type.as_ref().map(|l| l.sys.id.as_str())
    }

    /// Current publication state
    pub const fn state(&self) -> EntryState {
        if self.sys.archived_at.is_some() {
            EntryState::Archived
        } else if self.sys.published_version.is_some() || self.sys.published_at.is_some() {
            EntryState::Published
        } else {
            EntryState::Draft
        }
    }

    /// Whether the entry has a published version
    pub const fn is_published(&self) -> bool {
        matches!(self.state(), EntryState::Published)
    }

    /// Whether the entry is archived
    pub const fn is_archived(&self) -> bool {
        matches!(self.state(), EntryState::Archived)
    }
}

/// Paged collection returned by list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection<T> {
    /// Total number of matching items
    #[serde(default)]
    pub total: u64,
    /// Offset of this page
    #[serde(default)]
    pub skip: u64,
    /// Page size
    #[serde(default)]
    pub limit: u64,
    /// Items on this page
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// Query for listing entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryQuery {
    /// Restrict to one content type
    pub content_type: Option<String>,
    /// Offset
    pub skip: u64,
    /// Page size
    pub limit: u64,
}

/// Space metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Space {
    /// Space name
    pub name: String,
    /// System metadata
    pub sys: ResourceSys,
}

/// Content type metadata (fields are not interpreted)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentType {
    /// System metadata
    pub sys: ResourceSys,
    /// Display name
    pub name: String,
    /// Field used as the entry title
    #[serde(default)]
    pub display_field: Option<String>,
}

/// Locale metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Locale {
    /// Locale code (e.g. `en-US`)
    pub code: String,
    /// Display name
    pub name: String,
    /// Whether this is the environment's default locale
    #[serde(default)]
    pub default: bool,
}

/// Minimal system block for read-only resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSys {
    /// Resource id
    pub id: String,
}

/// Kind of entry operation; the dimension used for tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Read entries
    Read,
    /// Create or update an entry
    Upload,
    /// Publish an entry
    Publish,
    /// Unpublish an entry
    Unpublish,
    /// Archive an entry
    Archive,
    /// Unarchive an entry
    Unarchive,
    /// Delete an entry
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Upload => write!(f, "upload"),
            Self::Publish => write!(f, "publish"),
            Self::Unpublish => write!(f, "unpublish"),
            Self::Archive => write!(f, "archive"),
            Self::Unarchive => write!(f, "unarchive"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Outcome of one operation on one entry
///
/// Produced once and never retried; retries happen inside the call that
/// produced it.
#[derive(Debug, Clone)]
pub struct OperationResult {
    /// Entry the operation applied to (empty for failed creations)
    pub entity_id: String,
    /// Operation that was attempted
    pub operation: Operation,
    /// Failure cause, shared so bulk failures can fan out without cloning
    pub error: Option<Arc<Error>>,
}

impl OperationResult {
    /// Successful outcome
    pub fn success(entity_id: impl Into<String>, operation: Operation) -> Self {
        Self {
            entity_id: entity_id.into(),
            operation,
            error: None,
        }
    }

    /// Failed outcome
    pub fn failure(entity_id: impl Into<String>, operation: Operation, error: Error) -> Self {
        Self::shared_failure(entity_id, operation, Arc::new(error))
    }

    /// Failed outcome sharing an existing error
    pub fn shared_failure(
        entity_id: impl Into<String>,
        operation: Operation,
        error: Arc<Error>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            operation,
            error: Some(error),
        }
    }

    /// Whether the operation succeeded
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Whether the operation was cut short by cancellation
    pub fn is_cancelled(&self) -> bool {
        self.error.as_deref().is_some_and(Error::is_cancelled)
    }
}

/// Bulk action flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkActionKind {
    /// Bulk publish
    Publish,
    /// Bulk unpublish
    Unpublish,
}

impl BulkActionKind {
    /// Path segment of the submission endpoint
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Unpublish => "unpublish",
        }
    }

    /// Operation recorded for each item
    pub const fn operation(self) -> Operation {
        match self {
            Self::Publish => Operation::Publish,
            Self::Unpublish => Operation::Unpublish,
        }
    }
}

impl fmt::Display for BulkActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Remote lifecycle status of a bulk action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BulkActionStatus {
    /// Accepted, not started
    Created,
    /// Running
    InProgress,
    /// Every item processed
    Succeeded,
    /// The action failed as a whole
    Failed,
}

impl BulkActionStatus {
    /// Whether polling can stop
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Bulk action request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkActionRequest {
    /// Entities the action applies to
    pub entities: BulkEntities,
}

/// Item list of a bulk action request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkEntities {
    /// Referenced entries
    pub items: Vec<BulkItem>,
}

/// One entry reference inside a bulk action request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItem {
    /// Versioned link
    pub sys: BulkItemSys,
}

/// Versioned entry link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemSys {
    /// Entry id
    pub id: String,
    /// Entry version; required for publish only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// Always `Link`
    #[serde(rename = "type")]
    pub kind: String,
    /// Always `Entry`
    pub link_type: String,
}

impl BulkActionRequest {
    /// Build the request body for `kind` over `entries`
    pub fn new(kind: BulkActionKind, entries: &[Entry]) -> Self {
        let items = entries
            .iter()
            .map(|entry| BulkItem {
                sys: BulkItemSys {
                    id: entry.id().to_string(),
                    version: match kind {
                        BulkActionKind::Publish => Some(entry.version()),
                        BulkActionKind::Unpublish => None,
                    },
                    kind: "Link".to_string(),
                    link_type: "Entry".to_string(),
                },
            })
            .collect();
        Self {
            entities: BulkEntities { items },
        }
    }

    /// Number of referenced entries
    pub fn len(&self) -> usize {
        self.entities.items.len()
    }

    /// Whether no entries are referenced
    pub fn is_empty(&self) -> bool {
        self.entities.items.is_empty()
    }
}

/// Bulk action as reported by the management API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkAction {
    /// System block carrying id and status
    pub sys: BulkActionSys,
    /// `publish` or `unpublish`
    #[serde(default)]
    pub action: Option<String>,
    /// Failure details once status is `failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<BulkActionError>,
}

/// System block of a bulk action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkActionSys {
    /// Bulk action id
    pub id: String,
    /// Lifecycle status
    pub status: BulkActionStatus,
}

/// Remote failure of a bulk action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkActionError {
    /// Error identifier block
    pub sys: ResourceSys,
    /// Optional message
    #[serde(default)]
    pub message: Option<String>,
}

/// Success and error counts for one operation kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OperationCounts {
    /// Successful outcomes
    pub success_count: u64,
    /// Failed outcomes
    pub error_count: u64,
}

/// Snapshot of a run's outcomes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationTrackResult {
    /// Distinct entries touched
    pub total_entries: u64,
    /// Entries that never recorded an error
    pub successful_entries: u64,
    /// Counts per operation kind
    pub operations: BTreeMap<Operation, OperationCounts>,
}

impl OperationTrackResult {
    /// Entries with at least one failed operation
    pub const fn failed_entries(&self) -> u64 {
        self.total_entries.saturating_sub(self.successful_entries)
    }

    /// Counts for one operation (zero if never recorded)
    pub fn counts(&self, operation: Operation) -> OperationCounts {
        self.operations.get(&operation).copied().unwrap_or_default()
    }
}

/// Process-level settings fixed at start-up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeContext {
    /// Simulate mutations instead of calling the remote API
    pub dry_run: bool,
}
