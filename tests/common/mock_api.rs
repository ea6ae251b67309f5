//! In-memory management API for tests
//!
//! Behaves like the real service where the engine depends on it: versions
//! must match, published entries cannot be archived or deleted, archived
//! entries cannot be changed. Every call is recorded.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use cms_migrate::api::ManagementApi;
use cms_migrate::error::{Error, Result};
use cms_migrate::types::{
    BulkAction, BulkActionError, BulkActionKind, BulkActionRequest, BulkActionStatus,
    BulkActionSys, Collection, ContentType, Entry, EntryQuery, Locale, ResourceSys, Space,
};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Remote method, used to script failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GetEntries,
    GetEntry,
    Upsert,
    Publish,
    Unpublish,
    Archive,
    Unarchive,
    Delete,
    CreateBulkAction,
    GetBulkAction,
}

/// A recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetEntries { skip: u64 },
    GetEntry(String),
    Upsert { id: String, version: u64 },
    Publish { id: String, version: u64 },
    Unpublish { id: String, version: u64 },
    Archive { id: String, version: u64 },
    Unarchive { id: String, version: u64 },
    Delete { id: String, version: u64 },
    CreateBulkAction { kind: BulkActionKind, ids: Vec<String> },
    GetBulkAction(String),
}

impl Call {
    /// Whether the call changes remote state
    pub const fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Self::GetEntries { .. } | Self::GetEntry(_) | Self::GetBulkAction(_)
        )
    }
}

type ErrorFactory = Box<dyn Fn() -> Error + Send + Sync>;

struct ScriptedFailure {
    method: Method,
    entity_id: Option<String>,
    remaining: usize,
    make: ErrorFactory,
}

/// Recording, scriptable [`ManagementApi`]
#[derive(Default)]
pub struct MockManagementApi {
    entries: Mutex<BTreeMap<String, Entry>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<Vec<ScriptedFailure>>,
    bulk_statuses: Mutex<VecDeque<BulkActionStatus>>,
    bulk_error: Mutex<Option<BulkActionError>>,
    bulk_actions: Mutex<HashMap<String, BulkActionKind>>,
    latency: Mutex<Option<Duration>>,
    created: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockManagementApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the remote store
    pub fn with_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
        let api = Self::new();
        {
            let mut store = api.entries.lock().unwrap();
            for entry in entries {
                store.insert(entry.sys.id.clone(), entry);
            }
        }
        api
    }

    /// Sleep inside every call, so concurrency is observable
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    /// Fail the next `times` calls of `method` (for `entity_id`, if given)
    pub fn fail(
        &self,
        method: Method,
        entity_id: Option<&str>,
        times: usize,
        make: impl Fn() -> Error + Send + Sync + 'static,
    ) {
        self.failures.lock().unwrap().push(ScriptedFailure {
            method,
            entity_id: entity_id.map(str::to_string),
            remaining: times,
            make: Box::new(make),
        });
    }

    /// Statuses returned by successive bulk action polls; `succeeded`
    /// once exhausted
    pub fn script_bulk_statuses(&self, statuses: impl IntoIterator<Item = BulkActionStatus>) {
        self.bulk_statuses.lock().unwrap().extend(statuses);
    }

    /// Error reported by bulk actions that end `failed`
    pub fn set_bulk_error(&self, id: &str, message: &str) {
        *self.bulk_error.lock().unwrap() = Some(BulkActionError {
            sys: ResourceSys { id: id.to_string() },
            message: Some(message.to_string()),
        });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.calls().iter().filter(|c| c.is_mutation()).count()
    }

    pub fn entry(&self, id: &str) -> Option<Entry> {
        self.entries.lock().unwrap().get(id).cloned()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, call: Call, method: Method, entity_id: &str) -> Result<InFlight<'_>> {
        self.calls.lock().unwrap().push(call);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);

        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut failures = self.failures.lock().unwrap();
        if let Some(failure) = failures.iter_mut().find(|f| {
            f.method == method
                && f.remaining > 0
                && f.entity_id.as_deref().is_none_or(|id| id == entity_id)
        }) {
            failure.remaining -= 1;
            return Err((failure.make)());
        }
        Ok(guard)
    }

    fn mutate(
        &self,
        entry_id: &str,
        version: u64,
        change: impl FnOnce(&mut Entry) -> Result<()>,
    ) -> Result<Entry> {
        let mut store = self.entries.lock().unwrap();
        let entry = store.get_mut(entry_id).ok_or_else(|| not_found(entry_id))?;
        if entry.sys.version != version {
            return Err(version_mismatch(entry_id));
        }
        change(entry)?;
        entry.sys.version += 1;
        Ok(entry.clone())
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub fn not_found(entry_id: &str) -> Error {
    Error::Api {
        status: 404,
        error_id: Some("NotFound".to_string()),
        message: format!("entry {entry_id} not found"),
    }
}

pub fn version_mismatch(entry_id: &str) -> Error {
    Error::Api {
        status: 409,
        error_id: Some("VersionMismatch".to_string()),
        message: format!("version mismatch for {entry_id}"),
    }
}

fn bad_request(message: &str) -> Error {
    Error::Api {
        status: 422,
        error_id: Some("InvalidEntry".to_string()),
        message: message.to_string(),
    }
}

#[async_trait]
impl ManagementApi for MockManagementApi {
    async fn get_space(&self) -> Result<Space> {
        Ok(Space {
            name: "Test Space".to_string(),
            sys: ResourceSys {
                id: "space".to_string(),
            },
        })
    }

    async fn get_content_types(&self) -> Result<Vec<ContentType>> {
        Ok(Vec::new())
    }

    async fn get_locales(&self) -> Result<Vec<Locale>> {
        Ok(Vec::new())
    }

    async fn get_entries(&self, query: &EntryQuery) -> Result<Collection<Entry>> {
        let _guard = self
            .enter(Call::GetEntries { skip: query.skip }, Method::GetEntries, "")
            .await?;
        let store = self.entries.lock().unwrap();
        let matching: Vec<Entry> = store
            .values()
            .filter(|e| {
                query
                    .content_type
                    .as_deref()
                    .is_none_or(|ct| e.content_type_id() == Some(ct))
            })
            .cloned()
            .collect();
        let skip = usize::try_from(query.skip).unwrap();
        let limit = usize::try_from(query.limit).unwrap();
        Ok(Collection {
            total: matching.len() as u64,
            skip: query.skip,
            limit: query.limit,
            items: matching.into_iter().skip(skip).take(limit).collect(),
        })
    }

    async fn get_entry(&self, entry_id: &str) -> Result<Entry> {
        let _guard = self
            .enter(Call::GetEntry(entry_id.to_string()), Method::GetEntry, entry_id)
            .await?;
        self.entry(entry_id).ok_or_else(|| not_found(entry_id))
    }

    async fn create_or_update_entry(&self, entry: &Entry, version: u64) -> Result<Entry> {
        let call = Call::Upsert {
            id: entry.sys.id.clone(),
            version,
        };
        let _guard = self.enter(call, Method::Upsert, entry.id()).await?;

        if !entry.id().is_empty() && self.entry(entry.id()).is_some() {
            return self.mutate(entry.id(), version, |stored| {
                if stored.sys.archived_at.is_some() {
                    return Err(bad_request("cannot update an archived entry"));
                }
                stored.fields.clone_from(&entry.fields);
                Ok(())
            });
        }

        let id = if entry.id().is_empty() {
            format!("created-{}", self.created.fetch_add(1, Ordering::SeqCst))
        } else {
            entry.id().to_string()
        };
        let mut created = Entry::new(id.clone(), entry.content_type_id().unwrap_or("unknown"));
        created.fields.clone_from(&entry.fields);
        created.sys.version = 1;
        self.entries.lock().unwrap().insert(id, created.clone());
        Ok(created)
    }

    async fn publish_entry(&self, entry_id: &str, version: u64) -> Result<Entry> {
        let call = Call::Publish {
            id: entry_id.to_string(),
            version,
        };
        let _guard = self.enter(call, Method::Publish, entry_id).await?;
        self.mutate(entry_id, version, |stored| {
            if stored.sys.archived_at.is_some() {
                return Err(bad_request("cannot publish an archived entry"));
            }
            stored.sys.published_version = Some(version);
            stored.sys.published_at = Some(Utc::now());
            Ok(())
        })
    }

    async fn unpublish_entry(&self, entry_id: &str, version: u64) -> Result<Entry> {
        let call = Call::Unpublish {
            id: entry_id.to_string(),
            version,
        };
        let _guard = self.enter(call, Method::Unpublish, entry_id).await?;
        self.mutate(entry_id, version, |stored| {
            stored.sys.published_version = None;
            stored.sys.published_at = None;
            Ok(())
        })
    }

    async fn archive_entry(&self, entry_id: &str, version: u64) -> Result<Entry> {
        let call = Call::Archive {
            id: entry_id.to_string(),
            version,
        };
        let _guard = self.enter(call, Method::Archive, entry_id).await?;
        self.mutate(entry_id, version, |stored| {
            if stored.sys.published_at.is_some() {
                return Err(bad_request("cannot archive a published entry"));
            }
            stored.sys.archived_at = Some(Utc::now());
            Ok(())
        })
    }

    async fn unarchive_entry(&self, entry_id: &str, version: u64) -> Result<Entry> {
        let call = Call::Unarchive {
            id: entry_id.to_string(),
            version,
        };
        let _guard = self.enter(call, Method::Unarchive, entry_id).await?;
        self.mutate(entry_id, version, |stored| {
            stored.sys.archived_at = None;
            Ok(())
        })
    }

    async fn delete_entry(&self, entry_id: &str, version: u64) -> Result<()> {
        let call = Call::Delete {
            id: entry_id.to_string(),
            version,
        };
        let _guard = self.enter(call, Method::Delete, entry_id).await?;
        let mut store = self.entries.lock().unwrap();
        let stored = store.get(entry_id).ok_or_else(|| not_found(entry_id))?;
        if stored.sys.version != version {
            return Err(version_mismatch(entry_id));
        }
        if stored.sys.published_at.is_some() || stored.sys.archived_at.is_some() {
            return Err(bad_request("only draft entries can be deleted"));
        }
        store.remove(entry_id);
        Ok(())
    }

    async fn create_bulk_action(
        &self,
        kind: BulkActionKind,
        request: &BulkActionRequest,
    ) -> Result<BulkAction> {
        let ids: Vec<String> = request
            .entities
            .items
            .iter()
            .map(|item| item.sys.id.clone())
            .collect();
        let call = Call::CreateBulkAction {
            kind,
            ids: ids.clone(),
        };
        let _guard = self.enter(call, Method::CreateBulkAction, "").await?;

        let id = format!("bulk-{}", self.bulk_actions.lock().unwrap().len());
        self.bulk_actions.lock().unwrap().insert(id.clone(), kind);
        Ok(BulkAction {
            sys: BulkActionSys {
                id,
                status: BulkActionStatus::Created,
            },
            action: Some(kind.path_segment().to_string()),
            error: None,
        })
    }

    async fn get_bulk_action(&self, action_id: &str) -> Result<BulkAction> {
        let _guard = self
            .enter(
                Call::GetBulkAction(action_id.to_string()),
                Method::GetBulkAction,
                action_id,
            )
            .await?;
        let status = self
            .bulk_statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(BulkActionStatus::Succeeded);
        let error = if status == BulkActionStatus::Failed {
            self.bulk_error.lock().unwrap().clone()
        } else {
            None
        };
        Ok(BulkAction {
            sys: BulkActionSys {
                id: action_id.to_string(),
                status,
            },
            action: None,
            error,
        })
    }
}
