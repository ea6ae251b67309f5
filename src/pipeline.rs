//! Run driver
//!
//! Wires an [`EntrySource`] through the batch processor into entry
//! operations, with every outcome tracked and reported as progress.

use crate::api::ManagementApi;
use crate::batch::{BatchProcessor, BatchStats};
use crate::bulk::BulkActionClient;
use crate::config::{Config, MAX_BULK_ITEMS};
use crate::error::{Error, Result};
use crate::operations::{EntryOperationExecutor, EntryOperations, TrackedOperations, UpsertRequest};
use crate::source::EntrySource;
use crate::tracking::{OperationTracker, ProgressReporter};
use crate::types::{BulkActionKind, Entry, EntryState, OperationResult, OperationTrackResult};
use futures::future::join_all;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// How publish and unpublish runs reach the server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PublishMode {
    /// One bulk action per batch
    #[default]
    Bulk,
    /// One call per entry
    PerEntry,
}

/// Pipeline tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Entries per batch
    pub batch_size: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { batch_size: 50 }
    }
}

impl PipelineOptions {
    /// Options from the loaded configuration
    pub const fn from_config(config: &Config) -> Self {
        Self {
            batch_size: config.batch_size.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum EntryAction {
    Upload { publish: bool },
    Publish,
    Unpublish,
    Archive,
    Unarchive,
    Delete,
}

impl EntryAction {
    const fn name(self) -> &'static str {
        match self {
            Self::Upload { .. } => "upload",
            Self::Publish => "publish",
            Self::Unpublish => "unpublish",
            Self::Archive => "archive",
            Self::Unarchive => "unarchive",
            Self::Delete => "delete",
        }
    }

    async fn apply(self, operations: &dyn EntryOperations, entry: &Entry) -> OperationResult {
        match self {
            Self::Upload { publish } => {
                operations
                    .upsert(entry, UpsertRequest::for_entry(entry, publish))
                    .await
            }
            Self::Publish => operations.publish(entry).await,
            Self::Unpublish => operations.unpublish(entry).await,
            Self::Archive => operations.archive(entry).await,
            Self::Unarchive => operations.unarchive(entry).await,
            Self::Delete => operations.delete(entry).await,
        }
    }
}

/// Drives entry runs and owns the run's tracker
pub struct EntryPipeline {
    operations: Arc<dyn EntryOperations>,
    tracker: Arc<OperationTracker>,
    progress: Arc<dyn ProgressReporter>,
    options: PipelineOptions,
    cancel: CancellationToken,
}

impl EntryPipeline {
    /// Create a pipeline over `operations`, tracking into a fresh tracker
    pub fn new(
        operations: Arc<dyn EntryOperations>,
        progress: Arc<dyn ProgressReporter>,
        options: PipelineOptions,
        cancel: CancellationToken,
    ) -> Self {
        let tracker = Arc::new(OperationTracker::new());
        let operations = Arc::new(TrackedOperations::new(operations, Arc::clone(&tracker)));
        Self {
            operations,
            tracker,
            progress,
            options,
            cancel,
        }
    }

    /// Create a pipeline with the standard executor over `api`
    pub fn from_api(
        api: Arc<dyn ManagementApi>,
        config: &Config,
        progress: Arc<dyn ProgressReporter>,
        cancel: CancellationToken,
    ) -> Self {
        let bulk = BulkActionClient::new(Arc::clone(&api), &config.bulk, cancel.clone());
        let executor = EntryOperationExecutor::new(api, bulk);
        Self::new(
            Arc::new(executor),
            progress,
            PipelineOptions::from_config(config),
            cancel,
        )
    }

    /// The run's tracker
    pub fn tracker(&self) -> &OperationTracker {
        &self.tracker
    }

    /// Create or update every entry, optionally publishing each
    pub async fn upload(&self, source: EntrySource, publish: bool) -> Result<OperationTrackResult> {
        self.run_per_entry(EntryAction::Upload { publish }, source)
            .await
    }

    /// Publish every draft entry
    ///
    /// In [`PublishMode::Bulk`] entries that are already published or
    /// archived are skipped: they advance progress but are not counted in
    /// the returned result. [`PublishMode::PerEntry`] counts them as no-op
    /// successes.
    pub async fn publish(
        &self,
        source: EntrySource,
        mode: PublishMode,
    ) -> Result<OperationTrackResult> {
        match mode {
            PublishMode::Bulk => self.run_bulk(BulkActionKind::Publish, source).await,
            PublishMode::PerEntry => self.run_per_entry(EntryAction::Publish, source).await,
        }
    }

    /// Unpublish every published entry
    ///
    /// In [`PublishMode::Bulk`] entries that are not published are skipped:
    /// they advance progress but are not counted in the returned result.
    /// [`PublishMode::PerEntry`] counts them as no-op successes.
    pub async fn unpublish(
        &self,
        source: EntrySource,
        mode: PublishMode,
    ) -> Result<OperationTrackResult> {
        match mode {
            PublishMode::Bulk => self.run_bulk(BulkActionKind::Unpublish, source).await,
            PublishMode::PerEntry => self.run_per_entry(EntryAction::Unpublish, source).await,
        }
    }

    /// Archive every entry
    pub async fn archive(&self, source: EntrySource) -> Result<OperationTrackResult> {
        self.run_per_entry(EntryAction::Archive, source).await
    }

    /// Unarchive every archived entry
    pub async fn unarchive(&self, source: EntrySource) -> Result<OperationTrackResult> {
        self.run_per_entry(EntryAction::Unarchive, source).await
    }

    /// Delete every entry
    ///
    /// A source paging over the live listing should be
    /// [buffered](EntrySource::buffered) first.
    pub async fn delete(&self, source: EntrySource) -> Result<OperationTrackResult> {
        self.run_per_entry(EntryAction::Delete, source).await
    }

    async fn run_per_entry(
        &self,
        action: EntryAction,
        source: EntrySource,
    ) -> Result<OperationTrackResult> {
        let processor = BatchProcessor::new(self.options.batch_size)?;
        let operations = self.operations.as_ref();
        let progress = self.progress.as_ref();

        self.progress.start(action.name(), Some(source.total));
        let outcome = processor
            .run(source.entries, &self.cancel, move |batch: Vec<Entry>, _| async move {
                join_all(batch.iter().map(|entry| async move {
                    let result = action.apply(operations, entry).await;
                    progress.increment();
                    result
                }))
                .await;
                Ok::<(), Error>(())
            })
            .await;
        self.finish(action.name(), outcome)
    }

    async fn run_bulk(
        &self,
        kind: BulkActionKind,
        source: EntrySource,
    ) -> Result<OperationTrackResult> {
        if self.options.batch_size > MAX_BULK_ITEMS {
            return Err(Error::InvalidArgument(format!(
                "batch size {} exceeds the bulk action limit of {MAX_BULK_ITEMS}",
                self.options.batch_size
            )));
        }

        let skipped_progress = Arc::clone(&self.progress);
        let processor =
            BatchProcessor::new(self.options.batch_size)?.with_filter(move |entry: &Entry| {
                let pending = match kind {
                    BulkActionKind::Publish => entry.state() == EntryState::Draft,
                    BulkActionKind::Unpublish => entry.is_published(),
                };
                if !pending {
                    skipped_progress.increment();
                }
                pending
            });
        let operations = self.operations.as_ref();
        let progress = self.progress.as_ref();
        let name = kind.path_segment();

        self.progress.start(name, Some(source.total));
        let outcome = processor
            .run(source.entries, &self.cancel, move |batch: Vec<Entry>, _| async move {
                let results = match kind {
                    BulkActionKind::Publish => operations.bulk_publish(&batch).await,
                    BulkActionKind::Unpublish => operations.bulk_unpublish(&batch).await,
                };
                for _ in &results {
                    progress.increment();
                }
                Ok::<(), Error>(())
            })
            .await;
        self.finish(name, outcome)
    }

    fn finish(&self, name: &str, outcome: Result<BatchStats>) -> Result<OperationTrackResult> {
        self.progress.complete();
        let stats = outcome?;
        let result = self.tracker.get_result();
        info!(
            operation = name,
            batches = stats.batches,
            entries = stats.items,
            skipped = stats.skipped,
            successful = result.successful_entries,
            failed = result.failed_entries(),
            "run finished"
        );
        Ok(result)
    }
}
