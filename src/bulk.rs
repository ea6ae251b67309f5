//! Bulk action client
//!
//! Bulk publish and unpublish are asynchronous on the server: the action is
//! submitted, then polled until it reaches a terminal status. The outcome
//! applies to every item of the action, so a failure is reported once per
//! item, all sharing the same error.

use crate::api::ManagementApi;
use crate::config::BulkSettings;
use crate::error::{Error, Result};
use crate::types::{
    BulkAction, BulkActionKind, BulkActionRequest, BulkActionStatus, Entry, OperationResult,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Submits bulk actions and waits for them to finish
pub struct BulkActionClient {
    api: Arc<dyn ManagementApi>,
    poll_interval: Duration,
    timeout: Duration,
    cancel: CancellationToken,
}

impl BulkActionClient {
    /// Create a client using the configured poll interval and deadline
    pub fn new(api: Arc<dyn ManagementApi>, settings: &BulkSettings, cancel: CancellationToken) -> Self {
        Self::with_timing(api, settings.poll_delay(), settings.timeout(), cancel)
    }

    /// Create a client with explicit timing
    pub fn with_timing(
        api: Arc<dyn ManagementApi>,
        poll_interval: Duration,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            api,
            poll_interval,
            timeout,
            cancel,
        }
    }

    /// Bulk-publish `entries` at their current versions
    pub async fn publish(&self, entries: &[Entry]) -> Vec<OperationResult> {
        self.run(BulkActionKind::Publish, entries).await
    }

    /// Bulk-unpublish `entries`
    pub async fn unpublish(&self, entries: &[Entry]) -> Vec<OperationResult> {
        self.run(BulkActionKind::Unpublish, entries).await
    }

    /// Submit a bulk action and wait for its terminal status
    ///
    /// Fails with [`Error::BulkActionTimeout`] when the action is still
    /// running once the deadline passes, and with [`Error::BulkActionFailed`]
    /// when the server reports failure.
    pub async fn execute(&self, kind: BulkActionKind, entries: &[Entry]) -> Result<BulkAction> {
        let request = BulkActionRequest::new(kind, entries);
        if request.is_empty() {
            return Err(Error::InvalidArgument(
                "bulk action needs at least one entry".to_string(),
            ));
        }

        let submitted = self.api.create_bulk_action(kind, &request).await?;
        let action_id = submitted.sys.id.clone();
        info!(%kind, action_id, items = request.len(), "bulk action submitted");

        let action = match tokio::time::timeout(self.timeout, self.poll(submitted)).await {
            Ok(polled) => polled?,
            Err(_) => {
                warn!(%kind, action_id, timeout = ?self.timeout, "bulk action timed out");
                return Err(Error::BulkActionTimeout {
                    action_id,
                    timeout: self.timeout,
                });
            }
        };

        match action.sys.status {
            BulkActionStatus::Succeeded => {
                info!(%kind, action_id, "bulk action succeeded");
                Ok(action)
            }
            status => {
                let (error_id, message) = match action.error {
                    Some(error) => (
                        Some(error.sys.id),
                        error.message.unwrap_or_else(|| format!("{status:?}")),
                    ),
                    None => (None, format!("{status:?} without error details")),
                };
                Err(Error::BulkActionFailed {
                    action_id,
                    error_id,
                    message,
                })
            }
        }
    }

    /// Poll one request at a time until the status is terminal
    async fn poll(&self, mut action: BulkAction) -> Result<BulkAction> {
        let mut polls: u32 = 0;
        while !action.sys.status.is_terminal() {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(Error::Cancelled),
                () = tokio::time::sleep(self.poll_interval) => {}
            }
            action = self.api.get_bulk_action(&action.sys.id).await?;
            polls += 1;
            debug!(action_id = action.sys.id, status = ?action.sys.status, polls, "polled bulk action");
        }
        Ok(action)
    }

    async fn run(&self, kind: BulkActionKind, entries: &[Entry]) -> Vec<OperationResult> {
        if entries.is_empty() {
            return Vec::new();
        }

        let operation = kind.operation();
        match self.execute(kind, entries).await {
            Ok(_) => entries
                .iter()
                .map(|entry| OperationResult::success(entry.id(), operation))
                .collect(),
            Err(e) => {
                warn!(%kind, items = entries.len(), error = %e, "bulk action did not succeed");
                let error = Arc::new(e);
                entries
                    .iter()
                    .map(|entry| {
                        OperationResult::shared_failure(entry.id(), operation, Arc::clone(&error))
                    })
                    .collect()
            }
        }
    }
}
