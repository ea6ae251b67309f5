//! Batch processor
//!
//! Turns a stream of items into fixed-size batches and drives one async
//! action per batch. Only one batch is buffered at a time.

use crate::error::{Error, Result};
use futures::{Stream, StreamExt};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::debug;

type ItemFilter<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Counters for one batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Batch actions invoked
    pub batches: usize,
    /// Items handed to batch actions
    pub items: usize,
    /// Items rejected by the filter
    pub skipped: usize,
}

/// Chunks a stream into batches of at most `batch_size` items
pub struct BatchProcessor<T> {
    batch_size: usize,
    filter: Option<ItemFilter<T>>,
}

impl<T> BatchProcessor<T> {
    /// Create a processor; `batch_size` must be positive
    pub fn new(batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::InvalidArgument(
                "batch size must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            batch_size,
            filter: None,
        })
    }

    /// Only pass items for which `filter` returns true
    #[must_use]
    pub fn with_filter(mut self, filter: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Batch size
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Consume `source`, invoking `action` once per batch
    ///
    /// A source error or an error returned by `action` stops the run and is
    /// returned as is; failed batches are not retried. Cancellation is
    /// observed while waiting for items and before each batch.
    pub async fn run<S, F, Fut>(
        &self,
        source: S,
        cancel: &CancellationToken,
        mut action: F,
    ) -> Result<BatchStats>
    where
        S: Stream<Item = Result<T>>,
        F: FnMut(Vec<T>, CancellationToken) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let mut source = std::pin::pin!(source);
        let mut stats = BatchStats::default();
        let mut batch = Vec::with_capacity(self.batch_size);

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                next = source.next() => next,
            };
            let Some(item) = next else { break };
            let item = item?;

            if let Some(filter) = &self.filter
                && !filter(&item)
            {
                stats.skipped += 1;
                continue;
            }

            batch.push(item);
            if batch.len() == self.batch_size {
                let full = std::mem::replace(&mut batch, Vec::with_capacity(self.batch_size));
                Self::dispatch(full, cancel, &mut action, &mut stats).await?;
            }
        }

        if !batch.is_empty() {
            Self::dispatch(batch, cancel, &mut action, &mut stats).await?;
        }
        debug!(
            batches = stats.batches,
            items = stats.items,
            skipped = stats.skipped,
            "batch run finished"
        );
        Ok(stats)
    }

    async fn dispatch<F, Fut>(
        batch: Vec<T>,
        cancel: &CancellationToken,
        action: &mut F,
        stats: &mut BatchStats,
    ) -> Result<()>
    where
        F: FnMut(Vec<T>, CancellationToken) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        stats.batches += 1;
        stats.items += batch.len();
        debug!(batch = stats.batches, size = batch.len(), "dispatching batch");
        action(batch, cancel.clone()).await
    }
}
