//! Retry policy and concurrency ceiling for single remote calls
//!
//! Every remote call funnels through one [`ResiliencyExecutor`]. Its
//! semaphore is the backpressure point of the whole run: however many
//! entry operations are fanned out above it, at most `concurrency_limit`
//! calls reach the network at once.

use crate::config::{BackoffStrategy, Config, RetrySettings};
use crate::error::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Upper bound for server supplied retry hints
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Retry policy for transient failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Backoff between attempts
    pub strategy: BackoffStrategy,
    /// Retries after the first attempt
    pub retry_count: u32,
    /// Base delay
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

impl RetryPolicy {
    /// Build from configuration
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            strategy: settings.backoff_strategy,
            retry_count: settings.retry_count,
            base_delay: settings.base_delay(),
        }
    }

    /// Policy that never retries
    pub const fn no_retry() -> Self {
        Self {
            strategy: BackoffStrategy::None,
            retry_count: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (zero based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.strategy {
            BackoffStrategy::Exponential => self
                .base_delay
                .saturating_mul(2u32.saturating_pow(attempt)),
            BackoffStrategy::Fixed => self.base_delay,
            BackoffStrategy::None => Duration::ZERO,
        }
    }
}

/// Executes remote calls with retries under a shared concurrency limit
#[derive(Debug)]
pub struct ResiliencyExecutor {
    policy: RetryPolicy,
    semaphore: Arc<Semaphore>,
    concurrency_limit: usize,
}

impl ResiliencyExecutor {
    /// Create an executor allowing `concurrency_limit` calls in flight
    ///
    /// A limit of zero is raised to one.
    pub fn new(policy: RetryPolicy, concurrency_limit: usize) -> Self {
        let concurrency_limit = concurrency_limit.max(1);
        Self {
            policy,
            semaphore: Arc::new(Semaphore::new(concurrency_limit)),
            concurrency_limit,
        }
    }

    /// Build from configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            RetryPolicy::from_settings(&config.retry),
            config.concurrency.concurrency_limit,
        )
    }

    /// Retry policy in use
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Maximum calls in flight
    pub const fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Run `call`, retrying transient failures
    ///
    /// A permit is held for the duration of each attempt and released while
    /// backing off. Cancellation is honored while waiting for a permit,
    /// during the call and during backoff; a cancelled wait never invokes
    /// `call`. Non-transient errors are returned on first occurrence and the
    /// last error is returned once retries are exhausted.
    pub async fn execute<T, F, Fut>(&self, cancel: &CancellationToken, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            let outcome = {
                let _permit = tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(Error::Cancelled),
                    permit = self.semaphore.acquire() => permit
                        .map_err(|_| Error::Internal("request semaphore closed".to_string()))?,
                };
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(Error::Cancelled),
                    result = call() => result,
                }
            };

            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_transient() {
                debug!(error = %err, "non-transient failure, not retrying");
                return Err(err);
            }
            if attempt >= self.policy.retry_count {
                warn!(attempts = attempt + 1, error = %err, "retries exhausted");
                return Err(err);
            }

            let hinted = err.retry_after().unwrap_or_default().min(MAX_RETRY_AFTER);
            let delay = self.policy.delay_for(attempt).max(hinted);
            attempt += 1;
            warn!(
                attempt,
                max_retries = self.policy.retry_count,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "transient failure, retrying"
            );

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
        }
    }
}
