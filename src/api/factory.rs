//! Management API factory
//!
//! Assembles the decorator chain once, at start-up.

use crate::api::{DryRunApi, HttpManagementApi, ManagementApi, ResilientApi};
use crate::auth::ManagementAuthConfig;
use crate::config::Config;
use crate::error::Result;
use crate::resilience::ResiliencyExecutor;
use crate::types::RuntimeContext;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Create the management API for a run
///
/// The live client is always wrapped by the resiliency layer. In dry-run
/// mode a [`DryRunApi`] sits on top, so reads still go through retries and
/// the concurrency limit while mutations are simulated.
pub fn create_management_api(
    config: &Config,
    auth: &ManagementAuthConfig,
    runtime: RuntimeContext,
    cancel: CancellationToken,
) -> Result<Arc<dyn ManagementApi>> {
    let http: Arc<dyn ManagementApi> = Arc::new(HttpManagementApi::new(&config.api, &auth.token)?);
    let executor = Arc::new(ResiliencyExecutor::from_config(config));
    debug!(
        concurrency_limit = executor.concurrency_limit(),
        retry_count = executor.policy().retry_count,
        dry_run = runtime.dry_run,
        "creating management API"
    );

    let resilient: Arc<dyn ManagementApi> = Arc::new(ResilientApi::new(http, executor, cancel));
    if runtime.dry_run {
        Ok(Arc::new(DryRunApi::new(resilient)))
    } else {
        Ok(resilient)
    }
}
