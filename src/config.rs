//! Configuration loading
//!
//! Settings come from a TOML file, then environment overrides, then CLI
//! flags (applied by the binary). Every section has defaults so an empty
//! file is valid once a space id is supplied.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default management API host
pub const DEFAULT_BASE_URL: &str = "https://api.contentful.com";

/// Largest item count the remote accepts in one bulk action
pub const MAX_BULK_ITEMS: usize = 200;

/// Largest accepted `retry.base_delay_seconds`
pub const MAX_BASE_DELAY_SECS: f64 = 3600.0;

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote API location
    pub api: ApiSettings,
    /// Retry policy
    pub retry: RetrySettings,
    /// Concurrency ceiling
    pub concurrency: ConcurrencySettings,
    /// Bulk action polling
    pub bulk: BulkSettings,
    /// Entries per batch
    pub batch_size: BatchSize,
}

/// Remote API location and credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the management API
    pub base_url: String,
    /// Space id
    pub space_id: String,
    /// Environment id
    pub environment_id: String,
    /// Management token (environment variables take precedence)
    pub management_token: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            space_id: String::new(),
            environment_id: "master".to_string(),
            management_token: None,
        }
    }
}

/// Backoff applied between retries of a transient failure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    /// `base_delay * 2^attempt`
    #[default]
    Exponential,
    /// Constant `base_delay`
    Fixed,
    /// Retry immediately
    None,
}

impl std::str::FromStr for BackoffStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "exponential" => Ok(Self::Exponential),
            "fixed" => Ok(Self::Fixed),
            "none" => Ok(Self::None),
            other => Err(Error::Config(format!(
                "unknown backoff strategy '{other}' (expected exponential, fixed or none)"
            ))),
        }
    }
}

/// Retry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Backoff strategy
    pub backoff_strategy: BackoffStrategy,
    /// Retries after the first attempt
    pub retry_count: u32,
    /// Base delay in seconds
    pub base_delay_seconds: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            backoff_strategy: BackoffStrategy::Exponential,
            retry_count: 3,
            base_delay_seconds: 1.0,
        }
    }
}

impl RetrySettings {
    /// Base delay as a [`Duration`], clamped to `0..=MAX_BASE_DELAY_SECS`
    pub fn base_delay(&self) -> Duration {
        let seconds = if self.base_delay_seconds.is_nan() {
            0.0
        } else {
            self.base_delay_seconds.clamp(0.0, MAX_BASE_DELAY_SECS)
        };
        Duration::try_from_secs_f64(seconds).unwrap_or_default()
    }
}

/// Concurrency settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencySettings {
    /// Maximum remote calls in flight
    pub concurrency_limit: usize,
}

impl Default for ConcurrencySettings {
    fn default() -> Self {
        Self {
            concurrency_limit: 6,
        }
    }
}

/// Bulk action polling settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkSettings {
    /// Delay between status checks, in milliseconds
    pub poll_delay_ms: u64,
    /// Deadline for a bulk action to finish, in seconds
    pub timeout_secs: u64,
}

impl Default for BulkSettings {
    fn default() -> Self {
        Self {
            poll_delay_ms: 100,
            timeout_secs: 300,
        }
    }
}

impl BulkSettings {
    /// Poll interval
    pub const fn poll_delay(&self) -> Duration {
        Duration::from_millis(self.poll_delay_ms)
    }

    /// Deadline
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Batch size wrapper so `batch_size = 50` reads naturally at the top level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchSize(pub usize);

impl Default for BatchSize {
    fn default() -> Self {
        Self(50)
    }
}

/// Environment variables that override file settings
pub const ENV_BASE_URL: &str = "CMS_BASE_URL";
/// Space id override
pub const ENV_SPACE_ID: &str = "CMS_SPACE_ID";
/// Environment id override
pub const ENV_ENVIRONMENT_ID: &str = "CMS_ENVIRONMENT_ID";
/// Concurrency limit override
pub const ENV_CONCURRENCY_LIMIT: &str = "CMS_CONCURRENCY_LIMIT";

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cms-migrate").join("config.toml"))
    }

    /// Load configuration from `path`, or the default location if it exists
    ///
    /// A missing default file yields defaults; a missing explicit file is an
    /// error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        };

        let mut config = match path {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        Self::from_toml(&text)
    }

    /// Parse TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(format!("invalid config: {e}")))
    }

    /// Apply environment overrides read through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.api.base_url = url;
        }
        if let Some(space) = lookup(ENV_SPACE_ID) {
            self.api.space_id = space;
        }
        if let Some(env) = lookup(ENV_ENVIRONMENT_ID) {
            self.api.environment_id = env;
        }
        if let Some(limit) = lookup(ENV_CONCURRENCY_LIMIT) {
            self.concurrency.concurrency_limit = limit.trim().parse().map_err(|_| {
                Error::Config(format!("{ENV_CONCURRENCY_LIMIT} must be a number, got '{limit}'"))
            })?;
        }
        Ok(())
    }

    /// Check the configuration is usable
    ///
    /// `bulk` enables the stricter batch size limit of bulk actions.
    pub fn validate(&self, bulk: bool) -> Result<()> {
        if self.api.space_id.trim().is_empty() {
            return Err(Error::Config(format!(
                "space id is not set (use --space, {ENV_SPACE_ID} or api.space_id)"
            )));
        }
        if self.api.environment_id.trim().is_empty() {
            return Err(Error::Config("environment id is empty".to_string()));
        }
        url::Url::parse(&self.api.base_url)
            .map_err(|e| Error::Config(format!("invalid base URL '{}': {e}", self.api.base_url)))?;
        if self.concurrency.concurrency_limit == 0 {
            return Err(Error::Config(
                "concurrency_limit must be at least 1".to_string(),
            ));
        }
        if self.batch_size.0 == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }
        if bulk && self.batch_size.0 > MAX_BULK_ITEMS {
            return Err(Error::Config(format!(
                "batch_size {} exceeds the bulk action limit of {MAX_BULK_ITEMS}",
                self.batch_size.0
            )));
        }
        let delay = self.retry.base_delay_seconds;
        if !(0.0..=MAX_BASE_DELAY_SECS).contains(&delay) {
            return Err(Error::Config(format!(
                "retry.base_delay_seconds must be between 0 and {MAX_BASE_DELAY_SECS}, got {delay}"
            )));
        }
        Ok(())
    }
}
