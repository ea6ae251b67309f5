//! Error types for cms-migrate

use std::time::Duration;
use thiserror::Error;

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the orchestration engine and its remote-call surface
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or incomplete configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Missing or rejected credentials
    #[error("authentication error: {0}")]
    Auth(String),

    /// Invalid argument supplied by the caller
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Input could not be parsed
    #[error("parse error: {0}")]
    Parse(String),

    /// Management API answered with a non-success status
    #[error("management API error ({status}{}): {message}", error_id_suffix(.error_id.as_deref()))]
    Api {
        /// HTTP status code
        status: u16,
        /// Remote error identifier (e.g. `VersionMismatch`)
        error_id: Option<String>,
        /// Human readable message
        message: String,
    },

    /// Management API rejected the request because of its rate limit
    #[error("rate limited by management API")]
    RateLimited {
        /// Server supplied hint for when to retry
        retry_after: Option<Duration>,
    },

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A bulk action reached the remote `failed` status
    #[error("bulk action {action_id} failed: {}", bulk_failure_reason(.error_id.as_deref(), .message))]
    BulkActionFailed {
        /// Bulk action identifier
        action_id: String,
        /// Remote error identifier
        error_id: Option<String>,
        /// Remote error message
        message: String,
    },

    /// A bulk action did not reach a terminal status before the deadline
    #[error("bulk action {action_id} did not complete within {timeout:?}")]
    BulkActionTimeout {
        /// Bulk action identifier
        action_id: String,
        /// Deadline that elapsed
        timeout: Duration,
    },

    /// The run was cancelled
    #[error("operation cancelled")]
    Cancelled,

    /// Internal invariant violated
    #[error("internal error: {0}")]
    Internal(String),
}

fn error_id_suffix(error_id: Option<&str>) -> String {
    error_id
        .map(|id| format!(" {id}"))
        .unwrap_or_default()
}

fn bulk_failure_reason<'a>(error_id: Option<&'a str>, message: &'a str) -> &'a str {
    error_id.unwrap_or(message)
}

impl Error {
    /// Whether retrying the same call may succeed.
    ///
    /// Rate-limit rejections, 5xx responses and transport timeouts or
    /// connection failures are transient. Validation errors, not-found and
    /// version conflicts are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
            }
            _ => false,
        }
    }

    /// Whether this error is a cancellation rather than a failure
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Server supplied retry hint, if any
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}
