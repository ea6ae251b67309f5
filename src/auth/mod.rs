//! Authentication for the management API
//!
//! Supports environment variables and the config file.

mod token;

pub use token::{ManagementAuthConfig, get_management_auth, resolve_management_auth, test_management_auth};

/// Source of authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token from environment variable
    EnvVar,
    /// Token from the config file
    ConfigFile,
}
