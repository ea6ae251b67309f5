//! Management token resolution

use crate::api::{HttpManagementApi, ManagementApi};
use crate::auth::AuthSource;
use crate::config::ApiSettings;
use crate::error::{Error, Result};
use tracing::debug;

/// Primary token environment variable
pub const ENV_MANAGEMENT_TOKEN: &str = "CMS_MANAGEMENT_TOKEN";
/// Fallback token environment variable
pub const ENV_CONTENTFUL_TOKEN: &str = "CONTENTFUL_MANAGEMENT_TOKEN";

/// Management API authentication configuration
#[derive(Clone)]
pub struct ManagementAuthConfig {
    /// Bearer token
    pub token: String,
    /// Where the token was obtained from
    pub source: AuthSource,
}

impl std::fmt::Debug for ManagementAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagementAuthConfig")
            .field("token", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Get management API authentication from the process environment
///
/// Priority:
/// 1. `CMS_MANAGEMENT_TOKEN` environment variable
/// 2. `CONTENTFUL_MANAGEMENT_TOKEN` environment variable
/// 3. `api.management_token` in the config file
pub fn get_management_auth(settings: &ApiSettings) -> Result<ManagementAuthConfig> {
    resolve_management_auth(settings, |key| std::env::var(key).ok())
}

/// Resolve authentication with an explicit environment lookup
pub fn resolve_management_auth(
    settings: &ApiSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ManagementAuthConfig> {
    for var in [ENV_MANAGEMENT_TOKEN, ENV_CONTENTFUL_TOKEN] {
        debug!(var, "checking token env var");
        if let Some(token) = lookup(var).map(|t| t.trim().to_string())
            && !token.is_empty()
        {
            debug!(var, "obtained management token from env var");
            return Ok(ManagementAuthConfig {
                token,
                source: AuthSource::EnvVar,
            });
        }
    }

    if let Some(token) = settings
        .management_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        debug!("obtained management token from config file");
        return Ok(ManagementAuthConfig {
            token: token.to_string(),
            source: AuthSource::ConfigFile,
        });
    }

    debug!("no management token found");
    Err(Error::Auth(format!(
        "No management token found. Set {ENV_MANAGEMENT_TOKEN} or api.management_token in the config file"
    )))
}

/// Test authentication by reading the configured space
///
/// Returns the space name.
pub async fn test_management_auth(
    config: &ManagementAuthConfig,
    settings: &ApiSettings,
) -> Result<String> {
    let api = HttpManagementApi::new(settings, &config.token)?;
    let space = api.get_space().await.map_err(|e| match e {
        Error::Api { status: 401 | 403, message, .. } => {
            Error::Auth(format!("Invalid token: {message}"))
        }
        other => other,
    })?;
    Ok(space.name)
}
