//! Live management API client

use crate::api::ManagementApi;
use crate::config::ApiSettings;
use crate::error::{Error, Result};
use crate::types::{
    BulkAction, BulkActionKind, BulkActionRequest, Collection, ContentType, Entry, EntryQuery,
    Locale, Space,
};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use urlencoding::encode;

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Media type of management API bodies
const MANAGEMENT_MEDIA_TYPE: &str = "application/vnd.contentful.management.v1+json";

/// Optimistic-concurrency header
const VERSION_HEADER: &str = "X-Contentful-Version";

/// Content type header for new entries
const CONTENT_TYPE_ID_HEADER: &str = "X-Contentful-Content-Type";

/// Seconds until the rate limit window resets
const RATE_LIMIT_RESET_HEADER: &str = "X-Contentful-RateLimit-Reset";

/// Page size used for small collections (content types, locales)
const COLLECTION_LIMIT: u64 = 1000;

#[derive(Deserialize)]
struct ErrorBody {
    sys: ErrorSys,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct ErrorSys {
    id: String,
}

#[derive(Serialize)]
struct EntryPayload<'a> {
    fields: &'a serde_json::Map<String, serde_json::Value>,
}

/// Management API client using reqwest
pub struct HttpManagementApi {
    client: Client,
    token: String,
    base_url: String,
    space_id: String,
    environment_id: String,
}

impl HttpManagementApi {
    /// Create a client for the space environment in `settings`
    pub fn new(settings: &ApiSettings, token: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            token: token.to_string(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            space_id: settings.space_id.clone(),
            environment_id: settings.environment_id.clone(),
        })
    }

    fn space_url(&self) -> String {
        format!("{}/spaces/{}", self.base_url, encode(&self.space_id))
    }

    fn environment_url(&self, path: &str) -> String {
        format!(
            "{}/environments/{}{}",
            self.space_url(),
            encode(&self.environment_id),
            path
        )
    }

    fn entry_url(&self, entry_id: &str, suffix: &str) -> String {
        self.environment_url(&format!("/entries/{}{suffix}", encode(entry_id)))
    }

    /// Authenticated request; the media type is set before any JSON body so
    /// reqwest keeps it.
    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, MANAGEMENT_MEDIA_TYPE)
    }

    fn versioned(&self, method: Method, url: String, version: u64) -> RequestBuilder {
        self.request(method, url)
            .header(VERSION_HEADER, version.to_string())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        check_status(response).await
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        Ok(self.send(request).await?.json().await?)
    }
}

/// Map a non-success response to the error taxonomy
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = retry_after(response.headers());
        debug!(?retry_after, "rate limited");
        return Err(Error::RateLimited { retry_after });
    }

    let body = response.text().await.unwrap_or_default();
    let (error_id, message) = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => (
            Some(parsed.sys.id),
            parsed.message.unwrap_or_else(|| reason(status)),
        ),
        Err(_) if body.trim().is_empty() => (None, reason(status)),
        Err(_) => (None, body),
    };
    Err(Error::Api {
        status: status.as_u16(),
        error_id,
        message,
    })
}

fn reason(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("unknown error").to_string()
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    [RATE_LIMIT_RESET_HEADER, RETRY_AFTER.as_str()]
        .iter()
        .find_map(|name| headers.get(*name)?.to_str().ok()?.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
}

#[async_trait]
impl ManagementApi for HttpManagementApi {
    async fn get_space(&self) -> Result<Space> {
        debug!(space_id = %self.space_id, "reading space");
        self.send_json(self.request(Method::GET, self.space_url())).await
    }

    async fn get_content_types(&self) -> Result<Vec<ContentType>> {
        debug!("listing content types");
        let collection: Collection<ContentType> = self
            .send_json(
                self.request(Method::GET, self.environment_url("/content_types"))
                    .query(&[("limit", COLLECTION_LIMIT)]),
            )
            .await?;
        Ok(collection.items)
    }

    async fn get_locales(&self) -> Result<Vec<Locale>> {
        debug!("listing locales");
        let collection: Collection<Locale> = self
            .send_json(self.request(Method::GET, self.environment_url("/locales")))
            .await?;
        Ok(collection.items)
    }

    async fn get_entries(&self, query: &EntryQuery) -> Result<Collection<Entry>> {
        debug!(skip = query.skip, limit = query.limit, content_type = ?query.content_type, "listing entries");
        let mut params = vec![
            ("skip", query.skip.to_string()),
            ("limit", query.limit.to_string()),
            ("order", "sys.createdAt".to_string()),
        ];
        if let Some(ref content_type) = query.content_type {
            params.push(("content_type", content_type.clone()));
        }
        let collection: Collection<Entry> = self
            .send_json(self.request(Method::GET, self.environment_url("/entries")).query(&params))
            .await?;
        debug!(count = collection.items.len(), total = collection.total, "listed entries");
        Ok(collection)
    }

    async fn get_entry(&self, entry_id: &str) -> Result<Entry> {
        debug!(entry_id, "reading entry");
        self.send_json(self.request(Method::GET, self.entry_url(entry_id, "")))
            .await
    }

    async fn create_or_update_entry(&self, entry: &Entry, version: u64) -> Result<Entry> {
        let payload = EntryPayload {
            fields: &entry.fields,
        };

        let mut request = if entry.id().is_empty() {
            debug!(content_type = ?entry.content_type_id(), "creating entry");
            self.request(Method::POST, self.environment_url("/entries"))
        } else {
            debug!(entry_id = entry.id(), version, "creating or updating entry");
            let url = self.entry_url(entry.id(), "");
            if version > 0 {
                self.versioned(Method::PUT, url, version)
            } else {
                self.request(Method::PUT, url)
            }
        };
        if let Some(content_type) = entry.content_type_id() {
            request = request.header(CONTENT_TYPE_ID_HEADER, content_type);
        }

        let result: Entry = self.send_json(request.json(&payload)).await?;
        debug!(entry_id = result.id(), version = result.version(), "saved entry");
        Ok(result)
    }

    async fn publish_entry(&self, entry_id: &str, version: u64) -> Result<Entry> {
        debug!(entry_id, version, "publishing entry");
        let request = self.versioned(Method::PUT, self.entry_url(entry_id, "/published"), version);
        self.send_json(request).await
    }

    async fn unpublish_entry(&self, entry_id: &str, version: u64) -> Result<Entry> {
        debug!(entry_id, version, "unpublishing entry");
        let request = self.versioned(Method::DELETE, self.entry_url(entry_id, "/published"), version);
        self.send_json(request).await
    }

    async fn archive_entry(&self, entry_id: &str, version: u64) -> Result<Entry> {
        debug!(entry_id, version, "archiving entry");
        let request = self.versioned(Method::PUT, self.entry_url(entry_id, "/archived"), version);
        self.send_json(request).await
    }

    async fn unarchive_entry(&self, entry_id: &str, version: u64) -> Result<Entry> {
        debug!(entry_id, version, "unarchiving entry");
        let request = self.versioned(Method::DELETE, self.entry_url(entry_id, "/archived"), version);
        self.send_json(request).await
    }

    async fn delete_entry(&self, entry_id: &str, version: u64) -> Result<()> {
        debug!(entry_id, version, "deleting entry");
        let request = self.versioned(Method::DELETE, self.entry_url(entry_id, ""), version);
        self.send(request).await?;
        Ok(())
    }

    async fn create_bulk_action(
        &self,
        kind: BulkActionKind,
        request: &BulkActionRequest,
    ) -> Result<BulkAction> {
        debug!(%kind, items = request.len(), "submitting bulk action");
        let url = self.environment_url(&format!("/bulk_actions/{}", kind.path_segment()));
        let action: BulkAction = self.send_json(self.request(Method::POST, url).json(request)).await?;
        debug!(action_id = %action.sys.id, status = ?action.sys.status, "submitted bulk action");
        Ok(action)
    }

    async fn get_bulk_action(&self, action_id: &str) -> Result<BulkAction> {
        let url = self.environment_url(&format!("/bulk_actions/actions/{}", encode(action_id)));
        self.send_json(self.request(Method::GET, url)).await
    }
}
