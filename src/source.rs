//! Entry sources
//!
//! Producers of the entry streams the pipeline consumes: paged reads from
//! the management API and entry files exported from a space.

use crate::api::ManagementApi;
use crate::error::{Error, Result};
use crate::types::{Entry, EntryQuery};
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Entries requested per page
pub const PAGE_SIZE: u64 = 100;

/// A stream of entries with its expected length
pub struct EntrySource {
    /// Number of entries the stream is expected to yield
    pub total: u64,
    /// The entries
    pub entries: BoxStream<'static, Result<Entry>>,
}

impl EntrySource {
    /// Source over entries already in memory
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self {
            total: entries.len() as u64,
            entries: stream::iter(entries.into_iter().map(Ok::<Entry, Error>)).boxed(),
        }
    }

    /// Drain the stream into memory
    ///
    /// Needed when the run removes entries from the listing it pages
    /// through, which would otherwise shift later pages.
    pub async fn buffered(self) -> Result<Self> {
        let entries: Vec<Entry> = self.entries.try_collect().await?;
        Ok(Self::from_entries(entries))
    }
}

struct PageCursor {
    api: Arc<dyn ManagementApi>,
    content_type: Option<String>,
    skip: u64,
    total: u64,
    first: Option<Vec<Entry>>,
}

/// Page through the entries of the environment
///
/// The first page is read eagerly to learn the total; later pages are read
/// as the stream is consumed.
pub async fn fetch_entries(
    api: Arc<dyn ManagementApi>,
    content_type: Option<String>,
) -> Result<EntrySource> {
    let first = api
        .get_entries(&EntryQuery {
            content_type: content_type.clone(),
            skip: 0,
            limit: PAGE_SIZE,
        })
        .await?;
    let total = first.total;
    debug!(total, content_type = content_type.as_deref(), "listing entries");

    let cursor = PageCursor {
        api,
        content_type,
        skip: 0,
        total,
        first: Some(first.items),
    };

    let pages = stream::try_unfold(cursor, |mut cursor| async move {
        let page = match cursor.first.take() {
            Some(page) => page,
            None if cursor.skip >= cursor.total => return Ok(None),
            None => {
                let query = EntryQuery {
                    content_type: cursor.content_type.clone(),
                    skip: cursor.skip,
                    limit: PAGE_SIZE,
                };
                debug!(skip = query.skip, "fetching entry page");
                cursor.api.get_entries(&query).await?.items
            }
        };
        if page.is_empty() {
            return Ok(None);
        }
        cursor.skip += page.len() as u64;
        Ok::<_, Error>(Some((page, cursor)))
    });

    Ok(EntrySource {
        total,
        entries: pages
            .map_ok(|page| stream::iter(page.into_iter().map(Ok::<Entry, Error>)))
            .try_flatten()
            .boxed(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EntriesFile {
    List(Vec<Entry>),
    Export { items: Vec<Entry> },
}

/// Read entries from a JSON file
///
/// Accepts either a plain array of entries or a collection object with an
/// `items` array.
pub fn load_entries_file(path: &Path) -> Result<EntrySource> {
    let text = std::fs::read_to_string(path)?;
    let parsed: EntriesFile = serde_json::from_str(&text)
        .map_err(|e| Error::Parse(format!("{}: {e}", path.display())))?;
    let entries = match parsed {
        EntriesFile::List(items) | EntriesFile::Export { items } => items,
    };
    debug!(path = %path.display(), count = entries.len(), "loaded entries file");
    Ok(EntrySource::from_entries(entries))
}
