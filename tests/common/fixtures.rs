//! Entry fixtures

#![allow(dead_code)]

use chrono::Utc;
use cms_migrate::types::Entry;
use serde_json::json;

/// Draft entry at `version`
pub fn draft_entry(id: &str, version: u64) -> Entry {
    let mut entry = Entry::new(id, "blogPost");
    entry.sys.version = version;
    entry
        .fields
        .insert("title".to_string(), json!({ "en-US": format!("Post {id}") }));
    entry
}

/// Published entry at `version`
pub fn published_entry(id: &str, version: u64) -> Entry {
    let mut entry = draft_entry(id, version);
    entry.sys.published_version = Some(version.saturating_sub(1));
    entry.sys.published_at = Some(Utc::now());
    entry
}

/// Archived entry at `version`
pub fn archived_entry(id: &str, version: u64) -> Entry {
    let mut entry = draft_entry(id, version);
    entry.sys.archived_at = Some(Utc::now());
    entry
}

/// New entry without an id
pub fn new_entry(title: &str) -> Entry {
    let mut entry = Entry::new("", "blogPost");
    entry
        .fields
        .insert("title".to_string(), json!({ "en-US": title }));
    entry
}

/// `count` drafts with ids `entry-0`, `entry-1`, ... at version 1
pub fn draft_entries(count: usize) -> Vec<Entry> {
    (0..count)
        .map(|i| draft_entry(&format!("entry-{i}"), 1))
        .collect()
}
