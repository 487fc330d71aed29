//! The discovery index: a compact projection of the catalog that the search
//! engine loads instead of the full catalog.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    artifact,
    catalog::{Catalog, EntryRecord},
    error::Result,
    tokenize,
};

/// Format version written into `skills-index.json`.
pub const INDEX_VERSION: &str = "1.0.0";

/// Descriptions are cut to this many words.
pub const MAX_DESCRIPTION_WORDS: usize = 12;

/// At most this many tags are kept per entry.
pub const MAX_TAGS: usize = 5;

/// At most this many keywords are kept per entry.
pub const MAX_KEYWORDS: usize = 10;

const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryIndexEntry {
    pub name: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryIndex {
    pub version: String,
    pub updated_at: DateTime<Utc>,
    pub total_entries: usize,
    pub entries: Vec<DiscoveryIndexEntry>,
}

impl DiscoveryIndex {
    pub fn load(path: &Path) -> Result<Self> {
        artifact::read_json(path, "discovery index", "generate-index")
    }

    /// Overwrite `path` atomically. Returns the serialized size in bytes.
    pub fn save(&self, path: &Path) -> Result<u64> {
        artifact::write_json_atomic(path, self, false)
    }

    /// True when the catalog was rebuilt after this index was generated.
    pub fn is_stale(&self, catalog_updated_at: DateTime<Utc>) -> bool {
        self.updated_at < catalog_updated_at
    }
}

/// Project every catalog entry into the discovery index.
pub fn compact(catalog: &Catalog, updated_at: DateTime<Utc>) -> DiscoveryIndex {
    let entries: Vec<_> = catalog.entries.iter().map(compact_entry).collect();
    DiscoveryIndex {
        version: INDEX_VERSION.to_string(),
        updated_at,
        total_entries: entries.len(),
        entries,
    }
}

pub fn compact_entry(record: &EntryRecord) -> DiscoveryIndexEntry {
    DiscoveryIndexEntry {
        name: record.name.clone(),
        description: truncate_words(&record.description, MAX_DESCRIPTION_WORDS),
        category: record.category.clone(),
        tags: record.tags.iter().take(MAX_TAGS).cloned().collect(),
        keywords: extract_keywords(&record.tags, &record.description),
    }
}

/// Keep the first `max_words` whitespace-separated words, marking the cut.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return words.join(" ");
    }
    let mut out = words[..max_words].join(" ");
    out.push_str(ELLIPSIS);
    out
}

/// Keyword tokens from all tags, then the description, deduplicated in
/// first-seen order and capped at [`MAX_KEYWORDS`].
pub fn extract_keywords(tags: &[String], description: &str) -> Vec<String> {
    let tokens = tags
        .iter()
        .flat_map(|tag| tokenize::keyword_tokens(tag))
        .chain(tokenize::keyword_tokens(description));
    let mut keywords = tokenize::dedup(tokens);
    keywords.truncate(MAX_KEYWORDS);
    keywords
}
