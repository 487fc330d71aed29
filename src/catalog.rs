use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    artifact,
    error::{Error, Result, Warning},
    library_root::LibraryRoot,
    metadata,
    walker::{self, ENTRY_FILE_NAME},
};

/// Format version written into `catalog.json`.
pub const CATALOG_VERSION: &str = "1.0.0";

/// One indexed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// First directory under the entry root. Never read from the header.
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Entry directory relative to the library root, `/`-separated.
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatibility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
}

impl EntryRecord {
    /// Absolute path of the document this record was extracted from.
    pub fn document_path(&self, library_root: &Path) -> PathBuf {
        self.location
            .split('/')
            .fold(library_root.to_path_buf(), |p, part| p.join(part))
            .join(ENTRY_FILE_NAME)
    }
}

/// The full aggregated record of all entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub version: String,
    pub updated_at: DateTime<Utc>,
    pub entries: Vec<EntryRecord>,
    pub categories: BTreeMap<String, Vec<String>>,
}

impl Catalog {
    /// Assemble a catalog. Entries are sorted by `(category, name)` and the
    /// category map is derived from them.
    pub fn new(
        mut entries: Vec<EntryRecord>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        entries.sort_by(|a, b| {
            (&a.category, &a.name).cmp(&(&b.category, &b.name))
        });
        let categories = derive_categories(&entries);
        Self {
            version: CATALOG_VERSION.to_string(),
            updated_at,
            entries,
            categories,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        artifact::read_json(path, "catalog", "build-catalog")
    }

    /// Write atomically. Returns the serialized size in bytes.
    pub fn save(&self, path: &Path) -> Result<u64> {
        artifact::write_json_atomic(path, self, true)
    }
}

/// Group entry names by category, in entry order.
pub fn derive_categories(
    entries: &[EntryRecord],
) -> BTreeMap<String, Vec<String>> {
    let mut categories: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entry in entries {
        categories
            .entry(entry.category.clone())
            .or_default()
            .push(entry.name.clone());
    }
    categories
}

/// How duplicate entry names are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Keep the later entry and record a warning.
    #[default]
    LastWins,
    /// Abort the build.
    Strict,
}

/// Outcome of a catalog build.
#[derive(Debug)]
pub struct BuildReport {
    pub catalog: Catalog,
    /// Number of entry documents found on disk.
    pub discovered: usize,
    /// Documents that produced no record.
    pub skipped: usize,
    pub warnings: Vec<Warning>,
}

impl BuildReport {
    /// Entry count per category.
    pub fn category_counts(&self) -> Vec<(&str, usize)> {
        self.catalog
            .categories
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.len()))
            .collect()
    }
}

/// Scan the entry tree and assemble a catalog in memory.
///
/// Per-document failures become warnings. Duplicate names either replace
/// the earlier record with a warning or, under
/// [`DuplicatePolicy::Strict`], abort with [`Error::DuplicateName`].
pub fn build_catalog(
    library: &LibraryRoot,
    policy: DuplicatePolicy,
) -> Result<BuildReport> {
    let entries_dir = library.entries_dir();
    let entries_dir_name = entries_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Skills".to_string());

    let files = walker::discover_entries(entries_dir)?;
    tracing::info!(
        root = %entries_dir.display(),
        count = files.len(),
        "discovered entry documents"
    );

    let mut warnings = Vec::new();
    let mut records: Vec<EntryRecord> = Vec::with_capacity(files.len());
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for file in &files {
        let record = match metadata::extract_entry(file, &entries_dir_name) {
            Ok(record) => record,
            Err(warning) => {
                tracing::debug!("{warning}");
                warnings.push(warning);
                continue;
            }
        };

        match by_name.get(&record.name) {
            Some(&idx) => {
                let previous = &records[idx];
                if policy == DuplicatePolicy::Strict {
                    return Err(Error::DuplicateName {
                        name: record.name,
                        first: previous.location.clone(),
                        second: record.location,
                    });
                }
                let warning = Warning::DuplicateName {
                    name: record.name.clone(),
                    replaced: previous.location.clone(),
                    kept: record.location.clone(),
                };
                tracing::debug!("{warning}");
                warnings.push(warning);
                records[idx] = record;
            }
            None => {
                by_name.insert(record.name.clone(), records.len());
                records.push(record);
            }
        }
    }

    let skipped = files.len() - by_name.len();
    let catalog = Catalog::new(records, Utc::now());

    Ok(BuildReport {
        catalog,
        discovered: files.len(),
        skipped,
        warnings,
    })
}
