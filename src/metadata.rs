//! Front matter extraction for a single entry document.
//!
//! The header is YAML between two `---` lines at the top of `SKILL.md`.
//! It is parsed loosely into a [`serde_yaml::Value`] and then checked
//! against a fixed schema, so nothing downstream ever sees a dynamic map.
//! Scalars in string positions are normalized to plain strings (numbers,
//! booleans, tagged dates); anything that cannot be (a nested mapping where
//! a string is expected) rejects the whole record. A missing `name` falls
//! back to the entry directory name; `created`/`updated` are cut down to
//! `YYYY-MM-DD` when they parse as a date or timestamp.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_yaml::{Mapping, Value};

use crate::{catalog::EntryRecord, error::Warning, walker::DiscoveredFile};

/// Category for entries that sit directly under the entry root.
pub const UNCATEGORIZED: &str = "Uncategorized";

type Extracted<T> = std::result::Result<T, Warning>;

/// Parse one discovered document into an [`EntryRecord`].
///
/// `entries_dir_name` is the entry-root directory name (`Skills`), used to
/// build the library-relative `location`. Failures are returned as a
/// [`Warning`]; they never abort the caller's scan.
pub fn extract_entry(
    file: &DiscoveredFile,
    entries_dir_name: &str,
) -> Extracted<EntryRecord> {
    let display_path = Path::new(entries_dir_name).join(&file.relative_path);
    let malformed = |reason: String| Warning::MalformedMetadata {
        path: display_path.clone(),
        reason,
    };

    let dirs = file.dir_components();
    let category = match dirs.len() {
        0 => {
            return Err(malformed(
                "document sits directly in the entry root".into(),
            ));
        }
        1 => UNCATEGORIZED.to_string(),
        _ => dirs[0].clone(),
    };
    let location = std::iter::once(entries_dir_name.to_string())
        .chain(dirs)
        .collect::<Vec<_>>()
        .join("/");

    let content = std::fs::read_to_string(&file.absolute_path)
        .map_err(|e| malformed(format!("cannot read file: {e}")))?;

    parse_header(&content, &display_path, category, location)
}

/// Parse document text into a record. `category` and `location` come from
/// the document's path and are never taken from the header. The last
/// `location` segment names the entry when the header has no `name`.
pub fn parse_header(
    content: &str,
    path: &Path,
    category: String,
    location: String,
) -> Extracted<EntryRecord> {
    let malformed = |reason: String| Warning::MalformedMetadata {
        path: path.to_path_buf(),
        reason,
    };

    let header = split_front_matter(content)
        .ok_or_else(|| malformed("missing front matter".into()))?;

    let value: Value = serde_yaml::from_str(header)
        .map_err(|e| malformed(format!("invalid YAML: {e}")))?;
    let map = match value {
        Value::Mapping(map) => map,
        Value::Null => Mapping::new(),
        _ => return Err(malformed("header is not a key/value mapping".into())),
    };

    let fields = Fields {
        map: &map,
        path: path.to_path_buf(),
    };

    let name = match fields.string("name")? {
        Some(name) => name,
        None => location
            .rsplit('/')
            .next()
            .filter(|dir| !dir.is_empty())
            .map(String::from)
            .ok_or_else(|| malformed("missing required field 'name'".into()))?,
    };
    let description = fields.string("description")?.ok_or_else(|| {
        malformed("missing required field 'description'".into())
    })?;

    if let Ok(Some(declared)) = fields.string("category")
        && declared != category
    {
        tracing::debug!(
            path = %path.display(),
            declared = %declared,
            derived = %category,
            "ignoring header category, path wins"
        );
    }

    Ok(EntryRecord {
        name,
        description,
        version: fields.string("version")?,
        category,
        tags: crate::tokenize::dedup(fields.list("tags")?),
        dependencies: fields.list("dependencies")?,
        location,
        author: fields.string("author")?,
        compatibility: fields.string("compatibility")?,
        license: fields.string("license")?,
        created: fields.date("created")?,
        updated: fields.date("updated")?,
    })
}

/// Return the YAML between the leading `---` line and the next `---` line.
fn split_front_matter(content: &str) -> Option<&str> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != "---" {
        return None;
    }

    let start = first.len();
    let mut end = start;
    for line in lines {
        if line.trim_end() == "---" {
            return Some(&content[start..end]);
        }
        end += line.len();
    }
    None
}

struct Fields<'a> {
    map: &'a Mapping,
    path: PathBuf,
}

impl Fields<'_> {
    fn not_plain(&self, field: &str) -> Warning {
        Warning::NonSerializableField {
            path: self.path.clone(),
            field: field.to_string(),
        }
    }

    /// An optional string field. Empty strings count as absent.
    fn string(&self, key: &str) -> Extracted<Option<String>> {
        match self.map.get(key) {
            None => Ok(None),
            Some(value) => {
                scalar_string(value).ok_or_else(|| self.not_plain(key))
            }
        }
    }

    /// A string field holding a date. Dates and timestamps are reduced to
    /// `YYYY-MM-DD`; anything else is kept verbatim.
    fn date(&self, key: &str) -> Extracted<Option<String>> {
        Ok(self.string(key)?.map(|s| normalize_date(&s).unwrap_or(s)))
    }

    /// A list field: a sequence of scalars, or one comma-separated string.
    fn list(&self, key: &str) -> Extracted<Vec<String>> {
        let Some(value) = self.map.get(key) else {
            return Ok(Vec::new());
        };

        match untag(value) {
            Value::Sequence(items) => items
                .iter()
                .map(|item| {
                    scalar_string(item).ok_or_else(|| self.not_plain(key))
                })
                .filter_map(Result::transpose)
                .collect(),
            other => Ok(scalar_string(other)
                .ok_or_else(|| self.not_plain(key))?
                .map(|s| {
                    s.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default()),
        }
    }
}

fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

/// Normalize a scalar to a plain string. `None` in the outer option means
/// the value is not a scalar at all; `Some(None)` means null or empty.
fn scalar_string(value: &Value) -> Option<Option<String>> {
    match untag(value) {
        Value::Null => Some(None),
        Value::Bool(b) => Some(Some(b.to_string())),
        Value::Number(n) => Some(Some(n.to_string())),
        Value::String(s) => {
            let s = s.trim();
            Some((!s.is_empty()).then(|| s.to_string()))
        }
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

fn normalize_date(text: &str) -> Option<String> {
    if let Ok(date) = NaiveDate::parse_from_str(text, DATE_FORMAT) {
        return Some(date.format(DATE_FORMAT).to_string());
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.format(DATE_FORMAT).to_string());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|ts| ts.format(DATE_FORMAT).to_string())
}
