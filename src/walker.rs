use std::path::{Path, PathBuf};

use crate::error::Result;

/// File name that marks a directory as an entry.
pub const ENTRY_FILE_NAME: &str = "SKILL.md";

/// A discovered entry document.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Path of the document relative to the entry root.
    pub relative_path: PathBuf,
    /// Fully resolved absolute path.
    pub absolute_path: PathBuf,
}

impl DiscoveredFile {
    /// Directory components between the entry root and the document.
    pub fn dir_components(&self) -> Vec<String> {
        self.relative_path
            .parent()
            .map(|dir| {
                dir.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Recursively walk the entry root and collect every `SKILL.md`.
///
/// Matching is on the exact file name, so sibling markdown files are
/// ignored. Hidden files and directories (names starting with `.`) are
/// skipped. Results are sorted by relative path.
pub fn discover_entries(root: &Path) -> Result<Vec<DiscoveredFile>> {
    let canonical_root = root.canonicalize()?;
    let mut results = Vec::new();
    walk_dir(&canonical_root, &canonical_root, &mut results)?;
    results.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(results)
}

fn walk_dir(
    root: &Path,
    current: &Path,
    results: &mut Vec<DiscoveredFile>,
) -> Result<()> {
    for entry in std::fs::read_dir(current)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        if name.starts_with('.') {
            continue;
        }

        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            walk_dir(root, &entry.path(), results)?;
        } else if file_type.is_symlink() {
            let resolved = match entry.path().canonicalize() {
                Ok(p) => p,
                Err(_) => continue,
            };
            // Symlinked directories are not followed (cycle prevention).
            if resolved.is_file() && name == ENTRY_FILE_NAME {
                results.push(make_discovered(root, &entry.path(), resolved));
            }
        } else if file_type.is_file() && name == ENTRY_FILE_NAME {
            let abs = entry.path().canonicalize()?;
            results.push(make_discovered(root, &entry.path(), abs));
        }
    }

    Ok(())
}

fn make_discovered(
    root: &Path,
    original_path: &Path,
    absolute_path: PathBuf,
) -> DiscoveredFile {
    let relative_path = original_path
        .strip_prefix(root)
        .unwrap_or(original_path)
        .to_path_buf();

    DiscoveredFile {
        relative_path,
        absolute_path,
    }
}
