use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable that overrides root auto-detection.
pub const ROOT_ENV_VAR: &str = "SKILLDEX_ROOT";

/// Entry-tree directory names, checked in order.
const ENTRY_DIR_NAMES: &[&str] = &["Skills", "skills"];

const CATALOG_FILE: &str = "catalog.json";
const INDEX_FILE: &str = "skills-index.json";

#[derive(Debug, Clone)]
pub struct LibraryRoot {
    root: PathBuf,
    entries: PathBuf,
}

impl LibraryRoot {
    /// Resolve the library root from, in order of priority:
    /// 1. An explicit path (from --root or a positional argument)
    /// 2. The SKILLDEX_ROOT environment variable
    /// 3. The nearest ancestor of the current directory that contains a
    ///    `Skills/` (or `skills/`) directory
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let env = std::env::var_os(ROOT_ENV_VAR).map(PathBuf::from);
        let cwd = std::env::current_dir()?;
        Self::resolve_from(explicit, env.as_deref(), &cwd)
    }

    /// Same as [`LibraryRoot::resolve`] with the environment and the
    /// starting directory passed in.
    pub fn resolve_from(
        explicit: Option<&Path>,
        env: Option<&Path>,
        start: &Path,
    ) -> Result<Self> {
        if let Some(path) = explicit.or(env) {
            return Self::open(path);
        }

        for dir in start.ancestors() {
            if let Some(entries) = entry_dir(dir) {
                return Ok(Self {
                    root: dir.to_path_buf(),
                    entries,
                });
            }
        }

        Err(Error::MissingRoot {
            path: start.to_path_buf(),
        })
    }

    /// Open a specific directory as the library root.
    pub fn open(path: &Path) -> Result<Self> {
        match entry_dir(path) {
            Some(entries) => Ok(Self {
                root: path.to_path_buf(),
                entries,
            }),
            None => Err(Error::MissingRoot {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The entry tree scanned by the catalog builder.
    pub fn entries_dir(&self) -> &Path {
        &self.entries
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.root.join(CATALOG_FILE)
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }
}

fn entry_dir(dir: &Path) -> Option<PathBuf> {
    ENTRY_DIR_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_dir())
}
