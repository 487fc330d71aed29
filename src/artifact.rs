use std::{io::Write, path::Path};

use serde::{Serialize, de::DeserializeOwned};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Serialize `value` as JSON and replace `path` atomically.
///
/// The data is written to a temporary file in the destination directory,
/// synced, then renamed over `path`. Readers see either the previous file
/// or the complete new one. Returns the number of bytes written.
pub fn write_json_atomic<T: Serialize>(
    path: &Path,
    value: &T,
    pretty: bool,
) -> Result<u64> {
    let mut contents = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };
    contents.push(b'\n');

    let persist_err = |source: std::io::Error| Error::Persist {
        path: path.to_path_buf(),
        source,
    };

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(parent).map_err(persist_err)?;
    tmp.write_all(&contents).map_err(persist_err)?;
    tmp.as_file().sync_all().map_err(persist_err)?;
    tmp.persist(path).map_err(|e| persist_err(e.error))?;

    Ok(contents.len() as u64)
}

/// Load a JSON artifact. A missing file is reported as
/// [`Error::MissingArtifact`] with a hint naming the command that creates it.
pub fn read_json<T: DeserializeOwned>(
    path: &Path,
    kind: &'static str,
    hint: &'static str,
) -> Result<T> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::MissingArtifact {
                kind,
                path: path.to_path_buf(),
                hint,
            });
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_slice(&bytes)?)
}
