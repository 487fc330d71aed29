use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors. Any of these aborts the current command.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(
        "library root not found: {path} (expected a Skills/ or skills/ \
         directory; set SKILLDEX_ROOT or pass --root)"
    )]
    MissingRoot { path: PathBuf },

    #[error("duplicate entry name '{name}': {first} and {second}")]
    DuplicateName {
        name: String,
        first: String,
        second: String,
    },

    #[error("{kind} not found at {path}; run `skilldex {hint}` first")]
    MissingArtifact {
        kind: &'static str,
        path: PathBuf,
        hint: &'static str,
    },

    #[error("could not write {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Process exit code for this error, distinct per failure category.
    /// Strict-mode duplicates and unclassified I/O or JSON failures use 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Io(_) | Error::Json(_) | Error::DuplicateName { .. } => 1,
            Error::MissingRoot { .. } => 2,
            Error::Persist { .. } => 3,
            Error::MissingArtifact { .. } => 4,
        }
    }
}

/// Recoverable conditions, collected during a run and reported at the end.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Warning {
    #[error("skipped {path}: malformed metadata: {reason}")]
    MalformedMetadata { path: PathBuf, reason: String },

    #[error("skipped {path}: field '{field}' is not a plain value")]
    NonSerializableField { path: PathBuf, field: String },

    #[error("duplicate entry name '{name}': {replaced} replaced by {kept}")]
    DuplicateName {
        name: String,
        replaced: String,
        kept: String,
    },

    #[error(
        "discovery index is older than the catalog; \
         run `skilldex generate-index`"
    )]
    StaleIndex,

    #[error("discovery skipped: {reason}")]
    DiscoverySkipped { reason: String },
}
