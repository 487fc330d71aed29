//! skilldex - catalog, compact index and relevance search for a library of
//! skill documents.
//!
//! A library is a directory containing a `Skills/` tree. Every `SKILL.md`
//! below it carries a YAML front-matter header; [`catalog::build_catalog`]
//! turns the tree into a [`Catalog`], [`index::compact`] shrinks that into
//! a [`DiscoveryIndex`], and [`search::execute_search`] ranks index entries
//! against a query. [`analyzer::analyze`] and [`InstallPolicy`] decide
//! whether a task should trigger discovery and installation at all.
//!
//! # Quick start
//!
//! ```no_run
//! use chrono::Utc;
//! use skilldex::{DuplicatePolicy, LibraryRoot, catalog, index};
//! use skilldex::search::{self, SearchParams};
//!
//! let library = LibraryRoot::resolve(None).unwrap();
//! let report = catalog::build_catalog(&library, DuplicatePolicy::LastWins)
//!     .unwrap();
//! report.catalog.save(&library.catalog_path()).unwrap();
//!
//! let index = index::compact(&report.catalog, Utc::now());
//! let results = search::execute_search(&SearchParams::new("docker"), &index);
//! for r in &results {
//!     println!("{} (score: {:.3})", r.entry_name, r.relevance_score);
//! }
//! ```

pub mod analyzer;
pub mod artifact;
pub mod catalog;
pub mod error;
pub mod index;
pub mod install;
pub mod library_root;
pub mod metadata;
pub mod search;
pub mod tokenize;
pub mod walker;

pub use catalog::{BuildReport, Catalog, DuplicatePolicy, EntryRecord};
pub use error::{Error, Result, Warning};
pub use index::{DiscoveryIndex, DiscoveryIndexEntry};
pub use install::{InstallDecision, InstallPolicy};
pub use library_root::LibraryRoot;
