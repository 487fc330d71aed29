use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use skilldex::{analyzer, install, search};

#[derive(Debug, Parser)]
#[command(
    name = "skilldex",
    about = "Catalog, index and search a library of skill documents"
)]
pub struct Cli {
    /// Library root (the directory containing Skills/). Defaults to
    /// $SKILLDEX_ROOT, then the nearest ancestor with a Skills/ directory
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan the entry tree and write catalog.json
    BuildCatalog(BuildCatalogArgs),
    /// Compact catalog.json into skills-index.json
    GenerateIndex(GenerateIndexArgs),
    /// Rank entries against a free-text query
    Search(SearchArgs),
    /// Decide whether a task warrants discovery and installation
    Analyze(AnalyzeArgs),
    /// List catalog entries or categories
    List(ListArgs),
    /// Show library root, artifact state and counts
    Status(StatusArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Build --

#[derive(Debug, Parser)]
pub struct BuildCatalogArgs {
    /// Library root; takes precedence over --root
    pub path: Option<PathBuf>,

    /// Abort on duplicate entry names instead of keeping the last one
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Parser)]
pub struct GenerateIndexArgs {
    /// Library root; takes precedence over --root
    pub path: Option<PathBuf>,
}

// -- Search --

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// The search query
    pub query: String,

    /// Only entries with this tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Only entries in this category
    #[arg(long)]
    pub category: Option<String>,

    /// Minimum relevance score
    #[arg(long, default_value_t = search::DEFAULT_MIN_RELEVANCE)]
    pub min_relevance: f64,

    /// Return all results above the score threshold
    #[arg(long)]
    pub all: bool,

    /// Number of results to return
    #[arg(short = 'n', long, default_value_t = search::DEFAULT_TOP_K)]
    pub count: usize,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchArgs {
    pub fn params(&self) -> search::SearchParams {
        search::SearchParams {
            query: self.query.clone(),
            tag: self.tag.clone(),
            category: self.category.clone(),
            min_relevance: self.min_relevance,
            count: self.count,
            all: self.all,
        }
    }
}

// -- Analyze --

#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// Task description
    pub task: String,

    /// The task is part of an ongoing project
    #[arg(long)]
    pub ongoing: bool,

    /// The capability will be needed again
    #[arg(long)]
    pub reusable: bool,

    /// Analyze only; do not search the index
    #[arg(long)]
    pub no_discovery: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Complexity a task must exceed before installing
    #[arg(long, default_value_t = install::DEFAULT_COMPLEXITY_THRESHOLD)]
    pub complexity_threshold: f64,

    /// Relevance the top result must exceed before installing
    #[arg(long, default_value_t = install::DEFAULT_RELEVANCE_THRESHOLD)]
    pub relevance_threshold: f64,
}

impl AnalyzeArgs {
    pub fn policy(&self) -> install::InstallPolicy {
        install::InstallPolicy {
            complexity_threshold: self.complexity_threshold,
            relevance_threshold: self.relevance_threshold,
        }
    }

    pub fn analysis(&self) -> analyzer::TaskAnalysis {
        analyzer::analyze(&self.task, self.ongoing)
    }
}

// -- List --

#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Show categories with entry counts instead of entries
    #[arg(long)]
    pub categories: bool,

    /// Only entries whose author contains this text (case-insensitive)
    #[arg(long, conflicts_with = "categories")]
    pub author: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Status --

#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "skilldex",
            &mut std::io::stdout(),
        );
    }
}
