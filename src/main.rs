use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use skilldex::{
    Catalog, DiscoveryIndex, DuplicatePolicy, EntryRecord, LibraryRoot,
    Warning,
    analyzer::TaskAnalysis,
    catalog, error, index,
    install::InstallDecision,
    search::{self, SearchParams, SearchResult},
};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Command};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("SKILLDEX_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli) -> error::Result<()> {
    let root = cli.root;
    match cli.command {
        Command::BuildCatalog(args) => {
            let library =
                LibraryRoot::resolve(args.path.as_deref().or(root.as_deref()))?;
            let policy = if args.strict {
                DuplicatePolicy::Strict
            } else {
                DuplicatePolicy::LastWins
            };
            cmd_build_catalog(&library, policy)?;
        }
        Command::GenerateIndex(args) => {
            let library =
                LibraryRoot::resolve(args.path.as_deref().or(root.as_deref()))?;
            cmd_generate_index(&library)?;
        }
        Command::Search(args) => {
            let library = LibraryRoot::resolve(root.as_deref())?;
            cmd_search(&library, &args)?;
        }
        Command::Analyze(args) => {
            let library = LibraryRoot::resolve(root.as_deref())?;
            cmd_analyze(&library, &args)?;
        }
        Command::List(args) => {
            let library = LibraryRoot::resolve(root.as_deref())?;
            cmd_list(&library, &args)?;
        }
        Command::Status(args) => {
            let library = LibraryRoot::resolve(root.as_deref())?;
            cmd_status(&library, args.json)?;
        }
        Command::Completions(args) => {
            args.generate();
        }
    }

    Ok(())
}

fn report_warnings(warnings: &[Warning]) {
    for warning in warnings {
        eprintln!("Warning: {warning}");
    }
}

fn cmd_build_catalog(
    library: &LibraryRoot,
    policy: DuplicatePolicy,
) -> error::Result<()> {
    eprintln!("Scanning {}...", library.entries_dir().display());
    let report = catalog::build_catalog(library, policy)?;
    let path = library.catalog_path();
    let bytes = report.catalog.save(&path)?;

    println!("Catalog written to {} ({bytes} bytes)", path.display());
    println!("Processed: {}", report.discovered);
    println!("Indexed: {}", report.catalog.entries.len());
    println!("Skipped: {}", report.skipped);
    println!("Warnings: {}", report.warnings.len());
    println!("Categories: {}", report.catalog.categories.len());
    for (name, count) in report.category_counts() {
        println!("  {name}: {count}");
    }

    report_warnings(&report.warnings);
    Ok(())
}

fn cmd_generate_index(library: &LibraryRoot) -> error::Result<()> {
    let catalog_path = library.catalog_path();
    let catalog = Catalog::load(&catalog_path)?;
    let catalog_bytes = std::fs::metadata(&catalog_path)?.len();

    let index = index::compact(&catalog, Utc::now());
    let path = library.index_path();
    let index_bytes = index.save(&path)?;

    let reduction = if catalog_bytes == 0 {
        0.0
    } else {
        100.0 * (1.0 - index_bytes as f64 / catalog_bytes as f64)
    };

    println!("Index written to {}", path.display());
    println!("Entries: {}", index.total_entries);
    println!("Catalog size: {catalog_bytes} bytes");
    println!("Index size: {index_bytes} bytes");
    println!("Reduction: {reduction:.1}%");
    Ok(())
}

/// Load the discovery index, recording a warning when it is stale.
fn load_index_checked(
    library: &LibraryRoot,
    warnings: &mut Vec<Warning>,
) -> error::Result<DiscoveryIndex> {
    let index = DiscoveryIndex::load(&library.index_path())?;
    let catalog = library.catalog_path();
    warnings.extend(search::check_staleness(&index, &catalog)?);
    Ok(index)
}

fn cmd_search(
    library: &LibraryRoot,
    args: &cli::SearchArgs,
) -> error::Result<()> {
    let mut warnings = Vec::new();
    let index = load_index_checked(library, &mut warnings)?;
    let results = search::execute_search(&args.params(), &index);

    if args.json {
        search::format_json(&results, &args.query)?;
    } else {
        search::format_human(&results);
    }
    report_warnings(&warnings);
    Ok(())
}

#[derive(Serialize)]
struct AnalyzeReport<'a> {
    task: &'a str,
    #[serde(flatten)]
    analysis: &'a TaskAnalysis,
    discovery_ran: bool,
    results: &'a [SearchResult],
    install: Option<&'a InstallDecision>,
}

fn cmd_analyze(
    library: &LibraryRoot,
    args: &cli::AnalyzeArgs,
) -> error::Result<()> {
    let analysis = args.analysis();
    let discover = analysis.should_search && !args.no_discovery;

    let mut warnings = Vec::new();
    let results = if discover {
        match load_index_checked(library, &mut warnings) {
            Ok(index) => {
                search::execute_search(&SearchParams::new(&args.task), &index)
            }
            Err(e @ error::Error::MissingArtifact { .. }) => {
                warnings.push(Warning::DiscoverySkipped {
                    reason: e.to_string(),
                });
                Vec::new()
            }
            Err(e) => return Err(e),
        }
    } else {
        Vec::new()
    };

    let decision = results.first().map(|top| {
        args.policy().decide(
            &top.entry_name,
            analysis.complexity_score,
            top.relevance_score,
            args.ongoing,
            args.reusable,
        )
    });

    if args.json {
        let report = AnalyzeReport {
            task: &args.task,
            analysis: &analysis,
            discovery_ran: discover,
            results: &results,
            install: decision.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        report_warnings(&warnings);
        return Ok(());
    }

    println!("Task: {}", args.task);
    println!("Complexity: {:.2}", analysis.complexity_score);
    if analysis.domains.is_empty() {
        println!("Domains: none");
    } else {
        println!("Domains: {}", analysis.domains.join(", "));
    }
    println!(
        "Search: {} ({})",
        if analysis.should_search { "yes" } else { "no" },
        analysis.reason
    );

    if discover {
        println!();
        search::format_human(&results);
    }

    if let Some(decision) = &decision {
        println!();
        println!(
            "Install {}: {} ({})",
            decision.entry_name,
            if decision.should_install { "yes" } else { "no" },
            decision.reason
        );
    }
    report_warnings(&warnings);
    Ok(())
}

fn cmd_list(library: &LibraryRoot, args: &cli::ListArgs) -> error::Result<()> {
    let catalog = Catalog::load(&library.catalog_path())?;

    if args.categories {
        if args.json {
            let counts: std::collections::BTreeMap<&str, usize> = catalog
                .categories
                .iter()
                .map(|(name, entries)| (name.as_str(), entries.len()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&counts)?);
        } else {
            for (name, entries) in &catalog.categories {
                println!("{name} ({})", entries.len());
            }
        }
        return Ok(());
    }

    let needle = args.author.as_deref().map(str::to_lowercase);
    let entries: Vec<&EntryRecord> = catalog
        .entries
        .iter()
        .filter(|entry| match &needle {
            Some(needle) => entry
                .author
                .as_deref()
                .is_some_and(|a| a.to_lowercase().contains(needle.as_str())),
            None => true,
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        match &args.author {
            Some(author) => println!("No entries by author '{author}'."),
            None => println!("No entries in catalog."),
        }
        return Ok(());
    }

    let mut current: Option<&str> = None;
    for entry in &entries {
        if current != Some(entry.category.as_str()) {
            println!("{}:", entry.category);
            current = Some(entry.category.as_str());
        }
        println!("  {}", entry.name);
        if !entry.description.is_empty() {
            println!(
                "      {}",
                index::truncate_words(
                    &entry.description,
                    index::MAX_DESCRIPTION_WORDS
                )
            );
        }
    }
    println!("\n{} entries", entries.len());
    Ok(())
}

#[derive(Serialize)]
struct ArtifactStatus {
    present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    entries: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<chrono::DateTime<Utc>>,
}

#[derive(Serialize)]
struct Status {
    root: String,
    entries_dir: String,
    catalog: ArtifactStatus,
    index: ArtifactStatus,
    index_stale: bool,
}

/// Load an artifact, mapping "not built yet" to `None`.
fn load_optional<T>(loaded: error::Result<T>) -> error::Result<Option<T>> {
    match loaded {
        Ok(value) => Ok(Some(value)),
        Err(error::Error::MissingArtifact { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

fn cmd_status(library: &LibraryRoot, json: bool) -> error::Result<()> {
    let catalog = load_optional(Catalog::load(&library.catalog_path()))?;
    let index = load_optional(DiscoveryIndex::load(&library.index_path()))?;

    let index_stale = match (&catalog, &index) {
        (Some(c), Some(i)) => i.is_stale(c.updated_at),
        _ => false,
    };

    let status = Status {
        root: library.root().display().to_string(),
        entries_dir: library.entries_dir().display().to_string(),
        catalog: ArtifactStatus {
            present: catalog.is_some(),
            entries: catalog.as_ref().map(|c| c.entries.len()),
            updated_at: catalog.as_ref().map(|c| c.updated_at),
        },
        index: ArtifactStatus {
            present: index.is_some(),
            entries: index.as_ref().map(|i| i.total_entries),
            updated_at: index.as_ref().map(|i| i.updated_at),
        },
        index_stale,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Library root: {}", status.root);
    println!("Entry tree: {}", status.entries_dir);
    match &catalog {
        Some(c) => println!(
            "Catalog: {} entries in {} categories (updated {})",
            c.entries.len(),
            c.categories.len(),
            c.updated_at.to_rfc3339()
        ),
        None => println!("Catalog: not built"),
    }
    match &index {
        Some(i) => println!(
            "Index: {} entries (updated {}){}",
            i.total_entries,
            i.updated_at.to_rfc3339(),
            if index_stale { ", stale" } else { "" }
        ),
        None => println!("Index: not generated"),
    }
    Ok(())
}
