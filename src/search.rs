use std::{collections::HashSet, path::Path};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, Warning},
    index::{DiscoveryIndex, DiscoveryIndexEntry},
    tokenize,
};

/// Results returned when the caller does not ask for everything.
pub const DEFAULT_TOP_K: usize = 5;

/// Default minimum relevance. Zero keeps every entry with any signal.
pub const DEFAULT_MIN_RELEVANCE: f64 = 0.0;

/// Tier bands. A tag match always outranks a keyword-only match, which
/// always outranks a description-substring-only match.
pub const TAG_TIER_FLOOR: f64 = 0.6;
pub const KEYWORD_TIER_FLOOR: f64 = 0.3;
const TAG_TIER_SPAN: f64 = 1.0 - TAG_TIER_FLOOR;
const KEYWORD_TIER_SPAN: f64 = TAG_TIER_FLOOR - KEYWORD_TIER_FLOOR;
const SUBSTRING_TIER_SPAN: f64 = KEYWORD_TIER_FLOOR;

/// Weight of lower-tier signals inside a tier. Kept below one so that one
/// more primary match always beats any amount of secondary signal.
const SECONDARY_WEIGHT: f64 = 0.5;

/// Split of the secondary signal in the tag tier.
const TAG_TIER_KEYWORD_SHARE: f64 = 0.75;
const TAG_TIER_SUBSTRING_SHARE: f64 = 0.25;

#[derive(Debug, Clone)]
pub struct SearchParams {
    pub query: String,
    /// Only entries carrying this tag (case-insensitive).
    pub tag: Option<String>,
    /// Only entries in this category (case-insensitive).
    pub category: Option<String>,
    pub min_relevance: f64,
    pub count: usize,
    /// Ignore `count` and return everything above the threshold.
    pub all: bool,
}

impl SearchParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            tag: None,
            category: None,
            min_relevance: DEFAULT_MIN_RELEVANCE,
            count: DEFAULT_TOP_K,
            all: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub rank: usize,
    pub entry_name: String,
    pub relevance_score: f64,
    pub category: String,
    pub description: String,
}

/// Per-entry match signals for one query.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Signals {
    /// Query terms (plus the tag filter) equal to one of the entry's tags,
    /// or part of a multi-word tag spelled out in the query.
    pub tag_hits: usize,
    pub tag_terms: usize,
    /// Query terms present in the entry's keywords.
    pub keyword_hits: usize,
    /// Query terms found inside the description.
    pub substring_hits: usize,
    pub query_terms: usize,
}

impl Signals {
    /// Combine the three tiers into a score in `[0, 1]`.
    pub fn score(&self) -> f64 {
        let keyword = ratio(self.keyword_hits, self.query_terms);
        let substring = ratio(self.substring_hits, self.query_terms);

        if self.tag_hits > 0 {
            let secondary = TAG_TIER_KEYWORD_SHARE * keyword
                + TAG_TIER_SUBSTRING_SHARE * substring;
            TAG_TIER_FLOOR
                + TAG_TIER_SPAN
                    * primary(self.tag_hits, self.tag_terms, secondary)
        } else if self.keyword_hits > 0 {
            KEYWORD_TIER_FLOOR
                + KEYWORD_TIER_SPAN
                    * primary(self.keyword_hits, self.query_terms, substring)
        } else {
            SUBSTRING_TIER_SPAN * substring
        }
    }
}

fn ratio(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

/// `(hits + w * secondary) / (total + w)`: strictly increasing in `hits`
/// regardless of `secondary`, and exactly 1 at a full match.
fn primary(hits: usize, total: usize, secondary: f64) -> f64 {
    (hits as f64 + SECONDARY_WEIGHT * secondary)
        / (total as f64 + SECONDARY_WEIGHT)
}

/// Query terms after tokenization, shared across all entries.
struct PreparedQuery {
    /// Every query word, stop words included, for multi-word tag runs.
    words: Vec<String>,
    terms: Vec<String>,
    tag_terms: Vec<String>,
    tag_filter: Option<String>,
    category_filter: Option<String>,
}

impl PreparedQuery {
    fn new(params: &SearchParams) -> Self {
        let terms = tokenize::query_terms(&params.query);
        let tag_filter = params
            .tag
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());
        let tag_terms = tokenize::dedup(
            terms.iter().cloned().chain(tag_filter.iter().cloned()),
        );
        let category_filter = params
            .category
            .as_deref()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty());
        Self {
            words: tokenize::words(&params.query),
            terms,
            tag_terms,
            tag_filter,
            category_filter,
        }
    }

    fn passes_filters(&self, entry: &DiscoveryIndexEntry) -> bool {
        if let Some(category) = &self.category_filter
            && entry.category.to_lowercase() != *category
        {
            return false;
        }
        if let Some(tag) = &self.tag_filter
            && !entry.tags.iter().any(|t| t.to_lowercase() == *tag)
        {
            return false;
        }
        true
    }

    fn signals(&self, entry: &DiscoveryIndexEntry) -> Signals {
        let tags: HashSet<String> =
            entry.tags.iter().map(|t| t.trim().to_lowercase()).collect();
        // Query terms covered by a multi-word tag (`docker-compose`,
        // `ci/cd`) spelled out contiguously in the query.
        let covered: HashSet<String> = tags
            .iter()
            .map(|tag| tokenize::words(tag))
            .filter(|run| {
                run.len() > 1 && tokenize::contains_run(&self.words, run)
            })
            .flatten()
            .collect();
        let keywords: HashSet<&str> =
            entry.keywords.iter().map(String::as_str).collect();
        let description = entry.description.to_lowercase();

        Signals {
            tag_hits: self
                .tag_terms
                .iter()
                .filter(|t| {
                    tags.contains(t.as_str()) || covered.contains(t.as_str())
                })
                .count(),
            tag_terms: self.tag_terms.len(),
            keyword_hits: self
                .terms
                .iter()
                .filter(|t| keywords.contains(t.as_str()))
                .count(),
            substring_hits: self
                .terms
                .iter()
                .filter(|t| description.contains(t.as_str()))
                .count(),
            query_terms: self.terms.len(),
        }
    }
}

/// Score every entry once and return the ranked matches.
///
/// Entries failing the tag/category filters, entries with no signal at
/// all, and entries below `min_relevance` are dropped. Ties are broken by
/// name. An empty query without a tag filter matches nothing.
pub fn execute_search(
    params: &SearchParams,
    index: &DiscoveryIndex,
) -> Vec<SearchResult> {
    let query = PreparedQuery::new(params);
    if query.tag_terms.is_empty() {
        tracing::debug!("empty query, nothing to search for");
        return Vec::new();
    }

    let mut scored: Vec<(f64, &DiscoveryIndexEntry)> = index
        .entries
        .iter()
        .filter(|entry| query.passes_filters(entry))
        .map(|entry| (query.signals(entry).score(), entry))
        .filter(|(score, _)| *score > 0.0 && *score >= params.min_relevance)
        .collect();

    scored.sort_by(|(sa, a), (sb, b)| {
        sb.total_cmp(sa).then_with(|| a.name.cmp(&b.name))
    });

    let limit = if params.all { scored.len() } else { params.count };
    scored
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, (score, entry))| SearchResult {
            rank: i + 1,
            entry_name: entry.name.clone(),
            relevance_score: score,
            category: entry.category.clone(),
            description: entry.description.clone(),
        })
        .collect()
}

#[derive(Deserialize)]
struct CatalogStamp {
    updated_at: DateTime<Utc>,
}

/// Warn when the catalog at `catalog_path` is newer than `index`.
///
/// A missing catalog is not an error here; the index is all search needs.
pub fn check_staleness(
    index: &DiscoveryIndex,
    catalog_path: &Path,
) -> Result<Option<Warning>> {
    let bytes = match std::fs::read(catalog_path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let stamp: CatalogStamp = serde_json::from_slice(&bytes)?;
    Ok(index.is_stale(stamp.updated_at).then_some(Warning::StaleIndex))
}

/// Format results for human-readable terminal output.
pub fn format_human(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No matching entries found.");
        return;
    }

    for r in results {
        println!(
            "{:>3}. [{:.3}] {} ({})",
            r.rank, r.relevance_score, r.entry_name, r.category
        );
        if !r.description.is_empty() {
            println!("     {}", r.description);
        }
    }
    println!("\n{} result(s)", results.len());
}

#[derive(Serialize)]
struct JsonResults<'a> {
    query: &'a str,
    result_count: usize,
    results: &'a [SearchResult],
}

/// Format results as JSON output.
pub fn format_json(results: &[SearchResult], query: &str) -> Result<()> {
    let out = JsonResults {
        query,
        result_count: results.len(),
        results,
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn entry(
        name: &str,
        category: &str,
        description: &str,
        tags: &[&str],
        keywords: &[&str],
    ) -> DiscoveryIndexEntry {
        DiscoveryIndexEntry {
            name: name.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn sample_index() -> DiscoveryIndex {
        let entries = vec![
            entry(
                "docker-deploy",
                "Infrastructure",
                "Deploy container stacks behind a reverse proxy",
                &["docker", "devops"],
                &["docker", "devops", "deploy", "container", "stacks", "proxy"],
            ),
            entry(
                "compose-helper",
                "Infrastructure",
                "Write compose files for container services",
                &["compose"],
                &["compose", "write", "files", "container", "docker"],
            ),
            entry(
                "pdf-forms",
                "Document",
                "Fill and extract PDF form fields",
                &["pdf", "forms"],
                &["pdf", "forms", "fill", "extract", "form", "fields"],
            ),
            entry(
                "postgres-backup",
                "Database",
                "Schedule dockerized postgres backups",
                &["postgres", "backup"],
                &["postgres", "backup", "schedule", "backups"],
            ),
        ];
        DiscoveryIndex {
            version: "1.0.0".into(),
            updated_at: Utc::now(),
            total_entries: entries.len(),
            entries,
        }
    }

    fn names(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.entry_name.as_str()).collect()
    }

    #[test]
    fn tag_match_outranks_keyword_match() {
        let results =
            execute_search(&SearchParams::new("docker"), &sample_index());
        assert_eq!(names(&results)[..2], ["docker-deploy", "compose-helper"]);
        assert!(results[0].relevance_score > TAG_TIER_FLOOR);
        assert!(results[1].relevance_score > KEYWORD_TIER_FLOOR);
        assert!(results[1].relevance_score <= TAG_TIER_FLOOR);
        assert!(results[0].relevance_score >= results[1].relevance_score);
    }

    #[test]
    fn hyphenated_tag_typed_in_full_wins() {
        let index = DiscoveryIndex {
            entries: vec![
                entry(
                    "a-exact",
                    "Dev",
                    "compose helper",
                    &["docker-compose"],
                    &["docker", "compose"],
                ),
                entry(
                    "b-partial",
                    "Dev",
                    "compose helper",
                    &["compose"],
                    &["compose"],
                ),
            ],
            ..sample_index()
        };
        let results =
            execute_search(&SearchParams::new("docker-compose"), &index);
        assert_eq!(names(&results), vec!["a-exact", "b-partial"]);
        assert!(results[0].relevance_score > results[1].relevance_score);
    }

    #[test]
    fn punctuated_tag_matches_as_phrase() {
        let index = DiscoveryIndex {
            entries: vec![entry(
                "pipelines",
                "Dev",
                "release automation",
                &["CI/CD"],
                &["ci", "cd", "release"],
            )],
            ..sample_index()
        };
        let results =
            execute_search(&SearchParams::new("set up ci/cd"), &index);
        assert_eq!(names(&results), vec!["pipelines"]);
        assert!(results[0].relevance_score > TAG_TIER_FLOOR);
    }

    #[test]
    fn substring_match_ranks_last() {
        let results =
            execute_search(&SearchParams::new("docker"), &sample_index());
        let last = results.last().unwrap();
        // "dockerized" only contains the term.
        assert_eq!(last.entry_name, "postgres-backup");
        assert!(last.relevance_score <= KEYWORD_TIER_FLOOR);
    }

    #[test]
    fn unmet_threshold_returns_empty() {
        let mut params = SearchParams::new("docker");
        params.min_relevance = 0.99;
        let results = execute_search(&params, &sample_index());
        assert!(results.is_empty());
    }

    #[test]
    fn empty_query_returns_nothing() {
        let results = execute_search(&SearchParams::new("  "), &sample_index());
        assert!(results.is_empty());
        let results =
            execute_search(&SearchParams::new("the of and"), &sample_index());
        assert!(results.is_empty());
    }

    #[test]
    fn tag_filter_alone_lists_tagged_entries() {
        let mut params = SearchParams::new("");
        params.tag = Some("PDF".into());
        let results = execute_search(&params, &sample_index());
        assert_eq!(names(&results), vec!["pdf-forms"]);
    }

    #[test]
    fn tag_filter_excludes_untagged_entries() {
        let mut params = SearchParams::new("container");
        params.tag = Some("compose".into());
        let results = execute_search(&params, &sample_index());
        assert_eq!(names(&results), vec!["compose-helper"]);
    }

    #[test]
    fn category_filter_is_case_insensitive() {
        let mut params = SearchParams::new("container docker");
        params.category = Some("infrastructure".into());
        let results = execute_search(&params, &sample_index());
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.category == "Infrastructure"));
    }

    #[test]
    fn results_are_capped_unless_all() {
        let index = DiscoveryIndex {
            entries: (0..8)
                .map(|i| {
                    let name = format!("tool-{i}");
                    entry(&name, "Dev", "shared tool", &[], &["tool"])
                })
                .collect(),
            ..sample_index()
        };
        let results = execute_search(&SearchParams::new("tool"), &index);
        assert_eq!(results.len(), DEFAULT_TOP_K);

        let mut params = SearchParams::new("tool");
        params.all = true;
        assert_eq!(execute_search(&params, &index).len(), 8);
    }

    #[test]
    fn ties_break_by_name() {
        let index = DiscoveryIndex {
            entries: vec![
                entry("zeta", "Dev", "same", &[], &["same"]),
                entry("alpha", "Dev", "same", &[], &["same"]),
                entry("mid", "Dev", "same", &[], &["same"]),
            ],
            ..sample_index()
        };
        let results = execute_search(&SearchParams::new("same"), &index);
        assert_eq!(names(&results), vec!["alpha", "mid", "zeta"]);
        let ranks: Vec<_> = results.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn punctuation_in_query_is_ignored() {
        let index = sample_index();
        let a = execute_search(&SearchParams::new("PDF, forms!"), &index);
        let b = execute_search(&SearchParams::new("pdf forms"), &index);
        assert_eq!(a, b);
    }

    #[test]
    fn stale_index_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let catalog_path = tmp.path().join("catalog.json");
        let index = sample_index();
        let newer = index.updated_at + chrono::Duration::seconds(10);
        std::fs::write(
            &catalog_path,
            format!(
                "{{\"updated_at\":\"{}\",\"entries\":[]}}",
                newer.to_rfc3339()
            ),
        )
        .unwrap();

        let warning = check_staleness(&index, &catalog_path).unwrap();
        assert_eq!(warning, Some(Warning::StaleIndex));
    }

    #[test]
    fn missing_catalog_is_not_stale() {
        let tmp = tempfile::tempdir().unwrap();
        let warning =
            check_staleness(&sample_index(), &tmp.path().join("catalog.json"))
                .unwrap();
        assert!(warning.is_none());
    }

    fn signals() -> impl Strategy<Value = Signals> {
        (1usize..8).prop_flat_map(|terms| {
            (0..=terms, 0..=terms, 0..=terms).prop_map(
                move |(tag_hits, keyword_hits, substring_hits)| Signals {
                    tag_hits,
                    tag_terms: terms,
                    keyword_hits,
                    substring_hits,
                    query_terms: terms,
                },
            )
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            max_global_rejects: 1 << 20,
            ..ProptestConfig::default()
        })]

        #[test]
        fn score_is_a_probability(s in signals()) {
            let score = s.score();
            prop_assert!((0.0..=1.0).contains(&score));
        }

        #[test]
        fn any_tag_hit_beats_no_tag_hit(a in signals(), b in signals()) {
            prop_assume!(a.tag_hits > 0 && b.tag_hits == 0);
            prop_assert!(a.score() > b.score());
        }

        #[test]
        fn any_keyword_hit_beats_substring_only(
            a in signals(),
            b in signals(),
        ) {
            prop_assume!(a.tag_hits == 0 && b.tag_hits == 0);
            prop_assume!(a.keyword_hits > 0 && b.keyword_hits == 0);
            prop_assert!(a.score() > b.score());
        }

        #[test]
        fn more_tag_hits_never_score_lower(
            s in signals(),
            other_keyword in 0usize..8,
            other_substring in 0usize..8,
        ) {
            prop_assume!(s.tag_hits > 0 && s.tag_hits < s.tag_terms);
            let fewer = Signals {
                keyword_hits: other_keyword.min(s.query_terms),
                substring_hits: other_substring.min(s.query_terms),
                ..s
            };
            let more = Signals { tag_hits: s.tag_hits + 1, ..s };
            prop_assert!(more.score() >= fewer.score());
        }

        #[test]
        fn more_keyword_hits_never_score_lower(
            s in signals(),
            other_substring in 0usize..8,
        ) {
            prop_assume!(s.tag_hits == 0);
            prop_assume!(s.keyword_hits > 0 && s.keyword_hits < s.query_terms);
            let fewer = Signals {
                substring_hits: other_substring.min(s.query_terms),
                ..s
            };
            let more = Signals { keyword_hits: s.keyword_hits + 1, ..s };
            prop_assert!(more.score() >= fewer.score());
        }
    }
}
