//! Task complexity heuristics: decide from a free-text task description
//! whether a discovery search is worth running.

use serde::Serialize;

use crate::tokenize;

pub const LENGTH_WEIGHT: f64 = 0.15;
pub const LENGTH_SATURATION_WORDS: usize = 20;
pub const INDICATOR_WEIGHT: f64 = 0.1;
pub const INDICATOR_CAP: f64 = 0.3;
pub const DOMAIN_WEIGHT: f64 = 0.2;
pub const DOMAIN_CAP: f64 = 0.4;
pub const ONGOING_BONUS: f64 = 0.15;

/// Complexity above which a search is recommended even without a domain hit.
pub const SEARCH_THRESHOLD: f64 = 0.4;

/// Domain lexicon, scanned in order. Multi-word keywords (and keywords with
/// punctuation such as `ci/cd`) match as contiguous token runs.
pub const DOMAIN_LEXICON: &[(&str, &[&str])] = &[
    (
        "devops",
        &[
            "docker", "kubernetes", "k8s", "deploy", "ci/cd",
            "infrastructure", "vps", "server", "traefik", "nginx",
        ],
    ),
    (
        "database",
        &[
            "postgres", "mysql", "mongodb", "sql", "query", "backup",
            "migration", "schema",
        ],
    ),
    (
        "automation",
        &["n8n", "workflow", "automation", "pipeline", "orchestration"],
    ),
    (
        "document",
        &["pdf", "docx", "pptx", "xlsx", "document", "template", "format"],
    ),
    (
        "ai/rag",
        &[
            "rag", "vector", "embedding", "retrieval", "semantic", "search",
            "llm", "prompt",
        ],
    ),
    (
        "web",
        &[
            "react", "next.js", "frontend", "backend", "api", "rest",
            "graphql",
        ],
    ),
    (
        "design",
        &["canvas", "design", "ui", "ux", "theme", "brand", "graphic"],
    ),
    (
        "testing",
        &[
            "test", "testing", "qa", "quality", "validation", "unit test",
            "integration",
        ],
    ),
];

pub const COMPLEXITY_INDICATORS: &[&str] = &[
    "deploy", "build", "create", "setup", "configure", "implement",
    "workflow", "pipeline", "system", "stack", "architecture", "multiple",
    "several", "various", "complex", "advanced",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskAnalysis {
    pub complexity_score: f64,
    pub domains: Vec<String>,
    pub should_search: bool,
    pub reason: String,
}

/// Score `text` and decide whether discovery should run.
pub fn analyze(text: &str, is_ongoing: bool) -> TaskAnalysis {
    let tokens = tokenize::words(text);
    let word_count = text.split_whitespace().count();

    let domains = matched_domains(&tokens);
    let indicators = COMPLEXITY_INDICATORS
        .iter()
        .filter(|kw| contains_phrase(&tokens, kw))
        .count();

    let length = LENGTH_WEIGHT
        * (word_count as f64 / LENGTH_SATURATION_WORDS as f64).min(1.0);
    let indicator = (indicators as f64 * INDICATOR_WEIGHT).min(INDICATOR_CAP);
    let domain = (domains.len() as f64 * DOMAIN_WEIGHT).min(DOMAIN_CAP);
    let ongoing = if is_ongoing { ONGOING_BONUS } else { 0.0 };
    let complexity_score =
        (length + indicator + domain + ongoing).clamp(0.0, 1.0);

    tracing::debug!(
        words = word_count,
        indicators,
        domains = domains.len(),
        complexity_score,
        "task analyzed"
    );

    let above = complexity_score > SEARCH_THRESHOLD;
    let should_search = above || !domains.is_empty();
    let reason = match (above, domains.is_empty()) {
        (true, true) => format!(
            "complexity {complexity_score:.2} exceeds {SEARCH_THRESHOLD:.2}"
        ),
        (true, false) => format!(
            "complexity {complexity_score:.2} exceeds {SEARCH_THRESHOLD:.2}; \
             domains: {}",
            domains.join(", ")
        ),
        (false, false) => {
            format!("domain-specific task: {}", domains.join(", "))
        }
        (false, true) => format!(
            "simple task: complexity {complexity_score:.2} and no domain \
             keywords"
        ),
    };

    TaskAnalysis {
        complexity_score,
        domains,
        should_search,
        reason,
    }
}

/// Domains with at least one keyword present, in lexicon order.
fn matched_domains(tokens: &[String]) -> Vec<String> {
    DOMAIN_LEXICON
        .iter()
        .filter(|(_, keywords)| {
            keywords.iter().any(|kw| contains_phrase(tokens, kw))
        })
        .map(|(domain, _)| domain.to_string())
        .collect()
}

/// True when the tokens of `phrase` occur contiguously in `tokens`.
fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    tokenize::contains_run(tokens, &tokenize::words(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_talk_does_not_search() {
        let a = analyze("what's the weather today?", false);
        assert!(!a.should_search, "{a:?}");
        assert!(a.domains.is_empty());
        assert!(a.complexity_score < SEARCH_THRESHOLD);
    }

    #[test]
    fn deployment_task_searches() {
        let a = analyze(
            "deploy a docker stack with traefik and automatic https",
            true,
        );
        assert!(a.should_search);
        assert!(a.domains.contains(&"devops".to_string()));
        assert!(a.complexity_score > SEARCH_THRESHOLD);
    }

    #[test]
    fn domains_follow_lexicon_order() {
        let a =
            analyze("write a unit test for the postgres docker image", false);
        assert_eq!(a.domains, vec!["devops", "database", "testing"]);
    }

    #[test]
    fn phrase_keywords_need_contiguous_tokens() {
        let tokens = tokenize::words("set up CI/CD for the repo");
        assert!(contains_phrase(&tokens, "ci/cd"));
        let tokens = tokenize::words("ci then later cd");
        assert!(!contains_phrase(&tokens, "ci/cd"));
    }

    #[test]
    fn keywords_do_not_match_inside_words() {
        // "ui" must not match "build", "rest" must not match "interesting".
        let a = analyze("an interesting guide", false);
        assert!(a.domains.is_empty());
    }

    #[test]
    fn ongoing_adds_bonus() {
        let base = analyze("tidy the notes", false);
        let ongoing = analyze("tidy the notes", true);
        let diff = ongoing.complexity_score - base.complexity_score;
        assert!((diff - ONGOING_BONUS).abs() < 1e-9);
    }

    #[test]
    fn score_is_clamped() {
        let text = "deploy build create setup configure implement workflow \
            pipeline system stack docker postgres pdf rag react design test \
            and many more words to saturate the length signal completely";
        let a = analyze(text, true);
        assert!(a.complexity_score <= 1.0);
        assert!(a.complexity_score > 0.9);
    }

    #[test]
    fn analysis_is_deterministic() {
        let text = "build a react frontend with a graphql api";
        assert_eq!(analyze(text, false), analyze(text, false));
    }
}
