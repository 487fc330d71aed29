//! Tokenization shared by keyword extraction, query parsing and the task
//! analyzer, so that all three agree on what a "word" is.

use std::collections::HashSet;

/// Tokens shorter than this are never keywords.
pub const MIN_KEYWORD_LEN: usize = 2;

const STOP_WORDS: &[&str] = &[
    "a", "about", "an", "and", "are", "as", "at", "be", "been", "being",
    "but", "by", "can", "could", "did", "do", "does", "for", "from", "had",
    "has", "have", "how", "i", "if", "in", "into", "is", "it", "its", "me",
    "may", "might", "must", "my", "no", "not", "of", "on", "or", "should",
    "so", "than", "that", "the", "their", "them", "then", "there", "these",
    "this", "those", "to", "up", "use", "used", "using", "was", "we",
    "were", "what", "when", "which", "while", "who", "will", "with",
    "would", "you", "your",
];

/// Split `text` into lower-cased alphanumeric runs. Every other character
/// is treated as a separator, so punctuation never survives.
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Keyword tokens of `text`: [`words`] minus stop words and very short
/// tokens. Duplicates are kept; use [`dedup`] when a set is needed.
pub fn keyword_tokens(text: &str) -> Vec<String> {
    words(text).into_iter().filter(|w| is_keyword(w)).collect()
}

pub fn is_keyword(word: &str) -> bool {
    word.chars().count() >= MIN_KEYWORD_LEN && !STOP_WORDS.contains(&word)
}

/// Remove duplicates, keeping the first occurrence of each token.
pub fn dedup<I>(tokens: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    tokens
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// True when `needle` occurs as a contiguous run inside `haystack`.
pub fn contains_run(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

/// Distinct keyword tokens of a search query, in query order.
pub fn query_terms(query: &str) -> Vec<String> {
    dedup(keyword_tokens(query))
}
