//! Keyword frequency over headlines.
//!
//! Headlines are reduced to lowercase ASCII letters, split on whitespace,
//! and filtered against an English stop-word list. Tokens of two letters or
//! fewer are discarded.

use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// A term and the number of times it occurs across the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub term: String,
    pub count: usize,
}

/// Cleaned, stop-word-free tokens of one headline, in order.
pub fn tokenize(headline: &str) -> Vec<String> {
    let cleaned: String = headline
        .chars()
        .map(|c| {
            if c.is_ascii_alphabetic() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();
    let stop = stop_words();
    cleaned
        .split_whitespace()
        .filter(|t| t.len() > 2 && !stop.contains(t))
        .map(str::to_string)
        .collect()
}

/// The `n` most frequent terms, ties broken alphabetically.
pub fn top_keywords<'a>(
    headlines: impl IntoIterator<Item = &'a str>,
    n: usize,
) -> Vec<KeywordCount> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for headline in headlines {
        for token in tokenize(headline) {
            *counts.entry(token).or_default() += 1;
        }
    }
    let mut ranked: Vec<KeywordCount> = counts
        .into_iter()
        .map(|(term, count)| KeywordCount { term, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(n);
    ranked
}
