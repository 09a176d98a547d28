//! Descriptive analysis of the headline corpus.

pub mod keywords;
pub mod stats;

pub use keywords::{tokenize, top_keywords, KeywordCount};
pub use stats::{HeadlineView, NewsStats, RankedCount};
