use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Ticker;

/// A headline after date normalization, before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedHeadline {
    pub date: NaiveDate,
    pub ticker: Option<Ticker>,
    pub headline: String,
    pub publisher: Option<String>,
}

/// A scored headline. Polarity is always derived, never read from input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlineRecord {
    pub date: NaiveDate,
    pub ticker: Option<Ticker>,
    pub headline: String,
    pub publisher: Option<String>,
    pub polarity: f64,
}

/// Mean polarity for one (date, ticker) key. `ticker` is `None` for
/// corpus-wide sentiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySentiment {
    pub date: NaiveDate,
    pub ticker: Option<Ticker>,
    pub sentiment_score: f64,
    pub headline_count: usize,
}
