//! Headline scoring and daily aggregation.
//!
//! Both aggregation modes share one grouping routine; the mode only decides
//! which key a scored headline projects to.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::model::{bounded_polarity, SentimentModel};
use crate::domain::{DailySentiment, DatedHeadline, HeadlineRecord, Ticker};

/// Whether daily sentiment is computed per ticker or across the corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// One score per date across all headlines.
    Global,
    /// One score per (date, ticker). Headlines without a ticker are dropped.
    #[default]
    PerTicker,
}

impl AggregationMode {
    fn key(self, record: &HeadlineRecord) -> Option<(NaiveDate, Option<Ticker>)> {
        match self {
            AggregationMode::Global => Some((record.date, None)),
            AggregationMode::PerTicker => {
                record.ticker.as_ref().map(|t| (record.date, Some(t.clone())))
            }
        }
    }
}

/// Daily sentiment plus the number of headlines the mode could not key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentAggregate {
    /// Sorted by (date, ticker); unique per key.
    pub daily: Vec<DailySentiment>,
    pub dropped_without_ticker: usize,
}

/// Score every headline with `model`.
pub fn score_headlines(
    headlines: Vec<DatedHeadline>,
    model: &dyn SentimentModel,
) -> Vec<HeadlineRecord> {
    headlines
        .into_iter()
        .map(|h| {
            let polarity = bounded_polarity(model, &h.headline);
            HeadlineRecord {
                date: h.date,
                ticker: h.ticker,
                headline: h.headline,
                publisher: h.publisher,
                polarity,
            }
        })
        .collect()
}

/// Mean polarity per key. Repeated headlines are all counted.
pub fn aggregate_daily(records: &[HeadlineRecord], mode: AggregationMode) -> SentimentAggregate {
    let mut groups: BTreeMap<(NaiveDate, Option<Ticker>), (f64, usize)> = BTreeMap::new();
    let mut dropped_without_ticker = 0;

    for record in records {
        match mode.key(record) {
            Some(key) => {
                let entry = groups.entry(key).or_insert((0.0, 0));
                entry.0 += record.polarity;
                entry.1 += 1;
            }
            None => dropped_without_ticker += 1,
        }
    }

    let daily = groups
        .into_iter()
        .map(|((date, ticker), (sum, count))| DailySentiment {
            date,
            ticker,
            sentiment_score: sum / count as f64,
            headline_count: count,
        })
        .collect();

    SentimentAggregate {
        daily,
        dropped_without_ticker,
    }
}

/// Scores headlines with a model and aggregates them under a mode.
pub struct SentimentScorer<'a> {
    model: &'a dyn SentimentModel,
    mode: AggregationMode,
}

impl<'a> SentimentScorer<'a> {
    pub fn new(model: &'a dyn SentimentModel, mode: AggregationMode) -> Self {
        Self { model, mode }
    }

    pub fn mode(&self) -> AggregationMode {
        self.mode
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn score(&self, headlines: Vec<DatedHeadline>) -> Vec<HeadlineRecord> {
        score_headlines(headlines, self.model)
    }

    pub fn aggregate(&self, records: &[HeadlineRecord]) -> SentimentAggregate {
        aggregate_daily(records, self.mode)
    }
}
