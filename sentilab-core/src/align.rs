//! Date alignment of returns and daily sentiment.
//!
//! A strict inner join: a (ticker, date) pair produces an observation only
//! when both a return and a sentiment score exist for it. Nothing is filled
//! forward and nothing is fabricated.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{AlignedObservation, DailySentiment, Ticker};
use crate::returns::PriceTable;

/// Result of the join.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignedTable {
    /// Sorted by (ticker, date); at most one row per key.
    pub observations: Vec<AlignedObservation>,
    /// Return-side keys that appeared more than once. The last row in date
    /// order was used for the join.
    pub duplicate_price_keys: Vec<(Ticker, NaiveDate)>,
}

impl AlignedTable {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Observations grouped by ticker, tickers sorted.
    pub fn by_ticker(&self) -> BTreeMap<&Ticker, Vec<&AlignedObservation>> {
        let mut groups: BTreeMap<&Ticker, Vec<&AlignedObservation>> = BTreeMap::new();
        for obs in &self.observations {
            groups.entry(&obs.ticker).or_default().push(obs);
        }
        groups
    }
}

/// Inner-join the return table with daily sentiment.
///
/// Sentiment rows carrying a ticker match on (ticker, date). Rows without a
/// ticker are corpus-wide and match every ticker's return on that date.
pub fn align(prices: &PriceTable, sentiment: &[DailySentiment]) -> AlignedTable {
    let mut per_ticker: HashMap<(&Ticker, NaiveDate), f64> = HashMap::new();
    let mut global: HashMap<NaiveDate, f64> = HashMap::new();
    for row in sentiment {
        match &row.ticker {
            Some(ticker) => {
                per_ticker.insert((ticker, row.date), row.sentiment_score);
            }
            None => {
                global.insert(row.date, row.sentiment_score);
            }
        }
    }

    // Collapse the return side to one row per key.
    let mut returns: BTreeMap<(&Ticker, NaiveDate), f64> = BTreeMap::new();
    let mut duplicate_price_keys = Vec::new();
    for row in prices.returns() {
        let Some(daily_return) = row.daily_return else {
            continue;
        };
        if returns.insert((&row.ticker, row.date), daily_return).is_some() {
            duplicate_price_keys.push((row.ticker.clone(), row.date));
        }
    }
    duplicate_price_keys.dedup();

    let observations = returns
        .into_iter()
        .filter_map(|((ticker, date), daily_return)| {
            let score = per_ticker
                .get(&(ticker, date))
                .or_else(|| global.get(&date))?;
            Some(AlignedObservation {
                date,
                ticker: ticker.clone(),
                daily_return,
                sentiment_score: *score,
            })
        })
        .collect();

    AlignedTable {
        observations,
        duplicate_price_keys,
    }
}
