//! Per-ticker daily return computation and the merged price table.
//!
//! Each ticker's readings are sorted by date (stable, so duplicate dates keep
//! their source order) and returns are computed against the immediately
//! preceding reading. The merged table is ordered by (ticker, date) and is
//! independent of the order in which tickers were supplied.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{PriceReading, PriceRow, Ticker};
use crate::stats::Summary;

/// Compute daily returns for one ticker's readings.
///
/// `daily_return[i] = close[i] / close[i-1] - 1`. No return is produced for
/// the first row, when either close is missing, when the previous close is
/// zero, or when the previous reading sits in a different source segment.
pub fn compute_returns(ticker: &Ticker, mut readings: Vec<PriceReading>) -> Vec<PriceRow> {
    readings.sort_by_key(|r| r.date);

    let mut rows = Vec::with_capacity(readings.len());
    let mut prev: Option<(Option<f64>, u32)> = None;

    for reading in readings {
        let daily_return = match prev {
            Some((Some(prev_close), segment))
                if segment == reading.segment && prev_close != 0.0 =>
            {
                reading.close.map(|close| close / prev_close - 1.0)
            }
            _ => None,
        };

        prev = Some((reading.close, reading.segment));
        rows.push(PriceRow {
            date: reading.date,
            ticker: ticker.clone(),
            close: reading.close,
            daily_return,
        });
    }

    rows
}

/// Descriptive statistics of one ticker's series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub rows: usize,
    pub close: Option<Summary>,
    pub daily_return: Option<Summary>,
}

/// All tickers' price rows, sorted by (ticker, date).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    rows: Vec<PriceRow>,
}

impl PriceTable {
    /// Build the table from per-ticker readings.
    ///
    /// Keyed by ticker in a `BTreeMap`, so iteration order and therefore the
    /// output are deterministic.
    pub fn from_readings(readings: BTreeMap<Ticker, Vec<PriceReading>>) -> Self {
        let rows = readings
            .into_iter()
            .flat_map(|(ticker, readings)| compute_returns(&ticker, readings))
            .collect();
        Self { rows }
    }

    /// Build the table from already-computed rows of any order.
    pub fn from_rows(mut rows: Vec<PriceRow>) -> Self {
        rows.sort_by(|a, b| a.ticker.cmp(&b.ticker).then(a.date.cmp(&b.date)));
        Self { rows }
    }

    /// Every row, including those without a return.
    pub fn rows(&self) -> &[PriceRow] {
        &self.rows
    }

    /// The emitted return table: rows with a defined return.
    pub fn returns(&self) -> impl Iterator<Item = &PriceRow> {
        self.rows.iter().filter(|r| r.has_return())
    }

    /// Rows for a single ticker, in date order.
    pub fn for_ticker(&self, ticker: &Ticker) -> &[PriceRow] {
        let start = self.rows.partition_point(|r| r.ticker < *ticker);
        let end = self.rows.partition_point(|r| r.ticker <= *ticker);
        &self.rows[start..end]
    }

    /// Distinct tickers, sorted.
    pub fn tickers(&self) -> Vec<Ticker> {
        let mut tickers: Vec<Ticker> = Vec::new();
        for row in &self.rows {
            if tickers.last() != Some(&row.ticker) {
                tickers.push(row.ticker.clone());
            }
        }
        tickers
    }

    /// Close and return summaries for every ticker.
    pub fn summaries(&self) -> BTreeMap<Ticker, PriceSummary> {
        self.tickers()
            .into_iter()
            .map(|ticker| {
                let rows = self.for_ticker(&ticker);
                let summary = PriceSummary {
                    rows: rows.len(),
                    close: Summary::of(rows.iter().filter_map(|r| r.close)),
                    daily_return: Summary::of(rows.iter().filter_map(|r| r.daily_return)),
                };
                (ticker, summary)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
