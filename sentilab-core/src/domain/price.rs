//! Price rows: the output of the stock series loader.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Ticker;

/// One close reading for a ticker after date normalization.
///
/// `daily_return` is `None` for the first row of a ticker, for a row whose
/// predecessor had a zero or missing close, and for a row whose date-order
/// predecessor lies on the other side of a dropped source row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub ticker: Ticker,
    pub close: Option<f64>,
    pub daily_return: Option<f64>,
}

impl PriceRow {
    pub fn has_return(&self) -> bool {
        self.daily_return.is_some()
    }
}

/// A single source reading before return computation.
///
/// `segment` numbers the contiguous runs of parseable rows in the source:
/// every dropped row (unparseable date) starts a new segment. A return is
/// only computed between date-adjacent readings of the same segment, so no
/// return spans a dropped row whatever order the source was written in.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceReading {
    pub date: NaiveDate,
    pub close: Option<f64>,
    pub segment: u32,
}

impl PriceReading {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            close: Some(close),
            segment: 0,
        }
    }

    pub fn in_segment(mut self, segment: u32) -> Self {
        self.segment = segment;
        self
    }
}
