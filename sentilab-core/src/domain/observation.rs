use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Ticker;

/// Inner-join row: a return and a sentiment score sharing (date, ticker).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedObservation {
    pub date: NaiveDate,
    pub ticker: Ticker,
    pub daily_return: f64,
    pub sentiment_score: f64,
}
