//! SentiLab Core: date normalization, returns, sentiment, alignment, correlation.
//!
//! This crate holds the in-memory half of the sentiment-return pipeline:
//! - Domain types (tickers, price rows, headlines, aligned observations)
//! - Ordered multi-format date normalization
//! - Per-ticker daily returns
//! - Headline scoring behind a `SentimentModel` trait, daily aggregation
//! - Strict date alignment and per-ticker Pearson correlation
//! - Descriptive corpus statistics and keyword frequency
//!
//! Nothing here touches the filesystem; loading lives in `sentilab-runner`.

pub mod align;
pub mod correlation;
pub mod date;
pub mod domain;
pub mod news;
pub mod returns;
pub mod sentiment;
pub mod stats;

pub use align::{align, AlignedTable};
pub use correlation::{
    correlate, correlate_tickers, pearson, CorrelationResult, CorrelationStatus, Pearson,
};
pub use date::{
    normalize_date, parse_timestamp, DateFormat, DateNormalizer, NormalizedTimestamp,
    UnparseableDate,
};
pub use domain::{
    AlignedObservation, DailySentiment, DatedHeadline, HeadlineRecord, PriceReading, PriceRow,
    Ticker,
};
pub use returns::{compute_returns, PriceSummary, PriceTable};
pub use sentiment::{AggregationMode, SentimentModel, SentimentScorer, VaderModel};
pub use stats::Summary;
