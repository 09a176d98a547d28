//! Headline sentiment: scoring, labels, and daily aggregation.

pub mod aggregate;
pub mod label;
pub mod model;

pub use aggregate::{
    aggregate_daily, score_headlines, AggregationMode, SentimentAggregate, SentimentScorer,
};
pub use label::{label_distribution, SentimentLabel};
pub use model::{bounded_polarity, SentimentModel, VaderModel};
