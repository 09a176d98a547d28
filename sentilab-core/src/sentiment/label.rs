//! Coarse polarity labels.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::HeadlineRecord;

/// Polarity above this is positive, below its negation negative.
pub const NEUTRAL_BAND: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Negative,
    Neutral,
    Positive,
}

impl SentimentLabel {
    pub fn from_polarity(polarity: f64) -> Self {
        if polarity > NEUTRAL_BAND {
            SentimentLabel::Positive
        } else if polarity < -NEUTRAL_BAND {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

/// Count of headlines per label. Every label is present, possibly with 0.
pub fn label_distribution(records: &[HeadlineRecord]) -> BTreeMap<SentimentLabel, usize> {
    let mut counts = BTreeMap::from([
        (SentimentLabel::Negative, 0),
        (SentimentLabel::Neutral, 0),
        (SentimentLabel::Positive, 0),
    ]);
    for record in records {
        *counts
            .entry(SentimentLabel::from_polarity(record.polarity))
            .or_default() += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn band_edges_are_neutral() {
        assert_eq!(SentimentLabel::from_polarity(0.1), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_polarity(-0.1), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_polarity(0.11), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_polarity(-0.5), SentimentLabel::Negative);
    }

    #[test]
    fn distribution_counts_every_label() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let records: Vec<HeadlineRecord> = [0.5, 0.0, 0.7]
            .iter()
            .map(|&polarity| HeadlineRecord {
                date,
                ticker: None,
                headline: String::new(),
                publisher: None,
                polarity,
            })
            .collect();
        let dist = label_distribution(&records);
        assert_eq!(dist[&SentimentLabel::Positive], 2);
        assert_eq!(dist[&SentimentLabel::Neutral], 1);
        assert_eq!(dist[&SentimentLabel::Negative], 0);
    }
}
