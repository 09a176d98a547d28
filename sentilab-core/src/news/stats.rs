//! Corpus statistics over dated headlines.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::stats::Summary;

/// One headline as seen by the statistics functions.
#[derive(Debug, Clone, Copy)]
pub struct HeadlineView<'a> {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub headline: &'a str,
    pub publisher: Option<&'a str>,
}

/// Count per label, ordered by descending count then label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedCount {
    pub label: String,
    pub count: usize,
}

/// Aggregate corpus statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsStats {
    pub headline_count: usize,
    /// Headline length in characters.
    pub headline_length: Option<Summary>,
    pub publishers: Vec<RankedCount>,
    /// Domains of publishers given as email addresses.
    pub publisher_domains: Vec<RankedCount>,
    pub articles_per_day: BTreeMap<NaiveDate, usize>,
    /// Hour of day → count, only for headlines whose source carried a time.
    pub publishing_hours: BTreeMap<u32, usize>,
}

impl NewsStats {
    pub fn compute<'a>(headlines: impl IntoIterator<Item = HeadlineView<'a>>) -> Self {
        let mut lengths = Vec::new();
        let mut publishers: BTreeMap<&str, usize> = BTreeMap::new();
        let mut domains: BTreeMap<&str, usize> = BTreeMap::new();
        let mut articles_per_day = BTreeMap::new();
        let mut publishing_hours = BTreeMap::new();

        for h in headlines {
            lengths.push(h.headline.chars().count() as f64);
            *articles_per_day.entry(h.date).or_default() += 1;
            if let Some(time) = h.time {
                *publishing_hours.entry(time.hour()).or_default() += 1;
            }
            if let Some(publisher) = h.publisher.map(str::trim).filter(|p| !p.is_empty()) {
                *publishers.entry(publisher).or_default() += 1;
                if let Some(domain) = email_domain(publisher) {
                    *domains.entry(domain).or_default() += 1;
                }
            }
        }

        Self {
            headline_count: lengths.len(),
            headline_length: Summary::of(lengths),
            publishers: rank(publishers),
            publisher_domains: rank(domains),
            articles_per_day,
            publishing_hours,
        }
    }

    /// The `n` most prolific publishers.
    pub fn top_publishers(&self, n: usize) -> &[RankedCount] {
        &self.publishers[..n.min(self.publishers.len())]
    }
}

fn email_domain(publisher: &str) -> Option<&str> {
    let (_, domain) = publisher.split_once('@')?;
    (!domain.is_empty()).then_some(domain)
}

fn rank(counts: BTreeMap<&str, usize>) -> Vec<RankedCount> {
    let mut ranked: Vec<RankedCount> = counts
        .into_iter()
        .map(|(label, count)| RankedCount {
            label: label.to_string(),
            count,
        })
        .collect();
    // BTreeMap order gives the alphabetical tie-break; the sort is stable.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}
