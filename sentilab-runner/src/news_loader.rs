//! Headline file loading.
//!
//! The date and headline columns are required; ticker and publisher columns
//! are used when present. Ticker aliases are applied before anything groups
//! on the ticker. Text fields holding invalid UTF-8 are decoded lossily
//! rather than failing the file.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use sentilab_core::date::DateNormalizer;
use sentilab_core::domain::{DatedHeadline, Ticker};
use sentilab_core::news::HeadlineView;
use tracing::{debug, warn};

use crate::config::ColumnNames;
use crate::price_loader::{
    date_field, find_column, open_csv, read_row, require_column, text_field, LoadError,
};

/// A headline row plus the time of day, when the source carried one.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsRow {
    pub headline: DatedHeadline,
    pub time: Option<NaiveTime>,
}

/// Parsed headline file.
#[derive(Debug, Clone, Default)]
pub struct NewsLoad {
    pub path: PathBuf,
    /// Rows in source order.
    pub rows: Vec<NewsRow>,
    /// Rows whose date did not normalize.
    pub dropped_rows: usize,
    /// Rows whose ticker was rewritten by an alias.
    pub aliased_rows: usize,
}

impl NewsLoad {
    pub fn headlines(&self) -> Vec<DatedHeadline> {
        self.rows.iter().map(|r| r.headline.clone()).collect()
    }

    pub fn into_headlines(self) -> Vec<DatedHeadline> {
        self.rows.into_iter().map(|r| r.headline).collect()
    }

    pub fn views(&self) -> impl Iterator<Item = HeadlineView<'_>> {
        self.rows.iter().map(|r| HeadlineView {
            date: r.headline.date,
            time: r.time,
            headline: &r.headline.headline,
            publisher: r.headline.publisher.as_deref(),
        })
    }
}

fn non_empty(text: Option<Cow<'_, str>>) -> Option<String> {
    let text = text?;
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Load a headline CSV.
pub fn load_news(
    path: &Path,
    columns: &ColumnNames,
    aliases: &BTreeMap<Ticker, Ticker>,
) -> Result<NewsLoad, LoadError> {
    let mut reader = open_csv(path)?;
    let headers = reader
        .headers()
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();
    let date_idx = require_column(path, &headers, &columns.news_date)?;
    let headline_idx = require_column(path, &headers, &columns.headline)?;
    let ticker_idx = find_column(&headers, &columns.ticker);
    let publisher_idx = find_column(&headers, &columns.publisher);

    let mut load = NewsLoad {
        path: path.to_path_buf(),
        ..NewsLoad::default()
    };

    let mut record = csv::ByteRecord::new();
    while read_row(path, &mut reader, &mut record)? {
        let Some(ts) = date_field(&record, date_idx)
            .and_then(|text| DateNormalizer::parse(text).ok())
        else {
            load.dropped_rows += 1;
            continue;
        };

        let ticker = ticker_idx
            .and_then(|i| non_empty(text_field(&record, i)))
            .map(Ticker::new)
            .map(|t| match aliases.get(&t) {
                Some(canonical) => {
                    load.aliased_rows += 1;
                    canonical.clone()
                }
                None => t,
            });

        load.rows.push(NewsRow {
            headline: DatedHeadline {
                date: ts.date,
                ticker,
                headline: text_field(&record, headline_idx)
                    .map(Cow::into_owned)
                    .unwrap_or_default(),
                publisher: publisher_idx.and_then(|i| non_empty(text_field(&record, i))),
            },
            time: ts.time,
        });
    }

    if load.dropped_rows > 0 {
        warn!(
            path = %path.display(),
            dropped = load.dropped_rows,
            "dropped headline rows with unparseable dates"
        );
    }
    debug!(
        path = %path.display(),
        rows = load.rows.len(),
        aliased = load.aliased_rows,
        "loaded headline file"
    );

    Ok(load)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_trims_and_filters() {
        assert_eq!(non_empty(Some("  AAPL ".into())), Some("AAPL".to_string()));
        assert_eq!(non_empty(Some("   ".into())), None);
        assert_eq!(non_empty(None), None);
    }
}
