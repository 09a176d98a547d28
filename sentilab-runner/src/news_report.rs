//! Descriptive analysis of a headline file: corpus statistics, keyword
//! frequency and the sentiment label mix.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sentilab_core::domain::Ticker;
use sentilab_core::news::{top_keywords, KeywordCount, NewsStats};
use sentilab_core::sentiment::{label_distribution, score_headlines, SentimentLabel, SentimentModel};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ColumnNames;
use crate::news_loader::load_news;
use crate::price_loader::LoadError;

/// Default number of keywords reported.
pub const DEFAULT_TOP_KEYWORDS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsReport {
    pub path: PathBuf,
    pub dropped_rows: usize,
    pub stats: NewsStats,
    pub keywords: Vec<KeywordCount>,
    pub labels: BTreeMap<SentimentLabel, usize>,
    pub model: String,
}

/// Load `path` and summarize it.
pub fn analyze_news(
    path: &Path,
    columns: &ColumnNames,
    aliases: &BTreeMap<Ticker, Ticker>,
    model: &dyn SentimentModel,
    top_n: usize,
) -> Result<NewsReport, LoadError> {
    let news = load_news(path, columns, aliases)?;
    let stats = NewsStats::compute(news.views());
    let keywords = top_keywords(news.rows.iter().map(|r| r.headline.headline.as_str()), top_n);
    let dropped_rows = news.dropped_rows;
    let records = score_headlines(news.into_headlines(), model);
    let labels = label_distribution(&records);

    info!(
        headlines = stats.headline_count,
        publishers = stats.publishers.len(),
        days = stats.articles_per_day.len(),
        "headline file analyzed"
    );

    Ok(NewsReport {
        path: path.to_path_buf(),
        dropped_rows,
        stats,
        keywords,
        labels,
        model: model.name().to_string(),
    })
}
