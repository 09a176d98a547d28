//! End-to-end run: load, score, align, correlate.
//!
//! The price side and the headline side are loaded independently and only
//! meet in the aligner. Everything a run had to drop, skip or flag is
//! recorded as an [`Anomaly`] on the report; a run is never silently partial.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use sentilab_core::align::align;
use sentilab_core::correlation::{correlate_tickers, CorrelationResult, CorrelationStatus};
use sentilab_core::domain::{AlignedObservation, DailySentiment, PriceRow, Ticker};
use sentilab_core::sentiment::{
    label_distribution, AggregationMode, SentimentLabel, SentimentModel, SentimentScorer,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{AnalysisConfig, ConfigError, FailurePolicy};
use crate::news_loader::{load_news, NewsLoad};
use crate::price_loader::{FileSummary, LoadError, PriceLoader};

/// Current report schema version.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Something a run dropped, skipped or could not compute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// Rows of `source` whose date did not normalize.
    DroppedRows { source: PathBuf, count: usize },
    /// A source file that could not be read under the skip policy.
    SkippedFile { path: PathBuf, reason: String },
    /// The price side had more than one row for this key.
    DuplicatePriceDate { ticker: Ticker, date: NaiveDate },
    /// Headlines without a ticker in per-ticker mode.
    DroppedWithoutTicker { count: usize },
    /// A ticker whose correlation is undefined.
    FlaggedTicker {
        ticker: Ticker,
        status: CorrelationStatus,
        n_observations: usize,
    },
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub mode: AggregationMode,
    /// Name of the sentiment model used.
    pub model: String,
    pub results: BTreeMap<Ticker, CorrelationResult>,
    /// Full price table, including rows without a return.
    pub prices: Vec<PriceRow>,
    pub daily_sentiment: Vec<DailySentiment>,
    pub aligned: Vec<AlignedObservation>,
    pub labels: BTreeMap<SentimentLabel, usize>,
    pub files: Vec<FileSummary>,
    pub headline_count: usize,
    pub anomalies: Vec<Anomaly>,
    /// BLAKE3 over the loaded price table.
    pub dataset_hash: String,
    /// BLAKE3 over results and aligned observations.
    pub fingerprint: String,
}

impl PipelineReport {
    pub fn flagged(&self) -> impl Iterator<Item = &CorrelationResult> {
        self.results.values().filter(|r| r.status.is_flagged())
    }

    pub fn returns(&self) -> impl Iterator<Item = &PriceRow> {
        self.prices.iter().filter(|r| r.has_return())
    }
}

/// Run the whole pipeline for `config`, scoring headlines with `model`.
pub fn run_pipeline(
    config: &AnalysisConfig,
    model: &dyn SentimentModel,
) -> Result<PipelineReport, PipelineError> {
    config.validate()?;
    let mut anomalies = Vec::new();

    // ── Prices ──
    let prices = PriceLoader::from_config(config).load(&config.stock_files)?;
    for file in &prices.files {
        if file.dropped_rows > 0 {
            anomalies.push(Anomaly::DroppedRows {
                source: file.path.clone(),
                count: file.dropped_rows,
            });
        }
    }
    anomalies.extend(prices.skipped.iter().map(|s| Anomaly::SkippedFile {
        path: s.path.clone(),
        reason: s.reason.clone(),
    }));

    // ── Headlines ──
    let news = match load_news(&config.news_file, &config.columns, &config.aliases()) {
        Ok(news) => news,
        Err(e) if config.failure_policy == FailurePolicy::Skip => {
            warn!(path = %e.path().display(), error = %e, "skipping headline file");
            anomalies.push(Anomaly::SkippedFile {
                path: e.path().to_path_buf(),
                reason: e.to_string(),
            });
            NewsLoad::default()
        }
        Err(e) => return Err(e.into()),
    };
    if news.dropped_rows > 0 {
        anomalies.push(Anomaly::DroppedRows {
            source: news.path.clone(),
            count: news.dropped_rows,
        });
    }
    let headline_count = news.rows.len();

    // ── Sentiment ──
    let scorer = SentimentScorer::new(model, config.mode);
    let records = scorer.score(news.into_headlines());
    let labels = label_distribution(&records);
    let sentiment = scorer.aggregate(&records);
    if sentiment.dropped_without_ticker > 0 {
        warn!(
            count = sentiment.dropped_without_ticker,
            "dropped headlines without a ticker in per-ticker mode"
        );
        anomalies.push(Anomaly::DroppedWithoutTicker {
            count: sentiment.dropped_without_ticker,
        });
    }
    info!(
        headlines = records.len(),
        days = sentiment.daily.len(),
        model = scorer.model_name(),
        "headlines scored"
    );

    // ── Align + correlate ──
    let aligned = align(&prices.table, &sentiment.daily);
    for (ticker, date) in &aligned.duplicate_price_keys {
        warn!(ticker = %ticker, date = %date, "duplicate price date, keeping the last row");
        anomalies.push(Anomaly::DuplicatePriceDate {
            ticker: ticker.clone(),
            date: *date,
        });
    }

    let tickers = prices.table.tickers();
    let results = correlate_tickers(&aligned, &tickers);
    for result in results.values().filter(|r| r.status.is_flagged()) {
        warn!(
            ticker = %result.ticker,
            status = ?result.status,
            n = result.n_observations,
            "correlation undefined"
        );
        anomalies.push(Anomaly::FlaggedTicker {
            ticker: result.ticker.clone(),
            status: result.status,
            n_observations: result.n_observations,
        });
    }

    let fingerprint = run_fingerprint(&results, &aligned.observations);
    info!(
        tickers = results.len(),
        aligned = aligned.len(),
        anomalies = anomalies.len(),
        fingerprint = %&fingerprint[..12],
        "run complete"
    );

    Ok(PipelineReport {
        schema_version: SCHEMA_VERSION,
        mode: config.mode,
        model: scorer.model_name().to_string(),
        results,
        prices: prices.table.rows().to_vec(),
        daily_sentiment: sentiment.daily,
        aligned: aligned.observations,
        labels,
        files: prices.files,
        headline_count,
        anomalies,
        dataset_hash: prices.dataset_hash,
        fingerprint,
    })
}

/// Deterministic BLAKE3 hash over the correlation results and the aligned
/// observations they were computed from.
pub fn run_fingerprint(
    results: &BTreeMap<Ticker, CorrelationResult>,
    aligned: &[AlignedObservation],
) -> String {
    fn opt(hasher: &mut blake3::Hasher, value: Option<f64>) {
        match value {
            Some(v) => hasher.update(&v.to_le_bytes()),
            None => hasher.update(b"-"),
        };
    }

    let mut hasher = blake3::Hasher::new();
    for (ticker, result) in results {
        hasher.update(ticker.as_str().as_bytes());
        hasher.update(format!("{:?}", result.status).as_bytes());
        hasher.update(&(result.n_observations as u64).to_le_bytes());
        opt(&mut hasher, result.coefficient);
        opt(&mut hasher, result.p_value);
    }
    hasher.update(b"|");
    for obs in aligned {
        hasher.update(obs.ticker.as_str().as_bytes());
        hasher.update(obs.date.to_string().as_bytes());
        hasher.update(&obs.daily_return.to_le_bytes());
        hasher.update(&obs.sentiment_score.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
