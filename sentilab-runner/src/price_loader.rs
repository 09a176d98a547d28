//! Price file loading for the runner.
//!
//! One CSV per ticker. The ticker comes from the file name through a
//! [`SymbolResolver`]; file contents are never consulted for identity.
//! Rows are read as raw bytes and only the date and close fields are decoded.
//! Rows whose date does not normalize are dropped and counted, and no return
//! is computed across a dropped row.
//!
//! Files are loaded in sorted path order (optionally on the rayon pool) and
//! merged per ticker, so the resulting table does not depend on the order the
//! paths were given in or on which worker finished first.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use sentilab_core::date::DateNormalizer;
use sentilab_core::domain::{PriceReading, Ticker};
use sentilab_core::returns::PriceTable;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{AnalysisConfig, ColumnNames, FailurePolicy};

/// Errors from reading a source file. Every variant names the file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{} has no '{column}' column", .path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("cannot derive a ticker from file name {}", .path.display())]
    NoSymbol { path: PathBuf },
}

impl LoadError {
    pub fn path(&self) -> &Path {
        match self {
            LoadError::Io { path, .. }
            | LoadError::Csv { path, .. }
            | LoadError::MissingColumn { path, .. }
            | LoadError::NoSymbol { path } => path,
        }
    }
}

/// Maps a price file path to the ticker it holds.
pub trait SymbolResolver: Send + Sync {
    fn resolve(&self, path: &Path) -> Option<Ticker>;
}

/// Ticker is the file stem up to the first separator, uppercased:
/// `AAPL_historical_data.csv` → `AAPL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixResolver {
    pub separator: char,
}

impl Default for PrefixResolver {
    fn default() -> Self {
        Self { separator: '_' }
    }
}

impl SymbolResolver for PrefixResolver {
    fn resolve(&self, path: &Path) -> Option<Ticker> {
        let stem = path.file_stem()?.to_str()?;
        let prefix = stem.split(self.separator).next()?;
        let ticker = Ticker::new(prefix);
        (!ticker.is_empty()).then_some(ticker)
    }
}

/// Index of `name` in `headers`, compared trimmed and case-insensitively.
pub(crate) fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    let wanted = name.trim();
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(wanted))
}

pub(crate) fn open_csv(path: &Path) -> Result<csv::Reader<File>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

pub(crate) fn require_column(
    path: &Path,
    headers: &csv::StringRecord,
    name: &str,
) -> Result<usize, LoadError> {
    find_column(headers, name).ok_or_else(|| LoadError::MissingColumn {
        path: path.to_path_buf(),
        column: name.to_string(),
    })
}

/// Read the next row as raw bytes, so an undecodable byte in one field never
/// fails the file. Returns `false` at end of input.
pub(crate) fn read_row(
    path: &Path,
    reader: &mut csv::Reader<File>,
    record: &mut csv::ByteRecord,
) -> Result<bool, LoadError> {
    reader
        .read_byte_record(record)
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

/// A date field must be valid UTF-8; anything else is an unparseable date.
pub(crate) fn date_field(record: &csv::ByteRecord, idx: usize) -> Option<&str> {
    record.get(idx).and_then(|bytes| std::str::from_utf8(bytes).ok())
}

/// A text field, with invalid UTF-8 sequences replaced by U+FFFD.
pub(crate) fn text_field(record: &csv::ByteRecord, idx: usize) -> Option<Cow<'_, str>> {
    record.get(idx).map(String::from_utf8_lossy)
}

/// Empty, non-numeric and non-finite closes are missing.
fn parse_close(text: Option<&str>) -> Option<f64> {
    text.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// One price file after parsing.
#[derive(Debug, Clone)]
pub struct PriceFile {
    pub path: PathBuf,
    pub ticker: Ticker,
    /// Kept readings in source order.
    pub readings: Vec<PriceReading>,
    pub dropped_rows: usize,
}

/// Per-file load summary carried into the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub path: PathBuf,
    pub ticker: Ticker,
    pub rows: usize,
    pub dropped_rows: usize,
}

/// A file that could not be read under [`FailurePolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of loading every price file.
#[derive(Debug, Clone)]
pub struct PriceLoad {
    pub table: PriceTable,
    /// Loaded files in sorted path order.
    pub files: Vec<FileSummary>,
    pub skipped: Vec<SkippedFile>,
    /// BLAKE3 over every (ticker, date, close) in table order.
    pub dataset_hash: String,
}

/// Loads per-ticker price files into a [`PriceTable`].
pub struct PriceLoader {
    columns: ColumnNames,
    resolver: Box<dyn SymbolResolver>,
    parallel: bool,
    failure_policy: FailurePolicy,
}

impl PriceLoader {
    pub fn new(columns: ColumnNames) -> Self {
        Self {
            columns,
            resolver: Box::new(PrefixResolver::default()),
            parallel: true,
            failure_policy: FailurePolicy::Abort,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.columns.clone())
            .with_resolver(PrefixResolver {
                separator: config.symbol_separator,
            })
            .with_parallelism(config.parallel)
            .with_failure_policy(config.failure_policy)
    }

    pub fn with_resolver(mut self, resolver: impl SymbolResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Parse a single price file.
    pub fn load_file(&self, path: &Path) -> Result<PriceFile, LoadError> {
        let ticker = self
            .resolver
            .resolve(path)
            .ok_or_else(|| LoadError::NoSymbol {
                path: path.to_path_buf(),
            })?;

        let mut reader = open_csv(path)?;
        let headers = reader
            .headers()
            .map_err(|source| LoadError::Csv {
                path: path.to_path_buf(),
                source,
            })?
            .clone();
        let date_idx = require_column(path, &headers, &self.columns.date)?;
        let close_idx = require_column(path, &headers, &self.columns.close)?;

        let mut readings = Vec::new();
        let mut dropped_rows = 0;
        let mut segment = 0;
        let mut record = csv::ByteRecord::new();
        while read_row(path, &mut reader, &mut record)? {
            match date_field(&record, date_idx).and_then(DateNormalizer::normalize) {
                Some(date) => readings.push(PriceReading {
                    date,
                    close: parse_close(text_field(&record, close_idx).as_deref()),
                    segment,
                }),
                None => {
                    dropped_rows += 1;
                    segment += 1;
                }
            }
        }

        debug!(
            path = %path.display(),
            ticker = %ticker,
            rows = readings.len(),
            dropped_rows,
            "loaded price file"
        );

        Ok(PriceFile {
            path: path.to_path_buf(),
            ticker,
            readings,
            dropped_rows,
        })
    }

    /// Load every file and merge into one table.
    ///
    /// Under [`FailurePolicy::Abort`] the first failing file in sorted path
    /// order is returned as the error.
    pub fn load(&self, paths: &[PathBuf]) -> Result<PriceLoad, LoadError> {
        let mut sorted: Vec<&PathBuf> = paths.iter().collect();
        sorted.sort();
        sorted.dedup();

        let outcomes: Vec<Result<PriceFile, LoadError>> = if self.parallel {
            sorted.par_iter().map(|p| self.load_file(p)).collect()
        } else {
            sorted.iter().map(|p| self.load_file(p)).collect()
        };

        let mut readings: BTreeMap<Ticker, Vec<PriceReading>> = BTreeMap::new();
        let mut files = Vec::new();
        let mut skipped = Vec::new();

        for outcome in outcomes {
            match outcome {
                Ok(file) => {
                    if file.dropped_rows > 0 {
                        warn!(
                            path = %file.path.display(),
                            dropped = file.dropped_rows,
                            "dropped price rows with unparseable dates"
                        );
                    }
                    files.push(FileSummary {
                        path: file.path,
                        ticker: file.ticker.clone(),
                        rows: file.readings.len(),
                        dropped_rows: file.dropped_rows,
                    });
                    readings.entry(file.ticker).or_default().extend(file.readings);
                }
                Err(e) => match self.failure_policy {
                    FailurePolicy::Abort => return Err(e),
                    FailurePolicy::Skip => {
                        warn!(path = %e.path().display(), error = %e, "skipping price file");
                        skipped.push(SkippedFile {
                            path: e.path().to_path_buf(),
                            reason: e.to_string(),
                        });
                    }
                },
            }
        }

        let table = PriceTable::from_readings(readings);
        let dataset_hash = compute_dataset_hash(&table);
        info!(
            files = files.len(),
            skipped = skipped.len(),
            rows = table.len(),
            returns = table.returns().count(),
            "price files loaded"
        );

        Ok(PriceLoad {
            table,
            files,
            skipped,
            dataset_hash,
        })
    }
}

/// Deterministic BLAKE3 hash over the merged price table.
fn compute_dataset_hash(table: &PriceTable) -> String {
    let mut hasher = blake3::Hasher::new();
    for row in table.rows() {
        hasher.update(row.ticker.as_str().as_bytes());
        hasher.update(row.date.to_string().as_bytes());
        match row.close {
            Some(close) => hasher.update(&close.to_le_bytes()),
            None => hasher.update(b"-"),
        };
    }
    hasher.finalize().to_hex().to_string()
}
