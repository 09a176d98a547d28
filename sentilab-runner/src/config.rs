//! Analysis configuration loaded from TOML.
//!
//! ```toml
//! stock_files = ["data/AAPL_historical_data.csv", "data/MSFT_historical_data.csv"]
//! news_file = "data/raw_analyst_ratings.csv"
//! mode = "per_ticker"
//! failure_policy = "skip"
//!
//! [columns]
//! close = "Adj Close"
//!
//! [ticker_aliases]
//! A = "AAPL"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sentilab_core::domain::Ticker;
use sentilab_core::sentiment::AggregationMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from reading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Source column names. Lookup is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    /// Date column of the price files.
    pub date: String,
    /// Close column of the price files (`Adj Close` is a common alternative).
    pub close: String,
    /// Date column of the headline file.
    pub news_date: String,
    pub headline: String,
    /// Optional ticker column of the headline file.
    pub ticker: String,
    /// Optional publisher column of the headline file.
    pub publisher: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            date: "Date".into(),
            close: "Close".into(),
            news_date: "date".into(),
            headline: "headline".into(),
            ticker: "stock".into(),
            publisher: "publisher".into(),
        }
    }
}

/// What to do when a source file cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the run with the load error.
    #[default]
    Abort,
    /// Record the file as skipped and continue with the rest.
    Skip,
}

/// Complete configuration for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub stock_files: Vec<PathBuf>,
    pub news_file: PathBuf,
    #[serde(default)]
    pub columns: ColumnNames,
    #[serde(default)]
    pub mode: AggregationMode,
    /// Headline ticker → canonical ticker, e.g. `A = "AAPL"`.
    #[serde(default)]
    pub ticker_aliases: BTreeMap<String, String>,
    /// The ticker is the part of a price file's name before this character.
    #[serde(default = "default_separator")]
    pub symbol_separator: char,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// Load price files on the rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_separator() -> char {
    '_'
}

fn default_parallel() -> bool {
    true
}

impl AnalysisConfig {
    /// A config with defaults for everything but the input files.
    pub fn new(stock_files: Vec<PathBuf>, news_file: PathBuf) -> Self {
        Self {
            stock_files,
            news_file,
            columns: ColumnNames::default(),
            mode: AggregationMode::default(),
            ticker_aliases: BTreeMap::new(),
            symbol_separator: default_separator(),
            failure_policy: FailurePolicy::default(),
            parallel: default_parallel(),
        }
    }

    /// Load and validate a config from a TOML file.
    ///
    /// Relative input paths are resolved against the config file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stock_files.is_empty() {
            return Err(ConfigError::Invalid("stock_files must not be empty".into()));
        }
        if self.news_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("news_file must not be empty".into()));
        }
        let c = &self.columns;
        for (name, value) in [
            ("date", &c.date),
            ("close", &c.close),
            ("news_date", &c.news_date),
            ("headline", &c.headline),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("column '{name}' must not be empty")));
            }
        }
        if self.symbol_separator.is_whitespace() {
            return Err(ConfigError::Invalid(
                "symbol_separator must not be whitespace".into(),
            ));
        }
        for (alias, target) in &self.ticker_aliases {
            if alias.trim().is_empty() || target.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "ticker alias '{alias}' -> '{target}' has an empty side"
                )));
            }
        }
        Ok(())
    }

    /// Aliases keyed and valued by normalized ticker.
    pub fn aliases(&self) -> BTreeMap<Ticker, Ticker> {
        self.ticker_aliases
            .iter()
            .map(|(alias, target)| (Ticker::new(alias), Ticker::new(target)))
            .collect()
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        for file in &mut self.stock_files {
            if file.is_relative() {
                *file = base.join(&*file);
            }
        }
        if self.news_file.is_relative() {
            self.news_file = base.join(&self.news_file);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_takes_defaults() {
        let config = AnalysisConfig::from_toml(
            r#"
            stock_files = ["AAPL_historical_data.csv"]
            news_file = "news.csv"
            "#,
        )
        .unwrap();
        assert_eq!(config.mode, AggregationMode::PerTicker);
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert_eq!(config.symbol_separator, '_');
        assert!(config.parallel);
        assert_eq!(config.columns, ColumnNames::default());
    }

    #[test]
    fn full_config_parses() {
        let config = AnalysisConfig::from_toml(
            r#"
            stock_files = ["a.csv", "b.csv"]
            news_file = "news.csv"
            mode = "global"
            failure_policy = "skip"
            symbol_separator = "-"
            parallel = false

            [columns]
            close = "Adj Close"
            ticker = "symbol"

            [ticker_aliases]
            a = "aapl"
            "#,
        )
        .unwrap();
        assert_eq!(config.mode, AggregationMode::Global);
        assert_eq!(config.failure_policy, FailurePolicy::Skip);
        assert_eq!(config.symbol_separator, '-');
        assert!(!config.parallel);
        assert_eq!(config.columns.close, "Adj Close");
        assert_eq!(config.columns.date, "Date");
        assert_eq!(config.aliases()[&Ticker::new("A")], Ticker::new("AAPL"));
    }

    #[test]
    fn empty_stock_files_is_invalid() {
        let err = AnalysisConfig::from_toml(
            r#"
            stock_files = []
            news_file = "news.csv"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_mode_is_a_parse_error() {
        let err = AnalysisConfig::from_toml(
            r#"
            stock_files = ["a.csv"]
            news_file = "news.csv"
            mode = "weekly"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = AnalysisConfig::from_file(Path::new("/nonexistent/sentilab.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("sentilab.toml"));
    }
}
