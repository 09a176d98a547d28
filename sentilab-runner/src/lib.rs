//! SentiLab Runner: file loading, configuration, orchestration, export.
//!
//! This crate builds on `sentilab-core` to provide:
//! - TOML analysis configuration
//! - Per-ticker price file loading with a pluggable symbol resolver
//! - Headline file loading with ticker aliases
//! - The end-to-end correlation pipeline with an anomaly ledger
//! - Run fingerprinting and CSV/JSON/Markdown artifacts
//! - Descriptive headline-corpus reports

pub mod config;
pub mod export;
pub mod news_loader;
pub mod news_report;
pub mod pipeline;
pub mod price_loader;

pub use config::{AnalysisConfig, ColumnNames, ConfigError, FailurePolicy};
pub use export::{
    export_aligned_csv, export_report_json, export_results_csv, export_returns_csv,
    generate_report, import_report_json, load_artifacts, save_artifacts, ExportError,
};
pub use news_loader::{load_news, NewsLoad, NewsRow};
pub use news_report::{analyze_news, NewsReport, DEFAULT_TOP_KEYWORDS};
pub use pipeline::{
    run_fingerprint, run_pipeline, Anomaly, PipelineError, PipelineReport, SCHEMA_VERSION,
};
pub use price_loader::{
    FileSummary, LoadError, PrefixResolver, PriceFile, PriceLoad, PriceLoader, SkippedFile,
    SymbolResolver,
};
