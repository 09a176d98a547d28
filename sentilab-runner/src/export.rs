//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! - **JSON**: the full [`PipelineReport`] with schema versioning
//! - **CSV**: correlation results, aligned observations, price/return table
//! - **Markdown**: a human-readable run summary
//!
//! Newer schema versions are rejected on import.

use std::path::{Path, PathBuf};

use sentilab_core::correlation::{CorrelationResult, CorrelationStatus};
use sentilab_core::domain::{AlignedObservation, PriceRow};
use thiserror::Error;

use crate::pipeline::{Anomaly, PipelineReport, SCHEMA_VERSION};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported schema version {found} (max supported: {supported})")]
    UnsupportedSchema { found: u32, supported: u32 },
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))?;
    Ok(String::from_utf8(data)?)
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a report to pretty JSON.
pub fn export_report_json(report: &PipelineReport) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Deserialize a report, rejecting schema versions newer than this build.
pub fn import_report_json(json: &str) -> Result<PipelineReport, ExportError> {
    let report: PipelineReport = serde_json::from_str(json)?;
    if report.schema_version > SCHEMA_VERSION {
        return Err(ExportError::UnsupportedSchema {
            found: report.schema_version,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: ticker, status, coefficient, p_value, n_observations.
pub fn export_results_csv<'a>(
    results: impl IntoIterator<Item = &'a CorrelationResult>,
) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["ticker", "status", "coefficient", "p_value", "n_observations"])?;
    for r in results {
        let status = match r.status {
            CorrelationStatus::Computed => "computed",
            CorrelationStatus::InsufficientData => "insufficient_data",
            CorrelationStatus::ZeroVariance => "zero_variance",
        };
        wtr.write_record([
            r.ticker.as_str(),
            status,
            fmt_opt(r.coefficient).as_str(),
            fmt_opt(r.p_value).as_str(),
            r.n_observations.to_string().as_str(),
        ])?;
    }
    finish(wtr)
}

/// Columns: ticker, date, daily_return, sentiment_score.
pub fn export_aligned_csv(aligned: &[AlignedObservation]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["ticker", "date", "daily_return", "sentiment_score"])?;
    for o in aligned {
        wtr.write_record([
            o.ticker.as_str(),
            o.date.to_string().as_str(),
            format!("{:.6}", o.daily_return).as_str(),
            format!("{:.6}", o.sentiment_score).as_str(),
        ])?;
    }
    finish(wtr)
}

/// Columns: ticker, date, close, daily_return. Missing values are empty.
pub fn export_returns_csv(rows: &[PriceRow]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["ticker", "date", "close", "daily_return"])?;
    for r in rows {
        wtr.write_record([
            r.ticker.as_str(),
            r.date.to_string().as_str(),
            fmt_opt(r.close).as_str(),
            fmt_opt(r.daily_return).as_str(),
        ])?;
    }
    finish(wtr)
}

// ─── Markdown report ────────────────────────────────────────────────

/// Human-readable summary of a run.
pub fn generate_report(report: &PipelineReport) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str("# Sentiment / Return Correlation\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Mode | {:?} |\n", report.mode));
    md.push_str(&format!("| Model | {} |\n", report.model));
    md.push_str(&format!("| Price files | {} |\n", report.files.len()));
    md.push_str(&format!("| Headlines | {} |\n", report.headline_count));
    md.push_str(&format!("| Aligned rows | {} |\n", report.aligned.len()));
    md.push_str(&format!("| Dataset hash | {} |\n", report.dataset_hash));
    md.push_str(&format!("| Fingerprint | {} |\n\n", report.fingerprint));

    md.push_str("## Correlations\n\n");
    md.push_str("| Ticker | n | r | p-value | Status |\n");
    md.push_str("| --- | ---: | ---: | ---: | --- |\n");
    for r in report.results.values() {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {:?} |\n",
            r.ticker,
            r.n_observations,
            r.coefficient.map(|v| format!("{v:.4}")).unwrap_or_else(|| "n/a".into()),
            r.p_value.map(|v| format!("{v:.4}")).unwrap_or_else(|| "n/a".into()),
            r.status,
        ));
    }
    md.push('\n');

    if !report.anomalies.is_empty() {
        md.push_str("## Anomalies\n\n");
        for a in &report.anomalies {
            md.push_str("- ");
            md.push_str(&describe_anomaly(a));
            md.push('\n');
        }
        md.push('\n');
    }

    md
}

fn describe_anomaly(anomaly: &Anomaly) -> String {
    match anomaly {
        Anomaly::DroppedRows { source, count } => {
            format!("{count} rows with unparseable dates dropped from `{}`", source.display())
        }
        Anomaly::SkippedFile { path, reason } => {
            format!("skipped `{}`: {reason}", path.display())
        }
        Anomaly::DuplicatePriceDate { ticker, date } => {
            format!("{ticker}: duplicate price rows on {date}")
        }
        Anomaly::DroppedWithoutTicker { count } => {
            format!("{count} headlines without a ticker dropped")
        }
        Anomaly::FlaggedTicker {
            ticker,
            status,
            n_observations,
        } => format!("{ticker}: {status:?} (n = {n_observations})"),
    }
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `report.json`, `results.csv`, `aligned.csv`, `returns.csv` and
/// `report.md` into `output_dir`, creating it if needed.
pub fn save_artifacts(report: &PipelineReport, output_dir: &Path) -> Result<PathBuf, ExportError> {
    let write = |name: &str, contents: String| -> Result<(), ExportError> {
        let path = output_dir.join(name);
        std::fs::write(&path, contents).map_err(|source| ExportError::Io { path, source })
    };

    std::fs::create_dir_all(output_dir).map_err(|source| ExportError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;

    write("report.json", export_report_json(report)?)?;
    write("results.csv", export_results_csv(report.results.values())?)?;
    write("aligned.csv", export_aligned_csv(&report.aligned)?)?;
    write("returns.csv", export_returns_csv(&report.prices)?)?;
    write("report.md", generate_report(report))?;

    Ok(output_dir.to_path_buf())
}

/// Load a report back from an artifact directory.
pub fn load_artifacts(dir: &Path) -> Result<PipelineReport, ExportError> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path).map_err(|source| ExportError::Io { path, source })?;
    import_report_json(&json)
}
