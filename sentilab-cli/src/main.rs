//! SentiLab CLI: sentiment/return correlation and headline statistics.
//!
//! Commands:
//! - `correlate`: run the full pipeline from a TOML config or flags
//! - `returns`: load price files and print per-ticker return summaries
//! - `news-stats`: corpus statistics, keywords and label mix of a headline file

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sentilab_core::domain::Ticker;
use sentilab_core::sentiment::{AggregationMode, VaderModel};
use sentilab_runner::{
    analyze_news, export_returns_csv, run_pipeline, save_artifacts, AnalysisConfig, ColumnNames,
    FailurePolicy, NewsReport, PipelineReport, PriceLoader, DEFAULT_TOP_KEYWORDS,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sentilab",
    about = "SentiLab CLI: does news sentiment co-move with stock returns?"
)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence when set).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Correlate daily headline sentiment with daily returns per ticker.
    Correlate {
        /// Path to a TOML config file. Other input flags are ignored when set.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Price CSV files; the ticker is the file name prefix before `_`.
        #[arg(long, num_args = 1..)]
        stocks: Vec<PathBuf>,

        /// Headline CSV file.
        #[arg(long)]
        news: Option<PathBuf>,

        /// Aggregate sentiment per ticker or across the whole corpus.
        #[arg(long, value_enum, default_value_t = Mode::PerTicker)]
        mode: Mode,

        /// Headline ticker alias, e.g. `A=AAPL`. Repeatable.
        #[arg(long = "alias", value_parser = parse_alias)]
        aliases: Vec<(String, String)>,

        /// Close column of the price files.
        #[arg(long, default_value = "Close")]
        close_column: String,

        /// Skip unreadable files instead of aborting.
        #[arg(long, default_value_t = false)]
        skip_unreadable: bool,

        /// Load price files one at a time.
        #[arg(long, default_value_t = false)]
        serial: bool,

        /// Write report.json, CSVs and report.md here.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Load price files and summarize closes and daily returns.
    Returns {
        /// Price CSV files; the ticker is the file name prefix before `_`.
        #[arg(required = true, num_args = 1..)]
        stocks: Vec<PathBuf>,

        /// Close column of the price files.
        #[arg(long, default_value = "Close")]
        close_column: String,

        /// Write the price/return table as CSV here.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Describe a headline file: lengths, publishers, timing, keywords.
    NewsStats {
        /// Headline CSV file.
        news: PathBuf,

        /// Number of keywords to report.
        #[arg(long, default_value_t = DEFAULT_TOP_KEYWORDS)]
        top_keywords: usize,

        /// Number of publishers to report.
        #[arg(long, default_value_t = 10)]
        top_publishers: usize,

        /// Print the report as JSON instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Global,
    PerTicker,
}

impl From<Mode> for AggregationMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Global => AggregationMode::Global,
            Mode::PerTicker => AggregationMode::PerTicker,
        }
    }
}

fn parse_alias(text: &str) -> Result<(String, String), String> {
    match text.split_once('=') {
        Some((alias, target)) if !alias.trim().is_empty() && !target.trim().is_empty() => {
            Ok((alias.trim().to_string(), target.trim().to_string()))
        }
        _ => Err(format!("expected ALIAS=TICKER, got '{text}'")),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Correlate {
            config,
            stocks,
            news,
            mode,
            aliases,
            close_column,
            skip_unreadable,
            serial,
            output_dir,
        } => {
            let config = match config {
                Some(path) => AnalysisConfig::from_file(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => {
                    let Some(news) = news else {
                        bail!("either --config or both --stocks and --news are required");
                    };
                    if stocks.is_empty() {
                        bail!("either --config or both --stocks and --news are required");
                    }
                    let mut config = AnalysisConfig::new(stocks, news);
                    config.mode = mode.into();
                    config.columns.close = close_column;
                    config.ticker_aliases = aliases.into_iter().collect();
                    if skip_unreadable {
                        config.failure_policy = FailurePolicy::Skip;
                    }
                    config.parallel = !serial;
                    config
                }
            };
            run_correlate(&config, output_dir)
        }
        Commands::Returns {
            stocks,
            close_column,
            output,
        } => run_returns(stocks, close_column, output),
        Commands::NewsStats {
            news,
            top_keywords,
            top_publishers,
            json,
        } => run_news_stats(news, top_keywords, top_publishers, json),
    }
}

fn run_correlate(config: &AnalysisConfig, output_dir: Option<PathBuf>) -> Result<()> {
    let model = VaderModel::new();
    let report = run_pipeline(config, &model).context("correlation run failed")?;
    print_correlations(&report);

    if let Some(dir) = output_dir {
        let written = save_artifacts(&report, &dir)
            .with_context(|| format!("writing artifacts to {}", dir.display()))?;
        println!();
        println!("Artifacts written to {}", written.display());
    }
    Ok(())
}

fn run_returns(stocks: Vec<PathBuf>, close_column: String, output: Option<PathBuf>) -> Result<()> {
    let columns = ColumnNames {
        close: close_column,
        ..ColumnNames::default()
    };
    let load = PriceLoader::new(columns)
        .load(&stocks)
        .context("loading price files")?;

    println!();
    println!("=== Daily Returns ===");
    println!(
        "{:<8} {:>6} {:>12} {:>12} {:>10} {:>10} {:>10}",
        "Ticker", "Rows", "First", "Last", "Mean", "Std", "Max |r|"
    );
    for (ticker, summary) in load.table.summaries() {
        let rows = load.table.for_ticker(&ticker);
        let first = rows.first().map(|r| r.date.to_string()).unwrap_or_default();
        let last = rows.last().map(|r| r.date.to_string()).unwrap_or_default();
        let (mean, std, max_abs) = match summary.daily_return {
            Some(s) => (
                format!("{:.4}%", s.mean * 100.0),
                s.std.map(|v| format!("{:.4}%", v * 100.0)).unwrap_or_default(),
                format!("{:.2}%", s.min.abs().max(s.max.abs()) * 100.0),
            ),
            None => Default::default(),
        };
        println!(
            "{:<8} {:>6} {:>12} {:>12} {:>10} {:>10} {:>10}",
            ticker.as_str(),
            summary.rows,
            first,
            last,
            mean,
            std,
            max_abs
        );
    }
    for file in load.files.iter().filter(|f| f.dropped_rows > 0) {
        println!(
            "WARNING: {} rows with unparseable dates dropped from {}",
            file.dropped_rows,
            file.path.display()
        );
    }

    if let Some(path) = output {
        let csv = export_returns_csv(load.table.rows())?;
        std::fs::write(&path, csv).with_context(|| format!("writing {}", path.display()))?;
        println!();
        println!("Returns written to {}", path.display());
    }
    Ok(())
}

fn run_news_stats(
    news: PathBuf,
    top_keywords: usize,
    top_publishers: usize,
    json: bool,
) -> Result<()> {
    let model = VaderModel::new();
    let aliases: BTreeMap<Ticker, Ticker> = BTreeMap::new();
    let report = analyze_news(&news, &ColumnNames::default(), &aliases, &model, top_keywords)
        .with_context(|| format!("analyzing {}", news.display()))?;

    if json {
        let json = serde_json::to_string_pretty(&report).context("serializing news report")?;
        println!("{json}");
    } else {
        print_news_report(&report, top_publishers);
    }
    Ok(())
}

// ─── Printing ───────────────────────────────────────────────────────

fn print_correlations(report: &PipelineReport) {
    println!();
    println!("=== Sentiment / Return Correlation ===");
    println!("Mode:           {:?}", report.mode);
    println!("Model:          {}", report.model);
    println!("Price files:    {}", report.files.len());
    println!("Headlines:      {}", report.headline_count);
    println!("Aligned rows:   {}", report.aligned.len());
    println!("Fingerprint:    {}", report.fingerprint);
    println!();
    println!(
        "{:<8} {:>6} {:>9} {:>9}  {}",
        "Ticker", "n", "r", "p-value", "Status"
    );
    for r in report.results.values() {
        let coef = r.coefficient.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".into());
        let p = r.p_value.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".into());
        println!(
            "{:<8} {:>6} {:>9} {:>9}  {:?}",
            r.ticker.as_str(),
            r.n_observations,
            coef,
            p,
            r.status
        );
    }
    if !report.anomalies.is_empty() {
        println!();
        println!("{} anomalies recorded (see report.json for details)", report.anomalies.len());
    }
}

fn print_news_report(report: &NewsReport, top_publishers: usize) {
    let stats = &report.stats;
    println!();
    println!("=== Headline Corpus ===");
    println!("File:           {}", report.path.display());
    println!("Headlines:      {}", stats.headline_count);
    println!("Dropped rows:   {}", report.dropped_rows);
    println!("Days covered:   {}", stats.articles_per_day.len());
    if let Some(len) = stats.headline_length {
        println!(
            "Length:         mean {:.1}, median {:.0}, min {:.0}, max {:.0}",
            len.mean, len.median, len.min, len.max
        );
    }

    println!();
    println!("--- Sentiment ({}) ---", report.model);
    for (label, count) in &report.labels {
        println!("{:<14}  {count}", format!("{label:?}"));
    }

    println!();
    println!("--- Top Publishers ---");
    for p in stats.top_publishers(top_publishers) {
        println!("{:>6}  {}", p.count, p.label);
    }
    if !stats.publisher_domains.is_empty() {
        println!();
        println!("--- Publisher Domains ---");
        for d in &stats.publisher_domains {
            println!("{:>6}  {}", d.count, d.label);
        }
    }

    if let Some((day, count)) = stats.articles_per_day.iter().max_by_key(|(_, c)| **c) {
        println!();
        println!("Busiest day:    {day} ({count} headlines)");
    }
    if !stats.publishing_hours.is_empty() {
        println!();
        println!("--- Publishing Hour (UTC) ---");
        for (hour, count) in &stats.publishing_hours {
            println!("{hour:02}:00  {count}");
        }
    }

    println!();
    println!("--- Keywords ---");
    for k in &report.keywords {
        println!("{:>6}  {}", k.count, k.term);
    }
}
