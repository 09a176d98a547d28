//! Loader behaviour against files on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sentilab_core::domain::Ticker;
use sentilab_runner::{
    analyze_news, load_news, ColumnNames, FailurePolicy, LoadError, PriceLoader, SymbolResolver,
};

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn write_bytes(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn mixed_date_formats_and_missing_closes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "NVDA_prices.csv",
        "Date,Close\n\
         01/06/2020,10\n\
         2020-01-07,11\n\
         08-01-2020,\n\
         2020-01-09 16:00:00,12\n\
         2020-01-10,12.6\n",
    );
    let loader = PriceLoader::new(ColumnNames::default());
    let load = loader.load(&[path]).unwrap();

    let rows = load.table.for_ticker(&Ticker::new("NVDA"));
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[2].close, None);
    let returns: Vec<Option<f64>> = rows.iter().map(|r| r.daily_return).collect();
    assert_eq!(returns[0], None);
    assert!((returns[1].unwrap() - 0.1).abs() < 1e-9);
    assert_eq!(returns[2], None);
    assert_eq!(returns[3], None);
    assert!((returns[4].unwrap() - 0.05).abs() < 1e-9);
}

#[test]
fn adjusted_close_column_can_be_selected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "AAPL_data.csv",
        "Date,Close,Adj Close\n2020-01-02,100,50\n2020-01-03,100,55\n",
    );
    let columns = ColumnNames {
        close: "adj close".into(),
        ..ColumnNames::default()
    };
    let load = PriceLoader::new(columns).load(&[path]).unwrap();
    let rows = load.table.rows();
    assert!((rows[1].daily_return.unwrap() - 0.1).abs() < 1e-9);
}

#[test]
fn missing_required_column_names_file_and_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "AAPL_data.csv", "Day,Close\n2020-01-02,1\n");
    let err = PriceLoader::new(ColumnNames::default())
        .load(&[path.clone()])
        .unwrap_err();
    match err {
        LoadError::MissingColumn { path: p, column } => {
            assert_eq!(p, path);
            assert_eq!(column, "Date");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_file_yields_empty_series_not_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "AAPL_data.csv", "Date,Close\n");
    let load = PriceLoader::new(ColumnNames::default()).load(&[path]).unwrap();
    assert!(load.table.is_empty());
    assert_eq!(load.files.len(), 1);
    assert_eq!(load.files[0].rows, 0);
}

#[test]
fn files_for_the_same_ticker_merge_and_sort() {
    let dir = tempfile::tempdir().unwrap();
    let early = write(dir.path(), "AAPL_2019.csv", "Date,Close\n2019-12-31,100\n");
    let late = write(dir.path(), "AAPL_2020.csv", "Date,Close\n2020-01-02,110\n");
    let load = PriceLoader::new(ColumnNames::default())
        .with_parallelism(false)
        .load(&[late, early])
        .unwrap();
    let rows = load.table.rows();
    assert_eq!(rows.len(), 2);
    assert!((rows[1].daily_return.unwrap() - 0.1).abs() < 1e-9);
}

#[test]
fn skip_policy_collects_failures() {
    let dir = tempfile::tempdir().unwrap();
    let good = write(dir.path(), "AAPL_data.csv", "Date,Close\n2020-01-02,1\n");
    let bad = write(dir.path(), "MSFT_data.csv", "When,Close\n2020-01-02,1\n");
    let load = PriceLoader::new(ColumnNames::default())
        .with_failure_policy(FailurePolicy::Skip)
        .load(&[good, bad.clone()])
        .unwrap();
    assert_eq!(load.files.len(), 1);
    assert_eq!(load.skipped.len(), 1);
    assert_eq!(load.skipped[0].path, bad);
    assert!(load.skipped[0].reason.contains("Date"));
}

#[test]
fn custom_resolver_controls_identity() {
    struct Fixed;
    impl SymbolResolver for Fixed {
        fn resolve(&self, _path: &Path) -> Option<Ticker> {
            Some(Ticker::new("spy"))
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "whatever.csv", "Date,Close\n2020-01-02,1\n");
    let load = PriceLoader::new(ColumnNames::default())
        .with_resolver(Fixed)
        .load(&[path])
        .unwrap();
    assert_eq!(load.table.tickers(), vec![Ticker::new("SPY")]);
}

#[test]
fn news_loader_applies_aliases_and_keeps_times() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "news.csv",
        "headline,publisher,date,stock\n\
         Stocks That Hit 52-Week Highs,Benzinga Newsdesk,2020-06-05 10:30:54-04:00,A\n\
         ,Lisa Levin,2020-06-04,AAPL\n\
         Undated,Lisa Levin,June 3rd,AAPL\n\
         No ticker,,2020-06-03,\n",
    );
    let aliases = BTreeMap::from([(Ticker::new("A"), Ticker::new("AAPL"))]);
    let load = load_news(&path, &ColumnNames::default(), &aliases).unwrap();

    assert_eq!(load.rows.len(), 3);
    assert_eq!(load.dropped_rows, 1);
    assert_eq!(load.aliased_rows, 1);
    assert_eq!(load.rows[0].headline.ticker, Some(Ticker::new("AAPL")));
    assert!(load.rows[0].time.is_some());
    assert_eq!(load.rows[1].headline.headline, "");
    assert_eq!(load.rows[1].time, None);
    assert_eq!(load.rows[2].headline.ticker, None);
    assert_eq!(load.rows[2].headline.publisher, None);
}

#[test]
fn news_without_ticker_column_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "news.csv", "date,headline\n2020-06-01,Hello\n");
    let load = load_news(&path, &ColumnNames::default(), &BTreeMap::new()).unwrap();
    assert_eq!(load.rows.len(), 1);
    assert_eq!(load.rows[0].headline.ticker, None);
}

#[test]
fn news_report_summarizes_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "news.csv",
        "headline,publisher,date,stock\n\
         Earnings beat lifts shares,Benzinga Newsdesk,2020-06-05 10:30:54-04:00,AAPL\n\
         Earnings miss sinks shares,Lisa Levin,2020-06-05 16:00:00,AAPL\n\
         Analysts upgrade outlook,Benzinga Newsdesk,2020-06-06,MSFT\n",
    );
    let model = |text: &str| if text.contains("beat") { 0.5 } else { 0.0 };
    let report =
        analyze_news(&path, &ColumnNames::default(), &BTreeMap::new(), &model, 2).unwrap();

    assert_eq!(report.stats.headline_count, 3);
    assert_eq!(report.stats.publishers[0].label, "Benzinga Newsdesk");
    assert_eq!(report.stats.publishing_hours.values().sum::<usize>(), 2);
    assert_eq!(report.keywords.len(), 2);
    assert_eq!(report.keywords[0].term, "earnings");
    assert_eq!(report.keywords[1].term, "shares");
    assert_eq!(report.model, "custom");
    assert_eq!(report.labels.values().sum::<usize>(), 3);
}

// ── Encoding and source order ──

#[test]
fn latin1_headline_is_decoded_lossily_and_other_rows_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_bytes(
        dir.path(),
        "news.csv",
        b"headline,date,stock\n\
          Apple gains,2020-06-02,AAPL\n\
          Caf\xe9 sales slip,2020-06-03,AAPL\n\
          Apple soars,2020-06-04,AAPL\n\
          Bad date,2020-06-\xff,AAPL\n",
    );
    let load = load_news(&path, &ColumnNames::default(), &BTreeMap::new()).unwrap();

    assert_eq!(load.rows.len(), 3);
    assert_eq!(load.dropped_rows, 1);
    assert_eq!(load.rows[1].headline.headline, "Caf\u{fffd} sales slip");
    assert_eq!(load.rows[2].headline.headline, "Apple soars");
}

#[test]
fn undecodable_unused_price_column_does_not_drop_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_bytes(
        dir.path(),
        "AAPL_prices.csv",
        b"Date,Close,Notes\n\
          2020-06-01,100,ok\n\
          2020-06-02,110,r\xe9sum\xe9\n",
    );
    let load = PriceLoader::new(ColumnNames::default()).load(&[path]).unwrap();
    let rows = load.table.for_ticker(&Ticker::new("AAPL"));
    assert_eq!(rows.len(), 2);
    assert!((rows[1].daily_return.unwrap() - 0.1).abs() < 1e-9);
}

#[test]
fn descending_file_with_dropped_row_only_loses_the_spanning_return() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "MSFT_prices.csv",
        "Date,Close\n\
         2020-06-05,13\n\
         2020-06-04,12\n\
         not a date,99\n\
         2020-06-02,11\n\
         2020-06-01,10\n",
    );
    let load = PriceLoader::new(ColumnNames::default()).load(&[path]).unwrap();
    assert_eq!(load.files[0].dropped_rows, 1);

    let rows = load.table.for_ticker(&Ticker::new("MSFT"));
    let returns: Vec<Option<f64>> = rows.iter().map(|r| r.daily_return).collect();
    assert_eq!(returns[0], None);
    assert!((returns[1].unwrap() - 0.1).abs() < 1e-9);
    assert_eq!(returns[2], None);
    assert!((returns[3].unwrap() - 1.0 / 12.0).abs() < 1e-9);
}
