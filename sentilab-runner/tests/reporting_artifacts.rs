//! Artifact export and re-import.

use std::path::Path;

use sentilab_runner::{
    export_aligned_csv, export_report_json, export_results_csv, export_returns_csv,
    generate_report, import_report_json, load_artifacts, run_pipeline, save_artifacts,
    AnalysisConfig, ExportError, PipelineReport,
};

fn report(dir: &Path) -> PipelineReport {
    let aapl = dir.join("AAPL_data.csv");
    std::fs::write(
        &aapl,
        "Date,Close\n2020-06-01,100\n2020-06-02,102\n2020-06-03,101\n2020-06-04,104\n",
    )
    .unwrap();
    let tsla = dir.join("TSLA_data.csv");
    std::fs::write(&tsla, "Date,Close\n2020-06-01,10\n").unwrap();
    let news = dir.join("news.csv");
    std::fs::write(
        &news,
        "date,headline,stock\n\
         2020-06-02,up,AAPL\n\
         2020-06-03,down,AAPL\n\
         2020-06-04,up up,AAPL\n",
    )
    .unwrap();

    let model = |text: &str| match text {
        "up" => 0.5,
        "down" => -0.5,
        _ => 0.9,
    };
    run_pipeline(&AnalysisConfig::new(vec![aapl, tsla], news), &model).unwrap()
}

fn assert_same_report(a: &PipelineReport, b: &PipelineReport) {
    assert_eq!(a.schema_version, b.schema_version);
    assert_eq!(a.fingerprint, b.fingerprint);
    assert_eq!(a.dataset_hash, b.dataset_hash);
    assert_eq!(a.anomalies, b.anomalies);
    assert_eq!(a.files, b.files);
    assert_eq!(a.aligned.len(), b.aligned.len());
    assert_eq!(
        a.results.keys().collect::<Vec<_>>(),
        b.results.keys().collect::<Vec<_>>()
    );
    for (x, y) in a.results.values().zip(b.results.values()) {
        assert_eq!(x.status, y.status);
        assert_eq!(x.n_observations, y.n_observations);
        let (rx, ry) = (x.coefficient.unwrap_or(0.0), y.coefficient.unwrap_or(0.0));
        assert!((rx - ry).abs() < 1e-12);
    }
}

#[test]
fn csv_exports_have_expected_shape() {
    let dir = tempfile::tempdir().unwrap();
    let report = report(dir.path());

    let results = export_results_csv(report.results.values()).unwrap();
    let lines: Vec<&str> = results.lines().collect();
    assert_eq!(lines[0], "ticker,status,coefficient,p_value,n_observations");
    assert!(lines[1].starts_with("AAPL,computed,"));
    assert_eq!(lines[2], "TSLA,insufficient_data,,,0");

    let aligned = export_aligned_csv(&report.aligned).unwrap();
    assert_eq!(aligned.lines().count(), 4);
    assert!(aligned.lines().nth(1).unwrap().starts_with("AAPL,2020-06-02,0.020000,0.500000"));

    let returns = export_returns_csv(&report.prices).unwrap();
    assert_eq!(returns.lines().count(), 6);
    assert_eq!(returns.lines().nth(1).unwrap(), "AAPL,2020-06-01,100.000000,");
}

#[test]
fn json_round_trips_and_rejects_newer_schema() {
    let dir = tempfile::tempdir().unwrap();
    let report = report(dir.path());

    let json = export_report_json(&report).unwrap();
    assert!(json.contains("\"schema_version\": 1"));
    assert_same_report(&import_report_json(&json).unwrap(), &report);

    let newer = json.replace("\"schema_version\": 1", "\"schema_version\": 99");
    match import_report_json(&newer) {
        Err(ExportError::UnsupportedSchema { found, supported }) => {
            assert_eq!(found, 99);
            assert_eq!(supported, 1);
        }
        other => panic!("expected schema rejection, got {other:?}"),
    }
}

#[test]
fn artifact_bundle_is_written_and_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let report = report(dir.path());
    let out = dir.path().join("artifacts/run1");

    let written = save_artifacts(&report, &out).unwrap();
    for name in ["report.json", "results.csv", "aligned.csv", "returns.csv", "report.md"] {
        assert!(written.join(name).exists(), "{name} missing");
    }
    assert_same_report(&load_artifacts(&written).unwrap(), &report);
}

#[test]
fn markdown_report_lists_results_and_anomalies() {
    let dir = tempfile::tempdir().unwrap();
    let report = report(dir.path());
    let md = generate_report(&report);
    assert!(md.contains("| AAPL | 3 |"));
    assert!(md.contains("TSLA: InsufficientData (n = 0)"));
    assert!(md.contains(&report.fingerprint));
}
