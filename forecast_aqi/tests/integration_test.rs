//! End-to-end runs of the forecasting tool on a generated bulletin file

use aqi_forecast::{PipelineConfig, RegressorConfig};
use forecast_aqi::{Config, run};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write_bulletin(path: &Path, days: usize) {
    let mut csv = String::from("Date,Index Value,No. of Stations Participated/ Total Stations\n");
    for d in 0..days {
        let index = 120.0 + 60.0 * (d as f64 * 0.3).sin();
        let participated = 20 + d % 7;
        writeln!(csv, "2023-01-{:02},{:.0},{}/30", d % 28 + 1, index, participated).unwrap();
    }
    // junk rows are dropped on load
    csv.push_str("2023-02-01,n/a,21/30\n");
    csv.push_str("2023-02-02,140,\n");
    std::fs::write(path, csv).unwrap();
}

fn quick_config(data_file: PathBuf, output_dir: PathBuf) -> Config {
    Config {
        data_file,
        output_dir,
        results_file: PathBuf::from("FORECAST.LOG"),
        plots: false,
        cross_validate: true,
        cleaned_file: Some(PathBuf::from("cleaned.csv")),
        pipeline: PipelineConfig {
            sequence_length: 5,
            epochs: 2,
            batch_size: 8,
            seed: Some(2024),
            regressor: RegressorConfig::compact(5, 2),
            cross_validation: Some(aqi_forecast::CrossValidationOptions {
                k: 3,
                epochs: 1,
                ..Default::default()
            }),
            ..PipelineConfig::default()
        },
    }
}

#[test]
fn test_run_writes_outputs() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("aqi.csv");
    write_bulletin(&data, 40);
    let out = dir.path().join("results");
    let config = quick_config(data, out.clone());

    let result = run(&config).unwrap();

    assert_eq!(result.rows, 40);
    // 35 windows, 28 / 7
    assert_eq!(result.outcome.train_size, 28);
    assert_eq!(result.outcome.test_size, 7);
    assert_eq!(result.outcome.cross_validation.as_ref().unwrap().fold_losses.len(), 3);

    let log = std::fs::read_to_string(out.join("FORECAST.LOG")).unwrap();
    assert!(log.contains("Cross-Validation Results:"));
    assert!(log.contains("Test Metrics"));

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["rows"], 40);

    let cleaned = std::fs::read_to_string(out.join("cleaned.csv")).unwrap();
    assert_eq!(cleaned.lines().count(), 41);
    assert!(cleaned.starts_with("Index Value,Stations Participated,Total Stations"));
}

#[test]
fn test_run_is_reproducible_with_seed() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("aqi.csv");
    write_bulletin(&data, 30);

    let a = run(&quick_config(data.clone(), dir.path().join("a"))).unwrap();
    let b = run(&quick_config(data, dir.path().join("b"))).unwrap();
    assert_eq!(a.outcome.predictions, b.outcome.predictions);
    assert_eq!(
        a.outcome.cross_validation.unwrap().fold_losses,
        b.outcome.cross_validation.unwrap().fold_losses
    );
}

#[test]
fn test_run_reports_missing_file() {
    let dir = tempdir().unwrap();
    let config = quick_config(dir.path().join("missing.csv"), dir.path().to_path_buf());
    let err = run(&config).err().unwrap();
    assert!(err.to_string().contains("missing.csv"));
}
