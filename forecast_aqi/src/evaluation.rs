use anyhow::{Context, Result};
use aqi_forecast::{CrossValidation, Metrics, PipelineConfig, PipelineOutcome, ScalingMode};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

use crate::config::Config;

/// What `summary.json` holds
#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    pub data_file: &'a Path,
    pub rows: usize,
    pub pipeline: &'a PipelineConfig,
    pub train_size: usize,
    pub test_size: usize,
    pub final_train_loss: Option<f64>,
    pub final_val_loss: Option<f64>,
    pub metrics: Option<Metrics>,
    pub cv_mean_loss: Option<f64>,
    pub cv_std_loss: Option<f64>,
    pub outcome: &'a PipelineOutcome,
}

impl<'a> Summary<'a> {
    pub fn new(config: &'a Config, rows: usize, outcome: &'a PipelineOutcome) -> Self {
        let cv = outcome.cross_validation.as_ref();
        Self {
            data_file: &config.data_file,
            rows,
            pipeline: &config.pipeline,
            train_size: outcome.train_size,
            test_size: outcome.test_size,
            final_train_loss: outcome.history.final_train_loss(),
            final_val_loss: outcome.history.final_val_loss(),
            metrics: outcome.report.as_ref().map(|r| r.metrics),
            cv_mean_loss: cv.map(CrossValidation::mean),
            cv_std_loss: cv.map(CrossValidation::std_dev),
            outcome,
        }
    }
}

/// Format the results log
pub fn render_results(config: &Config, rows: usize, outcome: &PipelineOutcome) -> Result<String> {
    let pipeline = &config.pipeline;
    let regressor = pipeline.regressor_config(0);
    let mut out = String::new();

    writeln!(out, "FORECAST_AQI - Daily air-quality index forecast")?;
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out)?;

    writeln!(out, "Configuration:")?;
    writeln!(out, "  Data file: {}", config.data_file.display())?;
    writeln!(out, "  Rows after cleaning: {}", rows)?;
    writeln!(out, "  Sequence length: {}", pipeline.sequence_length)?;
    writeln!(out, "  Train fraction: {:.2}", pipeline.train_fraction)?;
    writeln!(out, "  Epochs: {}", pipeline.epochs)?;
    writeln!(out, "  Batch size: {}", pipeline.batch_size)?;
    writeln!(
        out,
        "  Scaler fitted on: {}",
        match pipeline.scaling {
            ScalingMode::TrainRows => "training rows",
            ScalingMode::FullSeries => "full series",
        }
    )?;
    writeln!(out, "  LSTM units: {:?}", regressor.lstm_units)?;
    writeln!(out, "  Dropout: {:.2}", regressor.dropout)?;
    writeln!(out, "  Dense units: {}", regressor.dense_units)?;
    writeln!(out, "  Learning rate: {}", regressor.learning_rate)?;
    match pipeline.seed {
        Some(seed) => writeln!(out, "  Seed: {}", seed)?,
        None => writeln!(out, "  Seed: none (entropy)")?,
    }
    writeln!(out)?;

    writeln!(
        out,
        "Windows: {} train / {} test",
        outcome.train_size, outcome.test_size
    )?;
    writeln!(out)?;

    writeln!(out, "Training History:")?;
    writeln!(out, "  {:>6} {:>14} {:>14}", "Epoch", "Loss", "Val loss")?;
    writeln!(out, "  {}", "-".repeat(36))?;
    for e in &outcome.history.epochs {
        let val = e
            .val_loss
            .map_or_else(|| "-".to_string(), |v| format!("{:.6}", v));
        writeln!(out, "  {:>6} {:>14.6} {:>14}", e.epoch, e.train_loss, val)?;
    }
    writeln!(out)?;

    match &outcome.report {
        Some(report) => {
            let m = &report.metrics;
            writeln!(out, "Test Metrics (scaled units):")?;
            writeln!(out, "  MSE:  {:.4}", m.mse)?;
            writeln!(out, "  RMSE: {:.4}", m.rmse)?;
            writeln!(out, "  MAE:  {:.4}", m.mae)?;
            writeln!(out, "  R2:   {:.4}", m.r2)?;
            writeln!(out)?;

            writeln!(out, "Test Forecasts:")?;
            writeln!(
                out,
                "  {:>5} {:>12} {:>12} {:>12}",
                "Case", "Actual", "Predicted", "Residual"
            )?;
            writeln!(out, "  {}", "-".repeat(44))?;
            for (i, (actual, predicted)) in outcome
                .actuals_original_scale
                .iter()
                .zip(&outcome.predictions_original_scale)
                .enumerate()
            {
                writeln!(
                    out,
                    "  {:>5} {:>12.2} {:>12.2} {:>12.2}",
                    i + 1,
                    actual,
                    predicted,
                    actual - predicted
                )?;
            }
            writeln!(out)?;
        }
        None => {
            writeln!(out, "Test Metrics: none (empty test segment)")?;
            writeln!(out)?;
        }
    }

    if let Some(cv) = &outcome.cross_validation {
        writeln!(out, "Cross-Validation Results:")?;
        writeln!(out, "  {:>5} {:>8} {:>14}", "Fold", "Size", "Val loss")?;
        writeln!(out, "  {}", "-".repeat(29))?;
        for (f, (loss, size)) in cv.fold_losses.iter().zip(&cv.fold_sizes).enumerate() {
            writeln!(out, "  {:>5} {:>8} {:>14.6}", f + 1, size, loss)?;
        }
        writeln!(out, "  Mean: {:.6}", cv.mean())?;
        writeln!(out, "  Std:  {:.6}", cv.std_dev())?;
    }

    Ok(out)
}

/// Write the results log
pub fn write_results<P: AsRef<Path>>(
    path: P,
    config: &Config,
    rows: usize,
    outcome: &PipelineOutcome,
) -> Result<()> {
    let path = path.as_ref();
    table_io::write_file(path, render_results(config, rows, outcome)?)
        .with_context(|| format!("Failed to write results: {}", path.display()))
}

/// Write the machine-readable run summary
pub fn write_summary<P: AsRef<Path>>(
    path: P,
    config: &Config,
    rows: usize,
    outcome: &PipelineOutcome,
) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(&Summary::new(config, rows, outcome))?;
    table_io::write_file(path, json)
        .with_context(|| format!("Failed to write summary: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Args;
    use aqi_forecast::{EpochLoss, MinMaxScaler, TrainingHistory, report};
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn config() -> Config {
        Config::from_args(&Args {
            filename: Some(PathBuf::from("aqi.csv")),
            seed: Some(1),
            ..Args::default()
        })
        .unwrap()
    }

    fn outcome() -> PipelineOutcome {
        let actuals = vec![0.5, 1.0];
        let predictions = vec![0.0, 1.0];
        PipelineOutcome {
            scaler: MinMaxScaler {
                columns: vec!["Index Value".to_string()],
                mins: vec![0.0],
                maxs: vec![200.0],
            },
            train_size: 8,
            test_size: 2,
            history: TrainingHistory {
                epochs: vec![EpochLoss {
                    epoch: 1,
                    train_loss: 0.02,
                    val_loss: Some(0.03),
                }],
            },
            report: Some(report(&actuals, &predictions).unwrap()),
            predictions_original_scale: vec![90.0, 140.0],
            actuals_original_scale: vec![100.0, 120.0],
            predictions,
            actuals,
            cross_validation: Some(CrossValidation {
                fold_losses: vec![0.01, 0.03],
                fold_sizes: vec![5, 5],
            }),
        }
    }

    #[test]
    fn test_render_results() {
        let text = render_results(&config(), 30, &outcome()).unwrap();
        assert!(text.contains("Rows after cleaning: 30"));
        assert!(text.contains("Windows: 8 train / 2 test"));
        assert!(text.contains("MSE:  0.1250"));
        assert!(text.contains("Mean: 0.020000"));
        assert!(text.contains("100.00"));
        assert!(text.contains("-20.00"));
    }

    #[test]
    fn test_render_without_test_segment() {
        let mut o = outcome();
        o.report = None;
        o.cross_validation = None;
        let text = render_results(&config(), 30, &o).unwrap();
        assert!(text.contains("empty test segment"));
        assert!(!text.contains("Cross-Validation"));
    }

    #[test]
    fn test_write_results_and_summary() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("out/FORECAST.LOG");
        let json = dir.path().join("out/summary.json");
        let config = config();
        let outcome = outcome();

        write_results(&log, &config, 30, &outcome).unwrap();
        write_summary(&json, &config, 30, &outcome).unwrap();

        assert!(std::fs::read_to_string(&log).unwrap().starts_with("FORECAST_AQI"));
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(value["rows"], 30);
        assert_eq!(value["test_size"], 2);
        assert_eq!(value["outcome"]["cross_validation"]["fold_sizes"][1], 5);
        assert!((value["cv_mean_loss"].as_f64().unwrap() - 0.02).abs() < 1e-12);
    }
}
