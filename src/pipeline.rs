//! End-to-end forecasting run: scale, window, split, fit, predict, report,
//! and optionally cross-validate.

use log::{info, warn};
use matlib::child_seed;
use serde::{Deserialize, Serialize};
use table_io::{INDEX_VALUE, Table};

use crate::cross_validation::{CrossValidation, CrossValidationOptions, cross_validate};
use crate::error::{ForecastError, Result};
use crate::evaluation::{Report, report};
use crate::model::{RegressorConfig, SequenceRegressor, TrainingHistory};
use crate::scaler::MinMaxScaler;
use crate::split::{DEFAULT_TRAIN_FRACTION, split, split_point};
use crate::window::{DEFAULT_SEQUENCE_LENGTH, FEATURE_COLUMNS, build_windows};

// Seed stream of the fold shuffle; model streams count up from 0.
const FOLD_SHUFFLE_STREAM: u64 = 1 << 32;

/// Which rows the min-max scaler is fitted on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMode {
    /// Only rows that feed training windows or training labels
    #[default]
    TrainRows,
    /// Every row, test period included
    FullSeries,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sequence_length: usize,
    pub train_fraction: f64,
    pub epochs: usize,
    pub batch_size: usize,
    pub scaling: ScalingMode,
    /// Master seed; sub-seeds are derived for the model and the fold shuffle
    /// unless those set their own
    pub seed: Option<u64>,
    /// `sequence_length` and `feature_count` here are overridden by the
    /// pipeline's own values
    pub regressor: RegressorConfig,
    /// Skipped when absent
    pub cross_validation: Option<CrossValidationOptions>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sequence_length: DEFAULT_SEQUENCE_LENGTH,
            train_fraction: DEFAULT_TRAIN_FRACTION,
            epochs: 100,
            batch_size: 16,
            scaling: ScalingMode::TrainRows,
            seed: None,
            regressor: RegressorConfig::default(),
            cross_validation: Some(CrossValidationOptions::default()),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: PipelineConfig =
            toml::from_str(text).map_err(|e| ForecastError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sequence_length == 0 {
            return Err(ForecastError::InvalidConfig(
                "sequence_length must be greater than 0".to_string(),
            ));
        }
        split_point(0, self.train_fraction)?;
        if self.epochs == 0 {
            return Err(ForecastError::InvalidConfig("epochs must be greater than 0".to_string()));
        }
        if self.batch_size == 0 {
            return Err(ForecastError::InvalidConfig(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        if let Some(cv) = &self.cross_validation {
            cv.validate_settings()?;
        }
        self.regressor_config(0).validate()
    }

    /// Regressor settings for model number `stream` of this run
    pub fn regressor_config(&self, stream: u64) -> RegressorConfig {
        let mut config = self.regressor.clone();
        config.sequence_length = self.sequence_length;
        config.feature_count = FEATURE_COLUMNS.len();
        config.seed = match config.seed {
            Some(s) => child_seed(Some(s), stream),
            None => child_seed(self.seed, stream),
        };
        config
    }

    fn cross_validation_options(&self) -> Option<CrossValidationOptions> {
        self.cross_validation.clone().map(|mut options| {
            if options.seed.is_none() {
                options.seed = child_seed(self.seed, FOLD_SHUFFLE_STREAM);
            }
            options
        })
    }
}

/// Everything a run produces
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub scaler: MinMaxScaler,
    pub train_size: usize,
    pub test_size: usize,
    pub history: TrainingHistory,
    /// `None` when the test segment is empty
    pub report: Option<Report>,
    /// Scaled test-segment forecasts and labels
    pub predictions: Vec<f64>,
    pub actuals: Vec<f64>,
    /// The same values in original index units
    pub predictions_original_scale: Vec<f64>,
    pub actuals_original_scale: Vec<f64>,
    pub cross_validation: Option<CrossValidation>,
}

/// Run the forecasting pipeline on a cleaned, unscaled table.
///
/// The table must hold the index column and both station-count columns,
/// in chronological row order.
pub fn run_pipeline(table: &Table, config: &PipelineConfig) -> Result<PipelineOutcome> {
    config.validate()?;

    let mut scaled_columns = vec![INDEX_VALUE];
    scaled_columns.extend_from_slice(&FEATURE_COLUMNS);
    for &name in &scaled_columns {
        if table.column(name).is_none() {
            return Err(ForecastError::Schema(format!(
                "required column '{}' not in table",
                name
            )));
        }
    }

    let n_rows = table.n_rows();
    let l = config.sequence_length;
    if n_rows < l + 1 {
        return Err(ForecastError::InsufficientData {
            needed: l + 1,
            got: n_rows,
        });
    }

    let fit_rows = match config.scaling {
        ScalingMode::TrainRows => {
            let p = split_point(n_rows - l, config.train_fraction)?;
            0..p + l
        }
        ScalingMode::FullSeries => 0..n_rows,
    };
    info!(
        "fitting scaler on rows {}..{} of {}",
        fit_rows.start, fit_rows.end, n_rows
    );
    let scaler = MinMaxScaler::fit(&table.slice_rows(fit_rows), &scaled_columns)?;
    let scaled = scaler.transform(table)?;

    let dataset = build_windows(&scaled, INDEX_VALUE, l)?;
    let (train, test) = split(&dataset, config.train_fraction)?;
    info!(
        "{} windows of length {}: {} train / {} test",
        dataset.len(),
        l,
        train.len(),
        test.len()
    );

    let mut model = SequenceRegressor::new(config.regressor_config(0))?;
    let validation = if test.is_empty() { None } else { Some(&test) };
    let history = model.fit(&train, validation, config.epochs, config.batch_size)?;

    let (predictions, actuals, report) = if test.is_empty() {
        warn!("test segment is empty; skipping evaluation");
        (Vec::new(), Vec::new(), None)
    } else {
        let predictions = model.predict(&test.windows)?.to_vec();
        let actuals = test.labels.to_vec();
        let report = report(&actuals, &predictions)?;
        info!("test metrics: {}", report.metrics);
        (predictions, actuals, Some(report))
    };

    let predictions_original_scale = scaler.inverse_transform_column(INDEX_VALUE, &predictions)?;
    let actuals_original_scale = scaler.inverse_transform_column(INDEX_VALUE, &actuals)?;

    let cross_validation = match config.cross_validation_options() {
        Some(options) => {
            let mut stream = 0;
            let factory = || {
                stream += 1;
                SequenceRegressor::new(config.regressor_config(stream))
            };
            Some(cross_validate(&dataset, factory, &options)?)
        }
        None => None,
    };

    Ok(PipelineOutcome {
        scaler,
        train_size: train.len(),
        test_size: test.len(),
        history,
        report,
        predictions,
        actuals,
        predictions_original_scale,
        actuals_original_scale,
        cross_validation,
    })
}
