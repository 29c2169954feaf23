//! Daily air-quality index forecasting from station-participation counts.
//!
//! The crate turns a cleaned table into fixed-length windows, splits them
//! chronologically, trains a stacked LSTM regressor and reports fit quality
//! plus k-fold cross-validated loss.
//!
//! ```rust,no_run
//! use aqi_forecast::{PipelineConfig, run_pipeline};
//!
//! fn main() -> anyhow::Result<()> {
//!     let table = table_io::read_aqi_csv("data/aqi.csv")?;
//!     let outcome = run_pipeline(&table, &PipelineConfig::default())?;
//!     if let Some(report) = &outcome.report {
//!         println!("{}", report.metrics);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cross_validation;
pub mod error;
pub mod evaluation;
pub mod model;
pub mod pipeline;
pub mod scaler;
pub mod split;
pub mod window;

pub use cross_validation::{
    CrossValidation, CrossValidationOptions, FoldMode, cross_validate, fold_assignment,
};
pub use error::{ForecastError, Result};
pub use evaluation::{Metrics, Report, report};
pub use model::{
    EpochLoss, RegressorConfig, RegressorState, SequenceModel, SequenceRegressor,
    TrainingHistory,
};
pub use pipeline::{PipelineConfig, PipelineOutcome, ScalingMode, run_pipeline};
pub use scaler::MinMaxScaler;
pub use split::{DEFAULT_TRAIN_FRACTION, split, split_point};
pub use window::{DEFAULT_SEQUENCE_LENGTH, Dataset, FEATURE_COLUMNS, build_windows, build_windows_with};

pub use table_io::Table;
