use anyhow::{Context, Result};
use aqi_forecast::{CrossValidationOptions, PipelineConfig, RegressorConfig, ScalingMode};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for one forecasting run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Raw AQI bulletin CSV
    pub data_file: PathBuf,

    /// Directory receiving the results log, JSON summary and charts
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Results log file name, relative to `output_dir`
    #[serde(default = "default_results_file")]
    pub results_file: PathBuf,

    /// Draw the forecast and residual charts
    #[serde(default = "default_true")]
    pub plots: bool,

    /// Run k-fold cross-validation after the final model
    #[serde(default = "default_true")]
    pub cross_validate: bool,

    /// Also write the cleaned table, relative to `output_dir`
    #[serde(default)]
    pub cleaned_file: Option<PathBuf>,

    #[serde(default)]
    pub pipeline: PipelineConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_results_file() -> PathBuf {
    PathBuf::from("FORECAST.LOG")
}

fn default_true() -> bool {
    true
}

/// Command-line arguments
#[derive(Parser, Debug, Default)]
#[command(name = "forecast_aqi")]
#[command(about = "Daily air-quality index forecasting with a stacked LSTM")]
pub struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// AQI bulletin CSV
    #[arg(value_name = "FILENAME")]
    pub filename: Option<PathBuf>,

    /// Days of history per input window
    #[arg(long)]
    pub sequence_length: Option<usize>,

    /// Training epochs of the final model
    #[arg(long)]
    pub epochs: Option<usize>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Leading share of windows used for training, in (0, 1]
    #[arg(long)]
    pub train_fraction: Option<f64>,

    /// Cross-validation folds
    #[arg(long)]
    pub folds: Option<usize>,

    /// Training epochs per cross-validation fold
    #[arg(long)]
    pub cv_epochs: Option<usize>,

    /// Skip cross-validation
    #[arg(long)]
    pub no_cv: bool,

    /// Fit the scaler on the whole series instead of the training rows
    #[arg(long)]
    pub full_series_scaling: bool,

    /// LSTM layer widths (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub lstm_units: Option<Vec<usize>>,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Do not draw charts
    #[arg(long)]
    pub no_plots: bool,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        if !config.cross_validate {
            config.pipeline.cross_validation = None;
        }

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from command-line arguments
    pub fn from_args(args: &Args) -> Result<Self> {
        let defaults = PipelineConfig::default();

        let cross_validation = if args.no_cv {
            None
        } else {
            let base = CrossValidationOptions::default();
            Some(CrossValidationOptions {
                k: args.folds.unwrap_or(base.k),
                epochs: args.cv_epochs.unwrap_or(base.epochs),
                batch_size: args.batch_size.unwrap_or(base.batch_size),
                ..base
            })
        };

        let mut regressor = RegressorConfig::default();
        if let Some(units) = &args.lstm_units {
            regressor = regressor.with_lstm_units(units.clone());
        }

        let pipeline = PipelineConfig {
            sequence_length: args.sequence_length.unwrap_or(defaults.sequence_length),
            train_fraction: args.train_fraction.unwrap_or(defaults.train_fraction),
            epochs: args.epochs.unwrap_or(defaults.epochs),
            batch_size: args.batch_size.unwrap_or(defaults.batch_size),
            scaling: if args.full_series_scaling {
                ScalingMode::FullSeries
            } else {
                ScalingMode::TrainRows
            },
            seed: args.seed,
            regressor,
            cross_validation,
        };

        let config = Config {
            data_file: args
                .filename
                .clone()
                .ok_or_else(|| anyhow::anyhow!("filename is required"))?,
            output_dir: args.output_dir.clone().unwrap_or_else(default_output_dir),
            results_file: default_results_file(),
            plots: !args.no_plots,
            cross_validate: !args.no_cv,
            cleaned_file: None,
            pipeline,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from either file or command-line arguments
    pub fn load(args: &Args) -> Result<Self> {
        if let Some(config_path) = &args.config {
            let mut config = Self::from_file(config_path)?;
            if let Some(dir) = &args.output_dir {
                config.output_dir = dir.clone();
            }
            if args.no_plots {
                config.plots = false;
            }
            Ok(config)
        } else {
            Self::from_args(args)
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.data_file.as_os_str().is_empty() {
            anyhow::bail!("data_file must not be empty");
        }
        if self.results_file.as_os_str().is_empty() {
            anyhow::bail!("results_file must not be empty");
        }
        self.pipeline
            .validate()
            .context("Invalid pipeline configuration")?;
        Ok(())
    }

    pub fn results_path(&self) -> PathBuf {
        self.output_dir.join(&self.results_file)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join("summary.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn args_for(file: &str) -> Args {
        Args {
            filename: Some(PathBuf::from(file)),
            ..Args::default()
        }
    }

    #[test]
    fn test_from_args_defaults() {
        let config = Config::from_args(&args_for("aqi.csv")).unwrap();
        assert_eq!(config.data_file, PathBuf::from("aqi.csv"));
        assert_eq!(config.results_path(), PathBuf::from("./FORECAST.LOG"));
        assert!(config.plots);
        assert_eq!(config.pipeline.sequence_length, 20);
        assert_eq!(config.pipeline.epochs, 100);
        assert_eq!(config.pipeline.cross_validation.as_ref().unwrap().k, 5);
    }

    #[test]
    fn test_from_args_overrides() {
        let args = Args {
            epochs: Some(3),
            folds: Some(4),
            lstm_units: Some(vec![8, 4]),
            full_series_scaling: true,
            no_plots: true,
            seed: Some(9),
            ..args_for("aqi.csv")
        };
        let config = Config::from_args(&args).unwrap();
        assert_eq!(config.pipeline.epochs, 3);
        assert_eq!(config.pipeline.cross_validation.unwrap().k, 4);
        assert_eq!(config.pipeline.regressor.lstm_units, vec![8, 4]);
        assert_eq!(config.pipeline.scaling, ScalingMode::FullSeries);
        assert_eq!(config.pipeline.seed, Some(9));
        assert!(!config.plots);

        let no_cv = Args {
            no_cv: true,
            ..args_for("aqi.csv")
        };
        assert!(Config::from_args(&no_cv).unwrap().pipeline.cross_validation.is_none());
    }

    #[test]
    fn test_from_args_validation() {
        assert!(Config::from_args(&Args::default()).is_err());

        let bad_fraction = Args {
            train_fraction: Some(0.0),
            ..args_for("aqi.csv")
        };
        assert!(Config::from_args(&bad_fraction).is_err());

        let one_fold = Args {
            folds: Some(1),
            ..args_for("aqi.csv")
        };
        assert!(Config::from_args(&one_fold).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
data_file = "data/aqi.csv"
output_dir = "out"
plots = false

[pipeline]
sequence_length = 10
epochs = 5
seed = 42

[pipeline.regressor]
lstm_units = [32, 16]

[pipeline.cross_validation]
k = 3
fold_mode = "reuse"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.results_path(), PathBuf::from("out/FORECAST.LOG"));
        assert_eq!(config.summary_path(), PathBuf::from("out/summary.json"));
        assert!(!config.plots);
        assert_eq!(config.pipeline.sequence_length, 10);
        assert_eq!(config.pipeline.batch_size, 16);
        assert_eq!(config.pipeline.regressor.lstm_units, vec![32, 16]);
        let cv = config.pipeline.cross_validation.unwrap();
        assert_eq!(cv.k, 3);
        assert_eq!(cv.fold_mode, aqi_forecast::FoldMode::Reuse);
    }

    #[test]
    fn test_from_file_rejects_bad_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "data_file = \"aqi.csv\"\n[pipeline]\ntrain_fraction = 2.0").unwrap();
        assert!(Config::from_file(file.path()).is_err());

        assert!(Config::from_file("does/not/exist.toml").is_err());
    }

    #[test]
    fn test_from_file_rejects_bad_cross_validation() {
        for section in ["k = 1", "epochs = 0", "batch_size = 0"] {
            let mut file = NamedTempFile::new().unwrap();
            writeln!(
                file,
                "data_file = \"aqi.csv\"\n[pipeline.cross_validation]\n{}",
                section
            )
            .unwrap();
            let err = Config::from_file(file.path()).unwrap_err();
            assert!(format!("{:#}", err).contains("must be"));
        }
    }

    #[test]
    fn test_cross_validation_switch() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "data_file = \"aqi.csv\"\ncross_validate = false").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert!(config.pipeline.cross_validation.is_none());
        assert!(config.plots);
    }
}
