use log::debug;
use ndarray::{Array1, Array3, Axis, s};
use table_io::{STATIONS_PARTICIPATED, TOTAL_STATIONS, Table};

use crate::error::{ForecastError, Result};

/// Window length used when the caller does not choose one
pub const DEFAULT_SEQUENCE_LENGTH: usize = 20;

/// Per-timestep features fed to the model, in window column order
pub const FEATURE_COLUMNS: [&str; 2] = [STATIONS_PARTICIPATED, TOTAL_STATIONS];

/// Windows `(n, sequence_length, n_features)` index-aligned with labels `(n)`.
///
/// Window `i` covers rows `[i, i + L)` of the source table and label `i` is the
/// target at row `i + L`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub windows: Array3<f64>,
    pub labels: Array1<f64>,
}

impl Dataset {
    /// Pair windows with labels, checking that the counts agree
    pub fn new(windows: Array3<f64>, labels: Array1<f64>) -> Result<Self> {
        if windows.len_of(Axis(0)) != labels.len() {
            return Err(ForecastError::Shape(format!(
                "{} windows but {} labels",
                windows.len_of(Axis(0)),
                labels.len()
            )));
        }
        Ok(Self { windows, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn sequence_length(&self) -> usize {
        self.windows.len_of(Axis(1))
    }

    pub fn n_features(&self) -> usize {
        self.windows.len_of(Axis(2))
    }

    /// Contiguous run of examples, order preserved
    pub fn slice(&self, start: usize, end: usize) -> Dataset {
        Dataset {
            windows: self.windows.slice(s![start..end, .., ..]).to_owned(),
            labels: self.labels.slice(s![start..end]).to_owned(),
        }
    }

    /// Examples at `indices`, in the order given
    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            windows: self.windows.select(Axis(0), indices),
            labels: self.labels.select(Axis(0), indices),
        }
    }
}

/// Build `(window, next-step label)` pairs from the default feature pair.
///
/// Rows are taken to be contiguous in time; gaps left by upstream row
/// removal are not detected.
pub fn build_windows(table: &Table, target_column: &str, sequence_length: usize) -> Result<Dataset> {
    build_windows_with(table, target_column, &FEATURE_COLUMNS, sequence_length)
}

/// [`build_windows`] with an explicit list of feature columns
pub fn build_windows_with(
    table: &Table,
    target_column: &str,
    feature_columns: &[&str],
    sequence_length: usize,
) -> Result<Dataset> {
    if sequence_length == 0 {
        return Err(ForecastError::InvalidConfig(
            "sequence_length must be greater than 0".to_string(),
        ));
    }
    if feature_columns.is_empty() {
        return Err(ForecastError::InvalidConfig(
            "at least one feature column is required".to_string(),
        ));
    }

    let target = table.column(target_column).ok_or_else(|| {
        ForecastError::Schema(format!("target column '{}' not in table", target_column))
    })?;
    let features = feature_columns
        .iter()
        .map(|&name| {
            table.column(name).ok_or_else(|| {
                ForecastError::Schema(format!("feature column '{}' not in table", name))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let n_rows = table.n_rows();
    if n_rows < sequence_length + 1 {
        return Err(ForecastError::InsufficientData {
            needed: sequence_length + 1,
            got: n_rows,
        });
    }

    let n_windows = n_rows - sequence_length;
    let windows = Array3::from_shape_fn(
        (n_windows, sequence_length, features.len()),
        |(i, t, f)| features[f][i + t],
    );
    let labels = Array1::from_shape_fn(n_windows, |i| target[i + sequence_length]);

    debug!(
        "built {} windows of shape ({}, {})",
        n_windows,
        sequence_length,
        features.len()
    );
    Dataset::new(windows, labels)
}
