use crate::error::{ForecastError, Result};
use crate::window::Dataset;

pub const DEFAULT_TRAIN_FRACTION: f64 = 0.8;

/// Index of the first test example: `floor(train_fraction * n)`.
///
/// `train_fraction` must lie in `(0, 1]`.
pub fn split_point(n: usize, train_fraction: f64) -> Result<usize> {
    if !(train_fraction > 0.0 && train_fraction <= 1.0) {
        return Err(ForecastError::InvalidConfig(format!(
            "train_fraction must be in (0, 1], got {}",
            train_fraction
        )));
    }
    Ok(((train_fraction * n as f64).floor() as usize).min(n))
}

/// Chronological split: leading examples train, trailing examples test.
///
/// No shuffling, so no test example precedes a training example in time.
pub fn split(dataset: &Dataset, train_fraction: f64) -> Result<(Dataset, Dataset)> {
    let n = dataset.len();
    let p = split_point(n, train_fraction)?;
    Ok((dataset.slice(0, p), dataset.slice(p, n)))
}
