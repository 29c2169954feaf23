use std::fmt;

use serde::Serialize;

use crate::error::{ForecastError, Result};

/// Point-forecast accuracy of one prediction run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    /// NaN when the actual values are constant
    pub r2: f64,
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MSE: {:.4}  RMSE: {:.4}  MAE: {:.4}  R2: {:.4}",
            self.mse, self.rmse, self.mae, self.r2
        )
    }
}

/// Metrics plus the residual series `y_true - y_pred`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub metrics: Metrics,
    pub residuals: Vec<f64>,
}

/// Compare actual and predicted values.
///
/// # Arguments
/// * `y_true` - Observed values
/// * `y_pred` - Forecasts, index-aligned with `y_true`
pub fn report(y_true: &[f64], y_pred: &[f64]) -> Result<Report> {
    if y_true.len() != y_pred.len() {
        return Err(ForecastError::Shape(format!(
            "{} actual values but {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(ForecastError::EmptyInput("nothing to evaluate".to_string()));
    }

    let residuals: Vec<f64> = y_true.iter().zip(y_pred).map(|(t, p)| t - p).collect();

    let mse = stats::mean_squared_diff(y_true, y_pred);
    let mae = stats::mean_abs_diff(y_true, y_pred);
    let ss_res: f64 = residuals.iter().map(|r| r * r).sum();
    // r2 is undefined for constant actuals, even when sum_sq_dev rounds above 0
    let constant = y_true.iter().all(|&v| v == y_true[0]);
    let r2 = if constant {
        f64::NAN
    } else {
        1.0 - ss_res / stats::sum_sq_dev(y_true)
    };

    Ok(Report {
        metrics: Metrics {
            mse,
            rmse: mse.sqrt(),
            mae,
            r2,
        },
        residuals,
    })
}
