//! Regressor configuration

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};
use crate::window::{DEFAULT_SEQUENCE_LENGTH, FEATURE_COLUMNS};

/// Architecture and optimizer settings of the sequence regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressorConfig {
    /// Time steps per input window
    pub sequence_length: usize,
    /// Features per time step
    pub feature_count: usize,
    /// Widths of the stacked LSTM layers, input side first
    pub lstm_units: Vec<usize>,
    /// Dropout rate after every LSTM layer
    pub dropout: f64,
    /// Width of the ReLU layer before the output unit
    pub dense_units: usize,
    /// Adam base learning rate
    pub learning_rate: f64,
    /// Seed for initialisation, dropout and batch order; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for RegressorConfig {
    fn default() -> Self {
        Self {
            sequence_length: DEFAULT_SEQUENCE_LENGTH,
            feature_count: FEATURE_COLUMNS.len(),
            lstm_units: vec![100, 50, 50],
            dropout: 0.2,
            dense_units: 25,
            learning_rate: 0.001,
            seed: None,
        }
    }
}

impl RegressorConfig {
    pub fn new(sequence_length: usize, feature_count: usize) -> Self {
        Self {
            sequence_length,
            feature_count,
            ..Self::default()
        }
    }

    /// Same layer layout at a fraction of the width, for quick runs and tests
    pub fn compact(sequence_length: usize, feature_count: usize) -> Self {
        Self::new(sequence_length, feature_count)
            .with_lstm_units(vec![8, 4, 4])
            .with_dense_units(4)
    }

    pub fn with_lstm_units(mut self, units: Vec<usize>) -> Self {
        self.lstm_units = units;
        self
    }

    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn with_dense_units(mut self, units: usize) -> Self {
        self.dense_units = units;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.sequence_length == 0 {
            return Err(invalid("sequence_length must be greater than 0"));
        }
        if self.feature_count == 0 {
            return Err(invalid("feature_count must be greater than 0"));
        }
        if self.lstm_units.is_empty() || self.lstm_units.contains(&0) {
            return Err(invalid("lstm_units must list at least one non-zero width"));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ForecastError::InvalidConfig(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        if self.dense_units == 0 {
            return Err(invalid("dense_units must be greater than 0"));
        }
        if !(self.learning_rate > 0.0) {
            return Err(invalid("learning_rate must be positive"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> ForecastError {
    ForecastError::InvalidConfig(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RegressorConfig::default();
        assert_eq!(config.sequence_length, 20);
        assert_eq!(config.feature_count, 2);
        assert_eq!(config.lstm_units, vec![100, 50, 50]);
        assert_eq!(config.dropout, 0.2);
        assert_eq!(config.dense_units, 25);
        assert_eq!(config.learning_rate, 0.001);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert!(RegressorConfig::new(0, 2).validate().is_err());
        assert!(RegressorConfig::new(5, 2).with_lstm_units(vec![]).validate().is_err());
        assert!(RegressorConfig::new(5, 2).with_lstm_units(vec![4, 0]).validate().is_err());
        assert!(RegressorConfig::new(5, 2).with_dropout(1.0).validate().is_err());
        assert!(RegressorConfig::new(5, 2).with_learning_rate(0.0).validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config: RegressorConfig = toml::from_str("lstm_units = [16, 8]\nseed = 3").unwrap();
        assert_eq!(config.lstm_units, vec![16, 8]);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.dense_units, 25);
    }
}
