use thiserror::Error;

/// Failures raised by the forecasting core.
///
/// All of these are validation failures: they are reported at once and
/// never retried. Numerical divergence during training is not classified here.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Missing or malformed required column
    #[error("schema error: {0}")]
    Schema(String),

    /// Fewer rows than `sequence_length + 1`
    #[error("insufficient data: need at least {needed} rows, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Parameter out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Mismatched dimensions between model, inputs and labels
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// Zero-length input to fit/predict/evaluate/report
    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error(transparent)]
    Table(#[from] table_io::TableError),
}

pub type Result<T> = std::result::Result<T, ForecastError>;
