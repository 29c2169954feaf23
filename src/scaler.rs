use serde::{Deserialize, Serialize};
use stats::find_min_max;
use table_io::Table;

use crate::error::{ForecastError, Result};

/// Fitted min-max transform, mapping each fitted column's training range onto [0, 1].
///
/// The scaler is a plain value: fitting returns a new one and transforming
/// returns a new table, so the rows used to fit it are explicit at the call
/// site. Values outside the fitted range map outside [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub columns: Vec<String>,
    pub mins: Vec<f64>,
    pub maxs: Vec<f64>,
}

impl MinMaxScaler {
    /// Fit on every row of `table` for the named columns
    pub fn fit(table: &Table, columns: &[&str]) -> Result<Self> {
        if table.is_empty() {
            return Err(ForecastError::EmptyInput(
                "cannot fit scaler on an empty table".to_string(),
            ));
        }
        let mut mins = Vec::with_capacity(columns.len());
        let mut maxs = Vec::with_capacity(columns.len());
        for &name in columns {
            let values = table.column(name).ok_or_else(|| {
                ForecastError::Schema(format!("scaler column '{}' not in table", name))
            })?;
            let (lo, hi) = find_min_max(values);
            mins.push(lo);
            maxs.push(hi);
        }
        Ok(Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            mins,
            maxs,
        })
    }

    // A constant column has zero range; it is shifted, not stretched.
    fn range(&self, i: usize) -> f64 {
        let r = self.maxs[i] - self.mins[i];
        if r == 0.0 { 1.0 } else { r }
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ForecastError::Schema(format!("column '{}' was not fitted", name)))
    }

    /// Scale the fitted columns of `table`; other columns pass through unchanged
    pub fn transform(&self, table: &Table) -> Result<Table> {
        for name in &self.columns {
            if table.column(name).is_none() {
                return Err(ForecastError::Schema(format!(
                    "fitted column '{}' not in table",
                    name
                )));
            }
        }

        let mut out = Vec::with_capacity(table.n_cols());
        for name in table.names() {
            let values = table.column(name).unwrap_or_default();
            let scaled = match self.columns.iter().position(|c| c == name) {
                Some(i) => {
                    let (lo, r) = (self.mins[i], self.range(i));
                    values.iter().map(|&v| (v - lo) / r).collect()
                }
                None => values.to_vec(),
            };
            out.push((name.clone(), scaled));
        }
        Ok(Table::new(out)?)
    }

    /// Map scaled values of one fitted column back to original units
    pub fn inverse_transform_column(&self, name: &str, values: &[f64]) -> Result<Vec<f64>> {
        let i = self.position(name)?;
        let (lo, r) = (self.mins[i], self.range(i));
        Ok(values.iter().map(|&v| v * r + lo).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(vec![
            ("x", vec![10.0, 20.0, 30.0, 50.0]),
            ("c", vec![4.0, 4.0, 4.0, 4.0]),
            ("other", vec![1.0, 2.0, 3.0, 4.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_fit_transform() {
        let t = table();
        let scaler = MinMaxScaler::fit(&t, &["x", "c"]).unwrap();
        let scaled = scaler.transform(&t).unwrap();

        assert_eq!(scaled.column("x").unwrap(), &[0.0, 0.25, 0.5, 1.0]);
        assert_eq!(scaled.column("c").unwrap(), &[0.0, 0.0, 0.0, 0.0]);
        assert_eq!(scaled.column("other").unwrap(), t.column("other").unwrap());
    }

    #[test]
    fn test_fit_on_leading_rows_only() {
        let t = table();
        let scaler = MinMaxScaler::fit(&t.slice_rows(0..2), &["x"]).unwrap();
        let scaled = scaler.transform(&t).unwrap();

        // later rows fall outside the training range
        assert_eq!(scaled.column("x").unwrap(), &[0.0, 1.0, 2.0, 4.0]);
    }

    #[test]
    fn test_inverse_transform() {
        let t = table();
        let scaler = MinMaxScaler::fit(&t, &["x"]).unwrap();
        let back = scaler.inverse_transform_column("x", &[0.0, 0.5, 1.0]).unwrap();
        assert_eq!(back, vec![10.0, 30.0, 50.0]);

        assert!(scaler.inverse_transform_column("other", &[0.1]).is_err());
    }

    #[test]
    fn test_unknown_column() {
        let err = MinMaxScaler::fit(&table(), &["missing"]).unwrap_err();
        assert!(matches!(err, ForecastError::Schema(_)));
    }
}
