use std::ops::Range;

use thiserror::Error;

/// Errors raised while building or reading a table
#[derive(Debug, Error)]
pub enum TableError {
    #[error("cannot open data file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("required column '{0}' not found")]
    MissingColumn(String),

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("column '{name}' has {got} rows, expected {expected}")]
    RaggedColumn {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("no usable rows in data file")]
    Empty,
}

/// Named numeric columns of equal length, stored column-major.
///
/// Row order is chronological order; nothing in this crate reorders rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl Table {
    /// Build a table from `(name, values)` pairs
    pub fn new<S: Into<String>>(columns: Vec<(S, Vec<f64>)>) -> Result<Self, TableError> {
        let mut table = Table {
            names: Vec::with_capacity(columns.len()),
            columns: Vec::with_capacity(columns.len()),
        };
        for (name, values) in columns {
            table = table.with_column(name, values)?;
        }
        Ok(table)
    }

    /// Append a column, checking its name is new and its length matches
    pub fn with_column<S: Into<String>>(
        mut self,
        name: S,
        values: Vec<f64>,
    ) -> Result<Self, TableError> {
        let name = name.into();
        if self.names.iter().any(|n| *n == name) {
            return Err(TableError::DuplicateColumn(name));
        }
        if !self.columns.is_empty() && values.len() != self.n_rows() {
            return Err(TableError::RaggedColumn {
                name,
                expected: self.n_rows(),
                got: values.len(),
            });
        }
        self.names.push(name);
        self.columns.push(values);
        Ok(self)
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.len())
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Values of the named column, if present
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Like [`Table::column`] but reports the missing name
    pub fn require(&self, name: &str) -> Result<&[f64], TableError> {
        self.column(name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    /// Copy of the rows in `rows`, all columns kept.
    /// The range is clamped to the table length.
    pub fn slice_rows(&self, rows: Range<usize>) -> Table {
        let end = rows.end.min(self.n_rows());
        let start = rows.start.min(end);
        Table {
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| c[start..end].to_vec())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(vec![
            ("a", vec![1.0, 2.0, 3.0]),
            ("b", vec![10.0, 20.0, 30.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_column_lookup() {
        let t = sample();
        assert_eq!(t.n_rows(), 3);
        assert_eq!(t.n_cols(), 2);
        assert_eq!(t.column("b").unwrap(), &[10.0, 20.0, 30.0]);
        assert!(t.column("c").is_none());
        assert!(matches!(t.require("c"), Err(TableError::MissingColumn(n)) if n == "c"));
    }

    #[test]
    fn test_ragged_and_duplicate_columns_rejected() {
        let ragged = Table::new(vec![("a", vec![1.0, 2.0]), ("b", vec![1.0])]);
        assert!(matches!(ragged, Err(TableError::RaggedColumn { got: 1, .. })));

        let dup = Table::new(vec![("a", vec![1.0]), ("a", vec![2.0])]);
        assert!(matches!(dup, Err(TableError::DuplicateColumn(_))));
    }

    #[test]
    fn test_slice_rows_keeps_order() {
        let t = sample().slice_rows(1..5);
        assert_eq!(t.n_rows(), 2);
        assert_eq!(t.column("a").unwrap(), &[2.0, 3.0]);
        assert_eq!(t.names(), sample().names());
    }
}
