use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::{debug, warn};

use crate::table::{Table, TableError};
use crate::{
    INDEX_VALUE, RAW_INDEX_COLUMN, RAW_STATIONS_COLUMN, STATIONS_PARTICIPATED, TOTAL_STATIONS,
};

/// Parse a `"<participated>/<total>"` station count.
///
/// Returns `None` for anything that is not two numbers around one slash.
pub fn parse_station_ratio(field: &str) -> Option<(f64, f64)> {
    let (num, den) = field.split_once('/')?;
    let num = num.trim().parse::<f64>().ok()?;
    let den = den.trim().parse::<f64>().ok()?;
    if num.is_finite() && den.is_finite() {
        Some((num, den))
    } else {
        None
    }
}

/// Coerce an index field to a number; blanks and junk become `None`
pub fn parse_index_value(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Read the daily index file and produce the cleaned numeric table.
///
/// The returned table has the columns [`INDEX_VALUE`],
/// [`STATIONS_PARTICIPATED`] and [`TOTAL_STATIONS`], in file order.
/// Rows with a missing or unparseable value in either used column are dropped.
pub fn read_aqi_csv<P: AsRef<Path>>(path: P) -> Result<Table, TableError> {
    let file = File::open(path.as_ref())?;
    debug!("reading {}", path.as_ref().display());
    read_aqi_from(BufReader::new(file))
}

/// Same as [`read_aqi_csv`] over any reader
pub fn read_aqi_from<R: Read>(reader: R) -> Result<Table, TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    };
    let index_col = find(RAW_INDEX_COLUMN)?;
    let ratio_col = find(RAW_STATIONS_COLUMN)?;

    let mut index_values = Vec::new();
    let mut participated = Vec::new();
    let mut total = Vec::new();
    let mut dropped = 0usize;

    for record in reader.records() {
        let record = record?;
        let value = record.get(index_col).and_then(parse_index_value);
        let ratio = record.get(ratio_col).and_then(parse_station_ratio);

        match (value, ratio) {
            (Some(v), Some((p, t))) => {
                index_values.push(v);
                participated.push(p);
                total.push(t);
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!("dropped {} rows with missing or malformed values", dropped);
    }
    if index_values.is_empty() {
        return Err(TableError::Empty);
    }

    Table::new(vec![
        (INDEX_VALUE, index_values),
        (STATIONS_PARTICIPATED, participated),
        (TOTAL_STATIONS, total),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str =
        "date,Index Value,Air Quality,No. of Stations Participated/ Total Stations";

    #[test]
    fn test_parse_station_ratio() {
        assert_eq!(parse_station_ratio("12/20"), Some((12.0, 20.0)));
        assert_eq!(parse_station_ratio(" 3 / 4 "), Some((3.0, 4.0)));
        assert_eq!(parse_station_ratio("12"), None);
        assert_eq!(parse_station_ratio("a/4"), None);
        assert_eq!(parse_station_ratio(""), None);
    }

    #[test]
    fn test_read_aqi_csv_cleans_rows() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        writeln!(file, "2020-01-01,150,Moderate,12/20").unwrap();
        writeln!(file, "2020-01-02,NA,Moderate,12/20").unwrap();
        writeln!(file, "2020-01-03,180,Poor,").unwrap();
        writeln!(file, "2020-01-04,\"201\",Poor,15/20").unwrap();

        let table = read_aqi_csv(file.path()).unwrap();
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.column(INDEX_VALUE).unwrap(), &[150.0, 201.0]);
        assert_eq!(table.column(STATIONS_PARTICIPATED).unwrap(), &[12.0, 15.0]);
        assert_eq!(table.column(TOTAL_STATIONS).unwrap(), &[20.0, 20.0]);
    }

    #[test]
    fn test_missing_header() {
        let data = "date,Index Value\n2020-01-01,150\n";
        let result = read_aqi_from(data.as_bytes());
        assert!(matches!(result, Err(TableError::MissingColumn(_))));
    }

    #[test]
    fn test_no_usable_rows() {
        let data = format!("{}\n2020-01-01,,Good,1/2\n", HEADER);
        let result = read_aqi_from(data.as_bytes());
        assert!(matches!(result, Err(TableError::Empty)));
    }
}
