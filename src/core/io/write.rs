use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use crate::table::{Table, TableError};

/// Writes contents to a file, creating parent directories if they don't exist.
pub fn write_file<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(contents.as_ref())?;
    Ok(())
}

/// Write a table as CSV with a header row, creating parent directories
pub fn write_table_csv<P: AsRef<Path>>(path: P, table: &Table) -> Result<(), TableError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::WriterBuilder::new().from_writer(File::create(path)?);

    wtr.write_record(table.names())?;
    let columns: Vec<&[f64]> = table
        .names()
        .iter()
        .filter_map(|n| table.column(n))
        .collect();
    for row in 0..table.n_rows() {
        wtr.write_record(columns.iter().map(|c| c[row].to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("subdir/test.txt");
        let content = "Hello, world!";

        write_file(&file_path, content).unwrap();

        let read_content = fs::read_to_string(file_path).unwrap();
        assert_eq!(read_content, content);
    }

    #[test]
    fn test_write_table_csv() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("out/pred.csv");
        let table = Table::new(vec![("actual", vec![1.0, 2.5]), ("predicted", vec![0.5, 2.0])])
            .unwrap();

        write_table_csv(&file_path, &table).unwrap();

        let text = fs::read_to_string(file_path).unwrap();
        assert_eq!(text, "actual,predicted\n1,0.5\n2.5,2\n");
    }

    #[test]
    fn test_write_table_csv_quotes_awkward_names() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("quoted.csv");
        let table = Table::new(vec![
            ("Stations, participated", vec![20.0, 21.0]),
            ("Index \"raw\"", vec![101.0, 99.5]),
        ])
        .unwrap();

        write_table_csv(&file_path, &table).unwrap();

        let mut reader = csv::Reader::from_path(&file_path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 2);
        assert_eq!(&headers[0], "Stations, participated");
        assert_eq!(&headers[1], "Index \"raw\"");

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][1], "99.5");
    }
}
