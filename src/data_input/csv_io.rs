// src/data_input/csv_io.rs

use csv::{ReaderBuilder, Writer};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::{Error, Result};

/// Reads typed rows, failing with `MissingColumn` if a `required` header is absent.
/// Rows that do not deserialize are skipped with a warning.
pub fn read_rows<T, R>(reader: R, name: &str, required: &[&str]) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader.headers()?.clone();
    debug!("Headers found in {}: {:?}", name, headers);

    if let Some(column) = required.iter().find(|col| !headers.iter().any(|h| h == **col)) {
        return Err(Error::MissingColumn {
            file: name.to_string(),
            column: column.to_string(),
        });
    }

    let mut rows = Vec::new();
    for (row_index, result) in reader.deserialize::<T>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => warn!("{}: skipping row {} ({})", name, row_index + 1, e),
        }
    }
    Ok(rows)
}

pub fn read_rows_from_file<T: DeserializeOwned>(path: &Path, required: &[&str]) -> Result<Vec<T>> {
    let file = File::open(path)?;
    read_rows(BufReader::new(file), &path.display().to_string(), required)
}

/// Writes rows with a header derived from the row type's field names.
pub fn write_rows<'a, T, W, I>(writer: W, rows: I) -> Result<()>
where
    T: Serialize + 'a,
    W: Write,
    I: IntoIterator<Item = &'a T>,
{
    let mut writer = Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_rows_to_file<'a, T, I>(path: &Path, rows: I) -> Result<()>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let file = File::create(path)?;
    write_rows(BufWriter::new(file), rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Point {
        position: f64,
        value: f64,
    }

    #[test]
    fn test_write_then_read_rows() {
        let points = vec![
            Point { position: 0.0, value: 1.5 },
            Point { position: 0.1, value: -2.0 },
        ];
        let mut buffer = Vec::new();
        write_rows(&mut buffer, &points).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("position,value\n"));

        let read: Vec<Point> = read_rows(buffer.as_slice(), "points", &["position", "value"]).unwrap();
        assert_eq!(read, points);
    }

    #[test]
    fn test_missing_required_header() {
        let csv = "position,other\n0.0,1.0\n";
        let result: Result<Vec<Point>> = read_rows(csv.as_bytes(), "points.csv", &["position", "value"]);
        match result {
            Err(Error::MissingColumn { file, column }) => {
                assert_eq!(file, "points.csv");
                assert_eq!(column, "value");
            }
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let csv = "position,value\n0.0,1.0\nabc,2.0\n0.2,3.0\n";
        let read: Vec<Point> = read_rows(csv.as_bytes(), "points", &["position"]).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[1].value, 3.0);
    }
}

// src/data_input/csv_io.rs
