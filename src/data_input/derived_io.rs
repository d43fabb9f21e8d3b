// src/data_input/derived_io.rs

use log::info;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::axis_names::{
    CUMULATIVE_PITCH_COLUMN, CUMULATIVE_ROLL_COLUMN, GYRO_MAGNITUDE_COLUMN, POSITION_COLUMN, TILT_COLUMN,
};
use crate::data_analysis::derived_series::{DerivedRow, DerivedSeries};
use crate::data_input::csv_io::{read_rows, write_rows, write_rows_to_file};
use crate::data_input::log_parser::session_name;
use crate::{Error, Result};

/// Suffix appended to the session name of a processed file.
pub const DERIVED_FILE_SUFFIX: &str = "_add";

const REQUIRED_COLUMNS: [&str; 5] = [
    POSITION_COLUMN,
    GYRO_MAGNITUDE_COLUMN,
    CUMULATIVE_PITCH_COLUMN,
    CUMULATIVE_ROLL_COLUMN,
    TILT_COLUMN,
];

/// `<dir>/<name>_add.csv`
pub fn derived_file_path(output_dir: &Path, name: &str) -> PathBuf {
    output_dir.join(format!("{name}{DERIVED_FILE_SUFFIX}.csv"))
}

pub fn write_derived<W: Write>(writer: W, series: &DerivedSeries) -> Result<()> {
    write_rows(writer, &series.rows)
}

/// Writes a processed session next to its siblings and returns the file path.
pub fn write_derived_file(output_dir: &Path, series: &DerivedSeries) -> Result<PathBuf> {
    let path = derived_file_path(output_dir, &series.name);
    write_rows_to_file(&path, &series.rows)?;
    info!("{}: wrote {} rows to {}", series.name, series.len(), path.display());
    Ok(path)
}

pub fn read_derived<R: Read>(reader: R, name: &str) -> Result<DerivedSeries> {
    let rows: Vec<DerivedRow> = read_rows(reader, name, &REQUIRED_COLUMNS)?;
    if rows.is_empty() {
        return Err(Error::EmptySession(name.to_string()));
    }
    Ok(DerivedSeries {
        name: name.to_string(),
        rows,
    })
}

/// Reads a processed session; the `_add` suffix is stripped from the name.
pub fn read_derived_file(path: &Path) -> Result<DerivedSeries> {
    let stem = session_name(path);
    let name = stem.strip_suffix(DERIVED_FILE_SUFFIX).unwrap_or(&stem);
    let file = std::fs::File::open(path)?;
    read_derived(std::io::BufReader::new(file), name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_written_file_reads_back() {
        let series = DerivedSeries {
            name: "normal_1".to_string(),
            rows: vec![DerivedRow {
                time: 0.5,
                accel_y: 0.1,
                gyro_x: 0.3,
                gyro_y: 0.0,
                gyro_z: 0.4,
                pitch: 1.0,
                roll: f64::NAN,
                position: 1.25,
                gyro: 0.5,
                cumulative_pitch: 0.2,
                cumulative_roll: 0.0,
                tilt: 0.2,
            }],
        };
        let mut buffer = Vec::new();
        write_derived(&mut buffer, &series).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("time,accel_y,gyro_x,gyro_y,gyro_z,pitch,roll,position,gyro,"));

        let read = read_derived(buffer.as_slice(), "normal_1").unwrap();
        assert_eq!(read.rows[0].position, 1.25);
        assert_eq!(read.rows[0].gyro, 0.5);
        assert!(read.rows[0].roll.is_nan());
    }

    #[test]
    fn test_minimal_columns_are_enough() {
        let csv = "position,gyro,cumulative_pitch,cumulative_roll,tilt\n0.1,0.2,0.0,0.0,0.0\n";
        let series = read_derived(csv.as_bytes(), "legacy").unwrap();
        assert_eq!(series.len(), 1);
        assert!(series.rows[0].time.is_nan());
    }

    #[test]
    fn test_missing_derived_column() {
        let csv = "position,gyro\n0.1,0.2\n";
        assert!(matches!(
            read_derived(csv.as_bytes(), "partial"),
            Err(Error::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_derived_file_path() {
        let path = derived_file_path(Path::new("/tmp/out"), "run_3");
        assert_eq!(path, PathBuf::from("/tmp/out/run_3_add.csv"));
    }
}

// src/data_input/derived_io.rs
