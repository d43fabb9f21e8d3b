// src/data_input/log_parser.rs

use csv::ReaderBuilder;
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::axis_names::{
    ACCEL_COLUMNS, GYRO_COLUMNS, PITCH_COLUMN, ROLL_COLUMN, TIME_COLUMN, TIME_COLUMN_ALIAS,
};
use crate::config::TimeUnit;
use crate::data_input::log_data::{SensorSample, SensorSession};
use crate::{Error, Result};

// Target header positions, in the order they are mapped below.
const IDX_TIME: usize = 0;
const IDX_ACCEL: usize = 1; // 1, 2, 3
const IDX_GYRO: usize = 4; // 4, 5, 6
const IDX_PITCH: usize = 7;
const IDX_ROLL: usize = 8;

/// Parses a raw phone sensor log from disk.
/// The session is named after the file stem.
pub fn parse_log_file(input_file_path: &Path, time_unit: TimeUnit) -> Result<SensorSession> {
    let name = session_name(input_file_path);
    let file = File::open(input_file_path)?;
    parse_log_reader(BufReader::new(file), &name, time_unit)
}

/// File stem used to name sessions and output artifacts.
pub fn session_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Parses raw sensor rows from any reader.
///
/// Required columns: `time` (or `timestamp`), `accel_y`, `gyro_x`, `gyro_y`,
/// `gyro_z`, `pitch`, `roll`. `accel_x` and `accel_z` are optional.
/// Unparseable channel cells become NaN; rows with an invalid time are skipped.
pub fn parse_log_reader<R: Read>(reader: R, name: &str, time_unit: TimeUnit) -> Result<SensorSession> {
    let target_headers = [
        TIME_COLUMN,                                       // 0
        ACCEL_COLUMNS[0], ACCEL_COLUMNS[1], ACCEL_COLUMNS[2], // 1, 2, 3
        GYRO_COLUMNS[0], GYRO_COLUMNS[1], GYRO_COLUMNS[2], // 4, 5, 6
        PITCH_COLUMN,                                      // 7
        ROLL_COLUMN,                                       // 8
    ];
    let optional = [IDX_ACCEL, IDX_ACCEL + 2]; // accel_x, accel_z

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let header_record = reader.headers()?.clone();
    debug!("Headers found in {}: {:?}", name, header_record);

    let header_indices: Vec<Option<usize>> = target_headers
        .iter()
        .enumerate()
        .map(|(i, &target_header)| {
            if i == IDX_TIME {
                // Phone exports use either "time" or "timestamp"
                header_record
                    .iter()
                    .position(|h| h == TIME_COLUMN || h == TIME_COLUMN_ALIAS)
            } else {
                header_record.iter().position(|h| h == target_header)
            }
        })
        .collect();

    for (i, &target_header) in target_headers.iter().enumerate() {
        let found = header_indices[i].is_some();
        if !found && !optional.contains(&i) {
            return Err(Error::MissingColumn {
                file: name.to_string(),
                column: target_header.to_string(),
            });
        }
        debug!("  '{}': {}", target_header, if found { "Found" } else { "Not Found (optional)" });
    }

    let scale = time_unit.seconds_per_unit();
    let mut samples: Vec<SensorSample> = Vec::new();
    let mut skipped_rows = 0usize;

    for (row_index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("{}: skipping row {} due to CSV read error: {}", name, row_index + 1, e);
                skipped_rows += 1;
                continue;
            }
        };

        let parse_f64_by_target_idx = |target_idx: usize| -> f64 {
            header_indices
                .get(target_idx)
                .and_then(|opt_csv_idx| opt_csv_idx.as_ref())
                .and_then(|&csv_idx| record.get(csv_idx))
                .and_then(|val_str| val_str.parse::<f64>().ok())
                .unwrap_or(f64::NAN)
        };

        let time_raw = parse_f64_by_target_idx(IDX_TIME);
        if !time_raw.is_finite() {
            warn!("{}: skipping row {} due to missing or invalid time", name, row_index + 1);
            skipped_rows += 1;
            continue;
        }

        let mut sample = SensorSample::new(time_raw * scale);
        for axis in 0..3 {
            sample.accel[axis] = parse_f64_by_target_idx(IDX_ACCEL + axis);
            sample.gyro[axis] = parse_f64_by_target_idx(IDX_GYRO + axis);
        }
        sample.pitch = parse_f64_by_target_idx(IDX_PITCH);
        sample.roll = parse_f64_by_target_idx(IDX_ROLL);
        samples.push(sample);
    }

    if samples.is_empty() {
        return Err(Error::EmptySession(name.to_string()));
    }

    let mut session = SensorSession::new(name, samples);

    // Epoch-based clocks are rebased so the run starts at t = 0
    if time_unit != TimeUnit::Seconds {
        let start = session.samples[0].time_sec;
        for sample in &mut session.samples {
            sample.time_sec -= start;
        }
    }

    info!(
        "{}: read {} samples ({} rows skipped)",
        name,
        session.len(),
        skipped_rows
    );
    match session.sample_rate() {
        Some(rate) => debug!("{}: estimated sample rate {:.2} Hz", name, rate),
        None => warn!("{}: could not determine sample rate (need >= 2 distinct timestamps)", name),
    }

    Ok(session)
}


// src/data_input/log_parser.rs
