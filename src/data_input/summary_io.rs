// src/data_input/summary_io.rs
// Per-set summary files shared between the batch step and the detector.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::data_analysis::binned_summary::BinSummaryTable;
use crate::data_input::csv_io::{read_rows, write_rows};

pub const GYRO_SUMMARY_PREFIX: &str = "summary_gyro_";
pub const PITCH_TILT_SUMMARY_PREFIX: &str = "summary_pitch_tilt_";

/// Row of `summary_gyro_<set>.csv`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GyroSummaryRow {
    pub position_bin_gyro: f64,
    pub mean_gyro: f64,
    pub upper_bound_gyro: f64,
}

/// Row of `summary_pitch_tilt_<set>.csv`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchTiltSummaryRow {
    pub position_bin_pitch_tilt: f64,
    pub mean_pitch: f64,
    pub mean_tilt: f64,
}

/// Which summary layout a file holds, judged from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    Gyro,
    PitchTilt,
}

impl SummaryKind {
    pub fn from_path(path: &Path) -> Option<SummaryKind> {
        let name = path.file_name()?.to_string_lossy();
        if name.starts_with(GYRO_SUMMARY_PREFIX) {
            Some(SummaryKind::Gyro)
        } else if name.starts_with(PITCH_TILT_SUMMARY_PREFIX) {
            Some(SummaryKind::PitchTilt)
        } else {
            None
        }
    }

    pub fn file_path(self, output_dir: &Path, set_name: &str) -> PathBuf {
        let prefix = match self {
            SummaryKind::Gyro => GYRO_SUMMARY_PREFIX,
            SummaryKind::PitchTilt => PITCH_TILT_SUMMARY_PREFIX,
        };
        output_dir.join(format!("{prefix}{set_name}.csv"))
    }
}

pub fn gyro_rows(table: &BinSummaryTable) -> Vec<GyroSummaryRow> {
    table
        .bins
        .iter()
        .map(|b| GyroSummaryRow {
            position_bin_gyro: b.centre,
            mean_gyro: b.mean,
            upper_bound_gyro: b.upper_bound,
        })
        .collect()
}

/// Joins pitch and tilt summaries on their bins; bins missing from either side are dropped.
pub fn pitch_tilt_rows(pitch: &BinSummaryTable, tilt: &BinSummaryTable) -> Vec<PitchTiltSummaryRow> {
    pitch
        .bins
        .iter()
        .filter_map(|p| {
            tilt.get(p.bin).map(|t| PitchTiltSummaryRow {
                position_bin_pitch_tilt: p.centre,
                mean_pitch: p.mean,
                mean_tilt: t.mean,
            })
        })
        .collect()
}

pub fn write_gyro_summary<W: Write>(writer: W, rows: &[GyroSummaryRow]) -> crate::Result<()> {
    write_rows(writer, rows)
}

pub fn write_pitch_tilt_summary<W: Write>(writer: W, rows: &[PitchTiltSummaryRow]) -> crate::Result<()> {
    write_rows(writer, rows)
}

pub fn read_gyro_summary<R: Read>(reader: R, name: &str) -> crate::Result<Vec<GyroSummaryRow>> {
    read_rows(reader, name, &["position_bin_gyro", "mean_gyro", "upper_bound_gyro"])
}

pub fn read_pitch_tilt_summary<R: Read>(reader: R, name: &str) -> crate::Result<Vec<PitchTiltSummaryRow>> {
    read_rows(reader, name, &["position_bin_pitch_tilt", "mean_pitch", "mean_tilt"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_analysis::binned_summary::BinRule;
    use crate::types::Signal;

    #[test]
    fn test_summary_kind_from_path() {
        assert_eq!(
            SummaryKind::from_path(Path::new("out/summary_gyro_set0.csv")),
            Some(SummaryKind::Gyro)
        );
        assert_eq!(
            SummaryKind::from_path(Path::new("summary_pitch_tilt_set6.csv")),
            Some(SummaryKind::PitchTilt)
        );
        assert_eq!(SummaryKind::from_path(Path::new("normal_1_add.csv")), None);
        assert_eq!(
            SummaryKind::Gyro.file_path(Path::new("out"), "set2"),
            PathBuf::from("out/summary_gyro_set2.csv")
        );
    }

    #[test]
    fn test_gyro_summary_header_and_values() {
        let table = BinSummaryTable::from_pairs(
            Signal::Gyro,
            vec![(0.0, 0.1), (0.0, 0.3), (0.1, 0.2)],
            0.1,
            BinRule::Nearest,
            1.5,
        )
        .unwrap();
        let rows = gyro_rows(&table);
        let mut buffer = Vec::new();
        write_gyro_summary(&mut buffer, &rows).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("position_bin_gyro,mean_gyro,upper_bound_gyro\n"));

        let read = read_gyro_summary(buffer.as_slice(), "gyro").unwrap();
        assert_eq!(read, rows);
        assert!((read[0].mean_gyro - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_pitch_tilt_join_drops_unmatched_bins() {
        let pitch = BinSummaryTable::from_pairs(
            Signal::CumulativePitch,
            vec![(0.0, 1.0), (0.1, 2.0), (0.2, 3.0)],
            0.1,
            BinRule::Nearest,
            2.5,
        )
        .unwrap();
        let tilt = BinSummaryTable::from_pairs(
            Signal::Tilt,
            vec![(0.0, 4.0), (0.2, 6.0)],
            0.1,
            BinRule::Nearest,
            2.5,
        )
        .unwrap();
        let rows = pitch_tilt_rows(&pitch, &tilt);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].mean_pitch, 3.0);
        assert_eq!(rows[1].mean_tilt, 6.0);

        let mut buffer = Vec::new();
        write_pitch_tilt_summary(&mut buffer, &rows).unwrap();
        let read = read_pitch_tilt_summary(buffer.as_slice(), "pt").unwrap();
        assert_eq!(read.len(), 2);
    }
}

// src/data_input/summary_io.rs
