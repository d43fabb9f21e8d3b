// src/types.rs
// Shared aliases and small enums used across the pipeline stages

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::axis_names::{
    CUMULATIVE_PITCH_COLUMN, CUMULATIVE_ROLL_COLUMN, GYRO_MAGNITUDE_COLUMN, TILT_COLUMN,
};

/// Integer index of a fixed-width position bin; the bin centre is `index * width`.
pub type BinIndex = i64;

/// Position/value pairs ready for plotting.
pub type PositionSeries = Vec<(f64, f64)>;

/// Half-open index range `[start, end)` into a sample vector.
pub type SampleRange = (usize, usize);

/// A per-sample signal of a derived series that can be binned and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Gyro,
    CumulativePitch,
    CumulativeRoll,
    Tilt,
}

impl Signal {
    pub const ALL: [Signal; 4] = [
        Signal::Gyro,
        Signal::CumulativePitch,
        Signal::CumulativeRoll,
        Signal::Tilt,
    ];

    /// Column name of this signal in a derived CSV file.
    pub fn column(self) -> &'static str {
        match self {
            Signal::Gyro => GYRO_MAGNITUDE_COLUMN,
            Signal::CumulativePitch => CUMULATIVE_PITCH_COLUMN,
            Signal::CumulativeRoll => CUMULATIVE_ROLL_COLUMN,
            Signal::Tilt => TILT_COLUMN,
        }
    }

    pub fn parse(name: &str) -> Option<Signal> {
        match name.trim().to_ascii_lowercase().as_str() {
            "gyro" => Some(Signal::Gyro),
            "pitch" | "cumulative_pitch" => Some(Signal::CumulativePitch),
            "roll" | "cumulative_roll" => Some(Signal::CumulativeRoll),
            "tilt" => Some(Signal::Tilt),
            _ => None,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_parse_accepts_short_names() {
        assert_eq!(Signal::parse("Pitch"), Some(Signal::CumulativePitch));
        assert_eq!(Signal::parse(" tilt "), Some(Signal::Tilt));
        assert_eq!(Signal::parse("gyro"), Some(Signal::Gyro));
        assert_eq!(Signal::parse("yaw"), None);
    }

    #[test]
    fn test_signal_columns_round_trip() {
        for signal in Signal::ALL {
            assert_eq!(Signal::parse(signal.column()), Some(signal));
        }
    }
}
