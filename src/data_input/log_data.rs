// src/data_input/log_data.rs

use serde::{Deserialize, Serialize};

use crate::axis_names::{ACCEL_COLUMNS, AXIS_COUNT, FORWARD_ACCEL_AXIS, GYRO_COLUMNS, PITCH_COLUMN, ROLL_COLUMN};

/// A raw per-sample channel addressable by its CSV column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorChannel {
    #[serde(rename = "accel_x")]
    AccelX,
    #[serde(rename = "accel_y")]
    AccelY,
    #[serde(rename = "accel_z")]
    AccelZ,
    #[serde(rename = "gyro_x")]
    GyroX,
    #[serde(rename = "gyro_y")]
    GyroY,
    #[serde(rename = "gyro_z")]
    GyroZ,
    #[serde(rename = "pitch")]
    Pitch,
    #[serde(rename = "roll")]
    Roll,
}

impl SensorChannel {
    pub const ALL: [SensorChannel; 8] = [
        SensorChannel::AccelX,
        SensorChannel::AccelY,
        SensorChannel::AccelZ,
        SensorChannel::GyroX,
        SensorChannel::GyroY,
        SensorChannel::GyroZ,
        SensorChannel::Pitch,
        SensorChannel::Roll,
    ];

    pub fn column(self) -> &'static str {
        match self {
            SensorChannel::AccelX => ACCEL_COLUMNS[0],
            SensorChannel::AccelY => ACCEL_COLUMNS[1],
            SensorChannel::AccelZ => ACCEL_COLUMNS[2],
            SensorChannel::GyroX => GYRO_COLUMNS[0],
            SensorChannel::GyroY => GYRO_COLUMNS[1],
            SensorChannel::GyroZ => GYRO_COLUMNS[2],
            SensorChannel::Pitch => PITCH_COLUMN,
            SensorChannel::Roll => ROLL_COLUMN,
        }
    }

    pub fn from_column(name: &str) -> Option<SensorChannel> {
        let name = name.trim();
        SensorChannel::ALL.into_iter().find(|c| c.column() == name)
    }
}

/// One row of a phone sensor log.
/// Missing or unparseable channel values are stored as NaN so that the
/// outlier cleaner can treat them as gaps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    pub time_sec: f64,              // Timestamp (seconds).
    pub accel: [f64; AXIS_COUNT],   // Acceleration [x, y, z] (m/s²).
    pub gyro: [f64; AXIS_COUNT],    // Angular velocity [x, y, z].
    pub pitch: f64,                 // Orientation pitch.
    pub roll: f64,                  // Orientation roll.
}

impl SensorSample {
    pub fn new(time_sec: f64) -> Self {
        Self {
            time_sec,
            accel: [f64::NAN; AXIS_COUNT],
            gyro: [f64::NAN; AXIS_COUNT],
            pitch: f64::NAN,
            roll: f64::NAN,
        }
    }

    /// Euclidean norm of the three angular-velocity axes.
    pub fn gyro_magnitude(&self) -> f64 {
        self.gyro.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    pub fn forward_accel(&self) -> f64 {
        self.accel[FORWARD_ACCEL_AXIS]
    }

    pub fn get(&self, channel: SensorChannel) -> f64 {
        match channel {
            SensorChannel::AccelX => self.accel[0],
            SensorChannel::AccelY => self.accel[1],
            SensorChannel::AccelZ => self.accel[2],
            SensorChannel::GyroX => self.gyro[0],
            SensorChannel::GyroY => self.gyro[1],
            SensorChannel::GyroZ => self.gyro[2],
            SensorChannel::Pitch => self.pitch,
            SensorChannel::Roll => self.roll,
        }
    }

    pub fn set(&mut self, channel: SensorChannel, value: f64) {
        match channel {
            SensorChannel::AccelX => self.accel[0] = value,
            SensorChannel::AccelY => self.accel[1] = value,
            SensorChannel::AccelZ => self.accel[2] = value,
            SensorChannel::GyroX => self.gyro[0] = value,
            SensorChannel::GyroY => self.gyro[1] = value,
            SensorChannel::GyroZ => self.gyro[2] = value,
            SensorChannel::Pitch => self.pitch = value,
            SensorChannel::Roll => self.roll = value,
        }
    }
}

/// Ordered samples of one drive across the bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSession {
    pub name: String,
    pub samples: Vec<SensorSample>,
}

impl SensorSession {
    /// Builds a session, sorting samples by timestamp.
    pub fn new(name: impl Into<String>, mut samples: Vec<SensorSample>) -> Self {
        samples.sort_by(|a, b| a.time_sec.total_cmp(&b.time_sec));
        Self {
            name: name.into(),
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time_sec).collect()
    }

    pub fn duration(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.time_sec - first.time_sec,
            _ => 0.0,
        }
    }

    /// Mean spacing between consecutive distinct timestamps.
    /// Returns None with fewer than two distinct timestamps.
    pub fn mean_sample_interval(&self) -> Option<f64> {
        let mut total_delta = 0.0;
        let mut count = 0usize;
        for pair in self.samples.windows(2) {
            let delta = pair[1].time_sec - pair[0].time_sec;
            if delta > 1e-9 {
                total_delta += delta;
                count += 1;
            }
        }
        if count > 0 {
            Some(total_delta / count as f64)
        } else {
            None
        }
    }

    /// Estimated sample rate in Hz.
    pub fn sample_rate(&self) -> Option<f64> {
        self.mean_sample_interval().map(|dt| 1.0 / dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_at(t: f64) -> SensorSample {
        SensorSample::new(t)
    }

    #[test]
    fn test_session_sorts_by_time() {
        let session = SensorSession::new("s", vec![sample_at(0.2), sample_at(0.0), sample_at(0.1)]);
        assert_eq!(session.times(), vec![0.0, 0.1, 0.2]);
        assert!((session.duration() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_sample_interval_ignores_repeated_timestamps() {
        let session = SensorSession::new(
            "s",
            vec![sample_at(0.0), sample_at(0.01), sample_at(0.01), sample_at(0.02)],
        );
        let dt = session.mean_sample_interval().unwrap();
        assert!((dt - 0.01).abs() < 1e-12);
        assert!((session.sample_rate().unwrap() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_sample_interval_needs_two_timestamps() {
        let session = SensorSession::new("s", vec![sample_at(1.0)]);
        assert!(session.mean_sample_interval().is_none());
    }

    #[test]
    fn test_channel_accessors() {
        let mut s = sample_at(0.0);
        for (i, channel) in SensorChannel::ALL.into_iter().enumerate() {
            s.set(channel, i as f64);
        }
        for (i, channel) in SensorChannel::ALL.into_iter().enumerate() {
            assert_eq!(s.get(channel), i as f64);
        }
        assert_eq!(s.forward_accel(), 1.0);
        assert_eq!(SensorChannel::from_column(" gyro_z"), Some(SensorChannel::GyroZ));
        assert_eq!(SensorChannel::from_column("yaw"), None);
    }

    #[test]
    fn test_gyro_magnitude() {
        let mut s = sample_at(0.0);
        s.gyro = [3.0, 4.0, 0.0];
        assert_eq!(s.gyro_magnitude(), 5.0);
    }
}

// src/data_input/log_data.rs
