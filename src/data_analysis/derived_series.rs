// src/data_analysis/derived_series.rs

use serde::{Deserialize, Serialize};

use crate::data_input::log_data::SensorSession;
use crate::types::{PositionSeries, Signal};

fn missing() -> f64 {
    f64::NAN
}

/// One row of a processed (`_add`) session: cleaned raw channels plus the
/// calibrated position and the derived signals. Raw channels absent from a
/// stored file read back as NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedRow {
    #[serde(default = "missing")]
    pub time: f64,
    #[serde(default = "missing")]
    pub accel_y: f64,
    #[serde(default = "missing")]
    pub gyro_x: f64,
    #[serde(default = "missing")]
    pub gyro_y: f64,
    #[serde(default = "missing")]
    pub gyro_z: f64,
    #[serde(default = "missing")]
    pub pitch: f64,
    #[serde(default = "missing")]
    pub roll: f64,
    pub position: f64,
    pub gyro: f64,
    pub cumulative_pitch: f64,
    pub cumulative_roll: f64,
    pub tilt: f64,
}

impl DerivedRow {
    pub fn signal(&self, signal: Signal) -> f64 {
        match signal {
            Signal::Gyro => self.gyro,
            Signal::CumulativePitch => self.cumulative_pitch,
            Signal::CumulativeRoll => self.cumulative_roll,
            Signal::Tilt => self.tilt,
        }
    }
}

/// A processed session ready for binning.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedSeries {
    pub name: String,
    pub rows: Vec<DerivedRow>,
}

/// Running sum of consecutive differences; the first value is 0.
/// A non-finite difference contributes nothing.
pub fn cumulative_change(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut acc = 0.0;
    for (i, &v) in values.iter().enumerate() {
        if i > 0 {
            let delta = v - values[i - 1];
            if delta.is_finite() {
                acc += delta;
            }
        }
        out.push(acc);
    }
    out
}

impl DerivedSeries {
    /// Combines a cleaned session with its calibrated positions.
    /// Extra positions or samples beyond the shorter of the two are ignored.
    pub fn from_session(session: &SensorSession, positions: &[f64]) -> Self {
        let pitch: Vec<f64> = session.samples.iter().map(|s| s.pitch).collect();
        let roll: Vec<f64> = session.samples.iter().map(|s| s.roll).collect();
        let cumulative_pitch = cumulative_change(&pitch);
        let cumulative_roll = cumulative_change(&roll);

        let rows = session
            .samples
            .iter()
            .zip(positions)
            .enumerate()
            .map(|(i, (sample, &position))| DerivedRow {
                time: sample.time_sec,
                accel_y: sample.forward_accel(),
                gyro_x: sample.gyro[0],
                gyro_y: sample.gyro[1],
                gyro_z: sample.gyro[2],
                pitch: sample.pitch,
                roll: sample.roll,
                position,
                gyro: sample.gyro_magnitude(),
                cumulative_pitch: cumulative_pitch[i],
                cumulative_roll: cumulative_roll[i],
                tilt: cumulative_pitch[i].hypot(cumulative_roll[i]),
            })
            .collect();

        Self {
            name: session.name.clone(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn positions(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.position).collect()
    }

    /// `(position, value)` pairs of one signal.
    pub fn signal_series(&self, signal: Signal) -> PositionSeries {
        self.rows.iter().map(|r| (r.position, r.signal(signal))).collect()
    }

    /// Rows whose position lies within the optional `[min, max]` range.
    pub fn clipped(&self, min: Option<f64>, max: Option<f64>) -> DerivedSeries {
        let rows = self
            .rows
            .iter()
            .filter(|r| min.map_or(true, |m| r.position >= m) && max.map_or(true, |m| r.position <= m))
            .copied()
            .collect();
        DerivedSeries {
            name: self.name.clone(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_input::log_data::SensorSample;
    use approx::assert_abs_diff_eq;

    fn session() -> SensorSession {
        let angles = [(1.0, 2.0), (4.0, 6.0), (2.0, 2.0)];
        let samples = angles
            .iter()
            .enumerate()
            .map(|(i, &(pitch, roll))| {
                let mut s = SensorSample::new(i as f64 * 0.1);
                s.accel = [0.0, 0.5, 9.8];
                s.gyro = [0.0, 3.0, 4.0];
                s.pitch = pitch;
                s.roll = roll;
                s
            })
            .collect();
        SensorSession::new("derived", samples)
    }

    #[test]
    fn test_cumulative_change() {
        assert_eq!(cumulative_change(&[1.0, 3.0, 2.0, 2.5]), vec![0.0, 2.0, 1.0, 1.5]);
        assert_eq!(cumulative_change(&[1.0, f64::NAN, 2.0]), vec![0.0, 0.0, 0.0]);
        assert!(cumulative_change(&[]).is_empty());
    }

    #[test]
    fn test_from_session_derives_signals() {
        let series = DerivedSeries::from_session(&session(), &[0.0, 1.0, 2.5]);
        assert_eq!(series.len(), 3);
        let row = series.rows[1];
        assert_eq!(row.gyro, 5.0);
        assert_eq!(row.cumulative_pitch, 3.0);
        assert_eq!(row.cumulative_roll, 4.0);
        assert_abs_diff_eq!(row.tilt, 5.0, epsilon = 1e-12);
        assert_eq!(row.accel_y, 0.5);
        assert_eq!(series.rows[0].tilt, 0.0);
        assert_eq!(series.positions(), vec![0.0, 1.0, 2.5]);
    }

    #[test]
    fn test_signal_series_and_clipping() {
        let series = DerivedSeries::from_session(&session(), &[-0.2, 1.0, 2.7]);
        assert_eq!(
            series.signal_series(Signal::CumulativePitch),
            vec![(-0.2, 0.0), (1.0, 3.0), (2.7, 1.0)]
        );
        let clipped = series.clipped(Some(0.0), Some(2.5));
        assert_eq!(clipped.positions(), vec![1.0]);
        assert_eq!(series.clipped(None, None).len(), 3);
    }
}

// src/data_analysis/derived_series.rs
