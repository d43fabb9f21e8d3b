// src/data_analysis/position_estimator.rs

use log::debug;

use crate::constants::MIN_ELAPSED_TIME_S;
use crate::{Error, Result};

/// Cumulative trapezoidal integral of `values` over `times`, starting at 0.
pub fn cumulative_trapezoid(times: &[f64], values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    let mut acc = 0.0;
    out.push(acc);
    for i in 1..values.len().min(times.len()) {
        acc += 0.5 * (values[i] + values[i - 1]) * (times[i] - times[i - 1]);
        out.push(acc);
    }
    out
}

/// Calibrated position along the track for every sample.
///
/// Forward acceleration is integrated twice. The velocity is shifted so that
/// its time-average equals `track_length / T`, and the resulting positions are
/// scaled so the last one is exactly `track_length`. The first position is 0.
pub fn estimate_positions(times: &[f64], forward_accel: &[f64], track_length: f64) -> Result<Vec<f64>> {
    if times.len() != forward_accel.len() {
        return Err(Error::calibrate(format!(
            "{} timestamps for {} acceleration samples",
            times.len(),
            forward_accel.len()
        )));
    }
    if times.len() < 2 {
        return Err(Error::calibrate("fewer than 2 samples"));
    }
    if times.iter().chain(forward_accel).any(|v| !v.is_finite()) {
        return Err(Error::calibrate("non-finite time or acceleration value"));
    }

    let elapsed = times[times.len() - 1] - times[0];
    if elapsed <= MIN_ELAPSED_TIME_S {
        return Err(Error::calibrate(format!("elapsed time {elapsed} is not positive")));
    }

    let first = forward_accel[0];
    if forward_accel.iter().all(|&a| a == first) {
        return Err(Error::calibrate(format!(
            "forward acceleration is constant ({first}), no motion recorded"
        )));
    }

    let raw_velocity = cumulative_trapezoid(times, forward_accel);
    let raw_distance = cumulative_trapezoid(times, &raw_velocity);
    let raw_average = raw_distance[raw_distance.len() - 1] / elapsed;
    let real_average = track_length / elapsed;
    let correction = real_average - raw_average;
    debug!(
        "velocity correction {:.5} m/s (raw avg {:.5}, real avg {:.5})",
        correction, raw_average, real_average
    );

    let velocity: Vec<f64> = raw_velocity.iter().map(|v| v + correction).collect();
    let mut position = cumulative_trapezoid(times, &velocity);

    let last = position[position.len() - 1];
    if !last.is_finite() || last == 0.0 {
        return Err(Error::calibrate(format!("integrated distance is {last}")));
    }
    let scale = track_length / last;
    for p in &mut position {
        *p *= scale;
    }
    Ok(position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn times(n: usize, dt: f64) -> Vec<f64> {
        (0..n).map(|i| i as f64 * dt).collect()
    }

    #[test]
    fn test_cumulative_trapezoid() {
        let t = [0.0, 1.0, 2.0, 4.0];
        let v = [0.0, 2.0, 2.0, 0.0];
        assert_eq!(cumulative_trapezoid(&t, &v), vec![0.0, 1.0, 3.0, 5.0]);
        assert!(cumulative_trapezoid(&[], &[]).is_empty());
    }

    #[test]
    fn test_final_position_equals_track_length() {
        let t = times(200, 0.01);
        let accel: Vec<f64> = t.iter().map(|x| (x * 3.0).sin() * 0.4).collect();
        let position = estimate_positions(&t, &accel, 2.5).unwrap();
        assert_eq!(position[0], 0.0);
        assert_abs_diff_eq!(position[199], 2.5, epsilon = 1e-9);
    }

    #[test]
    fn test_noisy_accel_still_calibrates() {
        let t = times(50, 0.02);
        let accel: Vec<f64> = (0..50).map(|i| if i % 2 == 0 { 0.3 } else { -0.1 }).collect();
        let position = estimate_positions(&t, &accel, 4.0).unwrap();
        assert_abs_diff_eq!(*position.last().unwrap(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_all_zero_acceleration_cannot_calibrate() {
        let t = times(10, 0.1);
        let result = estimate_positions(&t, &[0.0; 10], 2.5);
        assert!(matches!(result, Err(Error::CannotCalibrate { .. })));
    }

    #[test]
    fn test_degenerate_inputs_cannot_calibrate() {
        assert!(matches!(
            estimate_positions(&[0.0], &[1.0], 2.5),
            Err(Error::CannotCalibrate { .. })
        ));
        assert!(matches!(
            estimate_positions(&[1.0, 1.0, 1.0], &[0.1, 0.2, 0.3], 2.5),
            Err(Error::CannotCalibrate { .. })
        ));
        assert!(matches!(
            estimate_positions(&[0.0, 0.1, 0.2], &[0.1, f64::NAN, 0.3], 2.5),
            Err(Error::CannotCalibrate { .. })
        ));
    }
}

// src/data_analysis/position_estimator.rs
