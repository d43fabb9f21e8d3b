// src/data_analysis/statistics.rs

use ndarray::{Array1, Axis};
use ndarray_stats::{interpolate::Linear, QuantileExt};
use noisy_float::types::n64;

/// Finite values of a slice as an owned array.
pub fn finite_array(values: &[f64]) -> Array1<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    finite_array(values).mean()
}

/// Standard deviation of the finite values with `ddof` delta degrees of freedom.
/// Returns 0.0 when fewer than `ddof + 1` values are available.
pub fn std_dev(values: &[f64], ddof: usize) -> f64 {
    let arr = finite_array(values);
    if arr.len() <= ddof {
        return 0.0;
    }
    arr.std(ddof as f64)
}

/// Quantile `q` (0..=1) of the finite values, interpolating linearly between order statistics.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut arr = finite_array(values);
    if arr.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    arr.quantile_axis_skipnan_mut(Axis(0), n64(q), &Linear)
        .ok()
        .map(|result| result[()])
}

/// Minimum and maximum of the finite values.
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let arr = finite_array(values);
    match (arr.min(), arr.max()) {
        (Ok(min), Ok(max)) => Some((*min, *max)),
        _ => None,
    }
}

/// Centered moving average over `window` samples.
///
/// The window covering sample `i` spans `[i - window/2, i - window/2 + window)`.
/// A window that does not fit, or that holds a non-finite value, has no
/// average of its own and takes the nearest later one, then the nearest
/// earlier one. A window longer than the input is clamped to its length.
/// The result is all NaN only when no window is complete and finite.
pub fn centered_moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let window = window.clamp(1, n);
    let half = window / 2;

    // Running sum of finite values and running count of the others
    let mut sums = Vec::with_capacity(n + 1);
    let mut gaps = Vec::with_capacity(n + 1);
    sums.push(0.0);
    gaps.push(0usize);
    for v in values {
        let (sum, gap) = (sums[sums.len() - 1], gaps[gaps.len() - 1]);
        if v.is_finite() {
            sums.push(sum + v);
            gaps.push(gap);
        } else {
            sums.push(sum);
            gaps.push(gap + 1);
        }
    }

    let mut smoothed: Vec<Option<f64>> = (0..n)
        .map(|i| {
            let start = i.checked_sub(half)?;
            let end = start + window;
            if end > n || gaps[end] > gaps[start] {
                return None;
            }
            Some((sums[end] - sums[start]) / window as f64)
        })
        .collect();

    let mut next = None;
    for slot in smoothed.iter_mut().rev() {
        match slot {
            Some(v) => next = Some(*v),
            None => *slot = next,
        }
    }
    let mut prev = None;
    for slot in smoothed.iter_mut() {
        match slot {
            Some(v) => prev = Some(*v),
            None => *slot = prev,
        }
    }

    smoothed.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_quantile_linear_interpolation() {
        let values = [0.5, 0.9];
        assert_abs_diff_eq!(quantile(&values, 0.25).unwrap(), 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(quantile(&values, 0.75).unwrap(), 0.8, epsilon = 1e-12);

        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_abs_diff_eq!(quantile(&values, 0.25).unwrap(), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(quantile(&values, 0.75).unwrap(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_quantile_skips_nan_and_single_value() {
        assert_eq!(quantile(&[f64::NAN, 0.4], 0.25), Some(0.4));
        assert_eq!(quantile(&[0.4], 0.75), Some(0.4));
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[f64::NAN], 0.5), None);
    }

    #[test]
    fn test_std_dev_ddof() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_abs_diff_eq!(std_dev(&values, 0), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(std_dev(&values, 1), (32.0f64 / 7.0).sqrt(), epsilon = 1e-12);
        assert_eq!(std_dev(&[1.0], 1), 0.0);
    }

    #[test]
    fn test_min_max_and_mean() {
        assert_eq!(min_max(&[3.0, f64::NAN, -1.0, 2.0]), Some((-1.0, 3.0)));
        assert_eq!(min_max(&[]), None);
        assert_abs_diff_eq!(mean(&[1.0, 2.0, f64::NAN]).unwrap(), 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_centered_moving_average_odd_window() {
        let values = [0.0, 3.0, 6.0, 9.0, 12.0];
        let smoothed = centered_moving_average(&values, 3);
        // Edges take the nearest complete window
        assert_eq!(smoothed, vec![3.0, 3.0, 6.0, 9.0, 9.0]);
    }

    #[test]
    fn test_centered_moving_average_even_window() {
        let values = [0.0, 4.0, 8.0, 12.0, 16.0];
        // Window for i spans [i-2, i+2)
        let smoothed = centered_moving_average(&values, 4);
        assert_eq!(smoothed, vec![6.0, 6.0, 6.0, 10.0, 10.0]);
    }

    #[test]
    fn test_centered_moving_average_window_clamped() {
        let values = [1.0, 2.0, 3.0];
        assert_eq!(centered_moving_average(&values, 10), vec![2.0, 2.0, 2.0]);
        assert_eq!(centered_moving_average(&values, 0), values.to_vec());
    }

    #[test]
    fn test_centered_moving_average_gap_stays_local() {
        let mut values = vec![1.0; 12];
        values[9] = 4.0;
        values[5] = f64::NAN;
        let smoothed = centered_moving_average(&values, 3);
        // windows 4..=6 hold the gap and take the window centred on 7
        assert_eq!(&smoothed[..4], &[1.0; 4]);
        assert_eq!(&smoothed[4..7], &[1.0; 3]);
        assert_eq!(&smoothed[8..], &[2.0, 2.0, 2.0, 2.0]);
        assert!(smoothed.iter().all(|v| v.is_finite()));

        assert!(centered_moving_average(&[f64::NAN, 1.0], 2).iter().all(|v| v.is_nan()));
    }
}

// src/data_analysis/statistics.rs
