// src/data_analysis/outlier_cleaner.rs

use log::{debug, warn};

use crate::config::CleaningConfig;
use crate::data_analysis::statistics::{mean, std_dev};
use crate::data_input::log_data::{SensorChannel, SensorSession};

/// Per-channel counts of what the cleaner changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningReport {
    /// Values whose |z| exceeded the threshold, per cleaned channel
    pub outliers_removed: Vec<(SensorChannel, usize)>,
    /// Missing values filled by interpolation, across all channels
    pub gaps_filled: usize,
    /// Channels without a single finite value; left untouched
    pub empty_channels: Vec<SensorChannel>,
}

impl CleaningReport {
    pub fn total_outliers(&self) -> usize {
        self.outliers_removed.iter().map(|(_, n)| n).sum()
    }
}

/// Replaces values with |z| > `z_threshold` by NaN.
/// Mean and population std are taken over finite values; a zero std removes nothing.
/// Returns the number of values removed.
pub fn remove_outliers(values: &mut [f64], z_threshold: f64) -> usize {
    let Some(mu) = mean(values) else {
        return 0;
    };
    let sigma = std_dev(values, 0);
    if sigma <= 0.0 || !sigma.is_finite() {
        return 0;
    }
    let mut removed = 0;
    for v in values.iter_mut().filter(|v| v.is_finite()) {
        if ((*v - mu) / sigma).abs() > z_threshold {
            *v = f64::NAN;
            removed += 1;
        }
    }
    removed
}

/// Fills non-finite values by linear interpolation against `times`.
/// Leading and trailing gaps take the nearest finite value.
/// Returns the number of values filled; a series without finite values is left as is.
pub fn interpolate_gaps(times: &[f64], values: &mut [f64]) -> usize {
    let known: Vec<usize> = (0..values.len()).filter(|&i| values[i].is_finite()).collect();
    let (Some(&first), Some(&last)) = (known.first(), known.last()) else {
        return 0;
    };

    let (first_value, last_value) = (values[first], values[last]);
    values[..first].fill(first_value);
    values[last + 1..].fill(last_value);
    let mut filled = first + (values.len() - last - 1);
    for pair in known.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if hi - lo < 2 {
            continue;
        }
        let (t0, t1) = (times[lo], times[hi]);
        let (v0, v1) = (values[lo], values[hi]);
        for i in lo + 1..hi {
            values[i] = if t1 > t0 {
                v0 + (v1 - v0) * (times[i] - t0) / (t1 - t0)
            } else {
                v0
            };
            filled += 1;
        }
    }
    filled
}

/// Removes z-score outliers from the configured channels and fills all gaps
/// in them along the time axis. Channels are cleaned independently.
pub fn clean_session(session: &SensorSession, config: &CleaningConfig) -> (SensorSession, CleaningReport) {
    let mut cleaned = session.clone();
    let mut report = CleaningReport::default();
    let times = session.times();

    for &channel in &config.channels {
        let mut values: Vec<f64> = cleaned.samples.iter().map(|s| s.get(channel)).collect();
        if !values.iter().any(|v| v.is_finite()) {
            warn!(
                "{}: channel '{}' has no finite values, leaving it as is",
                session.name,
                channel.column()
            );
            report.empty_channels.push(channel);
            continue;
        }

        let removed = remove_outliers(&mut values, config.z_threshold);
        let filled = interpolate_gaps(&times, &mut values);
        debug!(
            "{}: '{}' removed {} outliers, filled {} gaps",
            session.name,
            channel.column(),
            removed,
            filled
        );
        report.outliers_removed.push((channel, removed));
        report.gaps_filled += filled;

        for (sample, value) in cleaned.samples.iter_mut().zip(values) {
            sample.set(channel, value);
        }
    }

    (cleaned, report)
}


// src/data_analysis/outlier_cleaner.rs
