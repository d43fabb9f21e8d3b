// src/data_analysis/shock_trim.rs

use log::{debug, info};

use crate::config::ShockTrimConfig;
use crate::constants::BIN_EDGE_EPSILON;
use crate::data_analysis::statistics::centered_moving_average;
use crate::data_input::log_data::SensorSession;
use crate::types::SampleRange;

/// What the shock detector found in a session and which part it kept.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimOutcome {
    /// Per-sample gyro magnitude before smoothing
    pub gyro_magnitude: Vec<f64>,
    /// Centered moving average of the magnitude
    pub smoothed_magnitude: Vec<f64>,
    /// Detected shock regions as `[start, end)` sample ranges
    pub shock_regions: Vec<SampleRange>,
    /// Index range of the input kept as the stable segment
    pub kept: SampleRange,
    /// Set when the buffered interval was inverted and the full session was kept
    pub fallback: bool,
}

/// The bump-free part of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct StableSegment {
    pub session: SensorSession,
    pub trim: TrimOutcome,
}

/// Collapses runs of `true` into `[start, end)` ranges at least `min_length` long.
pub fn continuous_regions(flags: &[bool], min_length: usize) -> Vec<SampleRange> {
    let mut regions = Vec::new();
    let mut start: Option<usize> = None;
    for (i, &flag) in flags.iter().enumerate() {
        match (flag, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                if i - s >= min_length {
                    regions.push((s, i));
                }
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        if flags.len() - s >= min_length {
            regions.push((s, flags.len()));
        }
    }
    regions
}

fn seconds_to_samples(seconds: f64, dt: f64) -> usize {
    // 0.2 / 0.01 must give 20, not 19
    let samples = (seconds / dt + BIN_EDGE_EPSILON).floor();
    if samples.is_finite() && samples > 0.0 {
        samples as usize
    } else {
        0
    }
}

/// Cuts bridge-entry/exit bump transients from a session.
///
/// The kept interval runs from the end of the first shock region (plus buffer)
/// to the start of the last one (minus buffer). Without any region the session
/// is returned unchanged; an inverted interval falls back to the full session,
/// so the result is never empty.
pub fn trim_shocks(session: &SensorSession, config: &ShockTrimConfig) -> StableSegment {
    let n = session.len();
    let gyro_magnitude: Vec<f64> = session.samples.iter().map(|s| s.gyro_magnitude()).collect();

    let untouched = |smoothed: Vec<f64>, regions: Vec<SampleRange>, fallback: bool| StableSegment {
        session: session.clone(),
        trim: TrimOutcome {
            gyro_magnitude: gyro_magnitude.clone(),
            smoothed_magnitude: smoothed,
            shock_regions: regions,
            kept: (0, n),
            fallback,
        },
    };

    let dt = match session.mean_sample_interval() {
        Some(dt) if config.enabled && n >= 2 => dt,
        _ => return untouched(gyro_magnitude.clone(), Vec::new(), false),
    };

    let window = seconds_to_samples(config.smoothing_window_s, dt).max(1);
    let smoothed = centered_moving_average(&gyro_magnitude, window);
    let above: Vec<bool> = smoothed.iter().map(|&v| v > config.threshold).collect();
    let min_len = seconds_to_samples(config.min_event_s, dt);
    let regions = continuous_regions(&above, min_len);
    debug!(
        "{}: dt={:.4}s window={} min_len={} regions={:?}",
        session.name, dt, window, min_len, regions
    );

    let (first, last) = match (regions.first(), regions.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => {
            info!("{}: no shock regions found, keeping all {} samples", session.name, n);
            return untouched(smoothed, regions, false);
        }
    };

    let buffer = seconds_to_samples(config.buffer_s, dt);
    let stable_start_idx = (first.1 + buffer).min(n - 1);
    let stable_end_idx = last.0.saturating_sub(buffer);

    if stable_start_idx > stable_end_idx {
        info!(
            "{}: stable interval inverted ({} > {}), keeping full session",
            session.name, stable_start_idx, stable_end_idx
        );
        return untouched(smoothed, regions, true);
    }

    let start_time = session.samples[stable_start_idx].time_sec;
    let end_time = session.samples[stable_end_idx].time_sec;
    let kept_start = session
        .samples
        .iter()
        .position(|s| s.time_sec >= start_time)
        .unwrap_or(stable_start_idx);
    let kept_end = session
        .samples
        .iter()
        .rposition(|s| s.time_sec <= end_time)
        .map(|i| i + 1)
        .unwrap_or(stable_end_idx + 1);

    info!(
        "{}: kept stable interval {:.3}s ~ {:.3}s ({} of {} samples)",
        session.name,
        start_time,
        end_time,
        kept_end - kept_start,
        n
    );

    StableSegment {
        session: SensorSession {
            name: session.name.clone(),
            samples: session.samples[kept_start..kept_end].to_vec(),
        },
        trim: TrimOutcome {
            gyro_magnitude,
            smoothed_magnitude: smoothed,
            shock_regions: regions,
            kept: (kept_start, kept_end),
            fallback: false,
        },
    }
}


// src/data_analysis/shock_trim.rs
