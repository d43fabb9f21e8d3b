// src/plot_functions/plot_shock_trim.rs

use std::path::Path;

use crate::config::PlotConfig;
use crate::constants::{
    COLOR_ACCEL_Y, COLOR_GYRO_RAW, COLOR_GYRO_SMOOTH, COLOR_SHOCK_REGION, COLOR_STABLE_MARKER, COLOR_THRESHOLD,
    LINE_WIDTH_PLOT, LINE_WIDTH_SUMMARY, SHOCK_REGION_OPACITY,
};
use crate::data_analysis::shock_trim::TrimOutcome;
use crate::data_input::log_data::SensorSession;
use crate::plot_framework::{draw_stacked_plot, PanelConfig, PlotSeries, ShadedRegion};
use crate::Result;

/// Shock-trim diagnostics: gyro magnitude with its smoothed curve, the
/// threshold and the detected regions, then the forward acceleration of the
/// kept interval.
pub fn plot_shock_trim(
    session: &SensorSession,
    trim: &TrimOutcome,
    threshold: f64,
    output_path: &Path,
    plot: &PlotConfig,
) -> Result<bool> {
    let times = session.times();
    let pair = |values: &[f64]| -> Vec<(f64, f64)> { times.iter().copied().zip(values.iter().copied()).collect() };
    let raw = pair(&trim.gyro_magnitude);
    let smoothed = pair(&trim.smoothed_magnitude);
    let threshold_line = match (times.first(), times.last()) {
        (Some(&t0), Some(&t1)) => vec![(t0, threshold), (t1, threshold)],
        _ => Vec::new(),
    };

    let time_at = |i: usize| times.get(i.min(times.len().saturating_sub(1))).copied().unwrap_or(0.0);
    let mut regions: Vec<ShadedRegion> = trim
        .shock_regions
        .iter()
        .enumerate()
        .map(|(n, &(start, end))| ShadedRegion {
            start: time_at(start),
            end: time_at(end.saturating_sub(1)),
            color: *COLOR_SHOCK_REGION,
            opacity: SHOCK_REGION_OPACITY,
            label: if n == 0 { "shock".to_string() } else { String::new() },
        })
        .collect();

    let (kept_start, kept_end) = trim.kept;
    let kept_accel: Vec<(f64, f64)> = session
        .samples
        .iter()
        .take(kept_end)
        .skip(kept_start)
        .map(|s| (s.time_sec, s.forward_accel()))
        .collect();
    let stable = ShadedRegion {
        start: time_at(kept_start),
        end: time_at(kept_end.saturating_sub(1)),
        color: *COLOR_STABLE_MARKER,
        opacity: SHOCK_REGION_OPACITY,
        label: if trim.fallback {
            "kept (fallback)".to_string()
        } else {
            "kept".to_string()
        },
    };

    let title = format!("{} - shock trim", session.name);
    draw_stacked_plot(output_path, (plot.width, plot.height), &title, 2, |panel_index| match panel_index {
        0 => {
            let mut panel = PanelConfig::fitted(
                "Gyro magnitude",
                "Time (s)",
                "rad/s",
                vec![
                    PlotSeries::line(raw.clone(), "gyro", *COLOR_GYRO_RAW, LINE_WIDTH_PLOT),
                    PlotSeries::line(smoothed.clone(), "smoothed", *COLOR_GYRO_SMOOTH, LINE_WIDTH_SUMMARY),
                    PlotSeries::line(threshold_line.clone(), "threshold", *COLOR_THRESHOLD, LINE_WIDTH_PLOT),
                ],
                Vec::new(),
            )?;
            panel.regions = std::mem::take(&mut regions);
            Some(panel)
        }
        1 => {
            let mut panel = PanelConfig::fitted(
                "Forward acceleration (kept interval)",
                "Time (s)",
                "m/s²",
                vec![PlotSeries::line(kept_accel.clone(), "accel_y", *COLOR_ACCEL_Y, LINE_WIDTH_PLOT)],
                Vec::new(),
            )?;
            panel.regions = vec![stable.clone()];
            Some(panel)
        }
        _ => None,
    })
}

// src/plot_functions/plot_shock_trim.rs
