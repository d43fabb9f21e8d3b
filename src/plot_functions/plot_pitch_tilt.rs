// src/plot_functions/plot_pitch_tilt.rs

use std::path::Path;

use crate::config::PlotConfig;
use crate::constants::{
    BAND_OPACITY, COLOR_BAND, COLOR_MEAN, COLOR_RUN_TRACE, LINE_WIDTH_SUMMARY, RUN_TRACE_OPACITY,
};
use crate::data_analysis::anomaly_flagger::Baseline;
use crate::data_analysis::binned_summary::BinSummaryTable;
use crate::data_analysis::derived_series::DerivedSeries;
use crate::plot_framework::{draw_stacked_plot, BandSeries, PanelConfig, PlotSeries};
use crate::types::Signal;
use crate::Result;

fn envelope_band(baseline: &Baseline) -> BandSeries {
    let data = baseline
        .points()
        .into_iter()
        .map(|(centre, env)| (centre, env.lower.unwrap_or(f64::NAN), env.upper))
        .collect();
    BandSeries {
        data,
        label: "baseline band".to_string(),
        color: *COLOR_BAND,
        opacity: BAND_OPACITY,
    }
}

/// Cumulative pitch and tilt by position for every run with their bin means.
/// Baselines, when given, are drawn as shaded bands behind the matching panel.
pub fn plot_pitch_tilt(
    set_name: &str,
    series: &[DerivedSeries],
    pitch: &BinSummaryTable,
    tilt: &BinSummaryTable,
    bands: &[&Baseline],
    output_path: &Path,
    plot: &PlotConfig,
) -> Result<bool> {
    let panel_for = |signal: Signal, table: &BinSummaryTable, unit: &str| {
        let mut all: Vec<PlotSeries> = series
            .iter()
            .map(|s| PlotSeries::faint(s.signal_series(signal), *COLOR_RUN_TRACE, RUN_TRACE_OPACITY))
            .collect();
        all.push(PlotSeries::line(table.mean_pairs(), "mean", *COLOR_MEAN, LINE_WIDTH_SUMMARY));
        let band: Vec<BandSeries> = bands
            .iter()
            .filter(|b| b.signal == signal)
            .map(|b| envelope_band(b))
            .collect();
        PanelConfig::fitted(format!("{signal} by position"), "Position (m)", unit, all, band)
    };

    let title = format!("{set_name} - pitch / tilt by position ({} runs)", series.len());
    draw_stacked_plot(output_path, (plot.width, plot.height), &title, 2, |panel_index| match panel_index {
        0 => panel_for(Signal::CumulativePitch, pitch, "deg"),
        1 => panel_for(Signal::Tilt, tilt, "deg"),
        _ => None,
    })
}

// src/plot_functions/plot_pitch_tilt.rs
