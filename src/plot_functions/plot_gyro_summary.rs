// src/plot_functions/plot_gyro_summary.rs

use std::path::Path;

use crate::config::PlotConfig;
use crate::constants::{
    BAND_OPACITY, COLOR_BAND, COLOR_MAX, COLOR_MEAN, COLOR_RUN_TRACE, COLOR_UPPER_BOUND, LINE_WIDTH_SUMMARY,
    RUN_TRACE_OPACITY,
};
use crate::data_analysis::binned_summary::{BinSummary, BinSummaryTable};
use crate::data_analysis::derived_series::DerivedSeries;
use crate::plot_framework::{draw_stacked_plot, BandSeries, PanelConfig, PlotSeries};
use crate::types::Signal;
use crate::Result;

/// Gyro magnitude by position: every run as a faint trace with the bin mean,
/// max and IQR upper bound on top, and below it the per-bin Q1..Q3 spread.
pub fn plot_gyro_summary(
    set_name: &str,
    series: &[DerivedSeries],
    table: &BinSummaryTable,
    output_path: &Path,
    plot: &PlotConfig,
) -> Result<bool> {
    let traces: Vec<PlotSeries> = series
        .iter()
        .map(|s| PlotSeries::faint(s.signal_series(Signal::Gyro), *COLOR_RUN_TRACE, RUN_TRACE_OPACITY))
        .collect();
    let line = |f: fn(&BinSummary) -> f64| -> Vec<(f64, f64)> {
        table.bins.iter().map(|b| (b.centre, f(b))).collect()
    };
    let mean = line(|b| b.mean);
    let max = line(|b| b.max);
    let upper = line(|b| b.upper_bound);
    let iqr: Vec<(f64, f64, f64)> = table.bins.iter().map(|b| (b.centre, b.q1, b.q3)).collect();

    let title = format!("{set_name} - gyro by position ({} runs)", series.len());
    draw_stacked_plot(output_path, (plot.width, plot.height), &title, 2, |panel_index| match panel_index {
        0 => {
            let mut all = traces.clone();
            all.push(PlotSeries::line(mean.clone(), "mean", *COLOR_MEAN, LINE_WIDTH_SUMMARY));
            all.push(PlotSeries::line(max.clone(), "max", *COLOR_MAX, LINE_WIDTH_SUMMARY));
            all.push(PlotSeries::line(upper.clone(), "upper bound", *COLOR_UPPER_BOUND, LINE_WIDTH_SUMMARY));
            PanelConfig::fitted("Gyro magnitude per run", "Position (m)", "rad/s", all, Vec::new())
        }
        1 => PanelConfig::fitted(
            format!("Bin statistics ({} m bins)", table.bin_width),
            "Position (m)",
            "rad/s",
            vec![
                PlotSeries::line(mean.clone(), "mean", *COLOR_MEAN, LINE_WIDTH_SUMMARY),
                PlotSeries::line(upper.clone(), "upper bound", *COLOR_UPPER_BOUND, LINE_WIDTH_SUMMARY),
            ],
            vec![BandSeries {
                data: iqr.clone(),
                label: "Q1..Q3".to_string(),
                color: *COLOR_BAND,
                opacity: BAND_OPACITY,
            }],
        ),
        _ => None,
    })
}

// src/plot_functions/plot_gyro_summary.rs
