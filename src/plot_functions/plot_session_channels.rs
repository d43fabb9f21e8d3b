// src/plot_functions/plot_session_channels.rs

use std::path::Path;

use crate::axis_names::{ACCEL_COLUMNS, AXIS_COUNT, FORWARD_ACCEL_AXIS, GYRO_COLUMNS, PITCH_COLUMN, ROLL_COLUMN};
use crate::config::PlotConfig;
use crate::constants::{COLOR_ACCEL_Y, COLOR_GYRO_AXES, COLOR_PITCH, COLOR_ROLL, LINE_WIDTH_PLOT};
use crate::data_input::log_data::SensorSession;
use crate::plot_framework::{draw_stacked_plot, PanelConfig, PlotSeries};
use crate::Result;

/// Raw channels of one session against time: forward acceleration, the three
/// gyro axes, then pitch and roll.
pub fn plot_session_channels(session: &SensorSession, output_path: &Path, plot: &PlotConfig) -> Result<bool> {
    let time_series = |f: &dyn Fn(usize) -> f64| -> Vec<(f64, f64)> {
        session
            .samples
            .iter()
            .enumerate()
            .map(|(i, s)| (s.time_sec, f(i)))
            .collect()
    };

    let accel = time_series(&|i| session.samples[i].forward_accel());
    let gyro: Vec<Vec<(f64, f64)>> = (0..AXIS_COUNT)
        .map(|axis| time_series(&|i| session.samples[i].gyro[axis]))
        .collect();
    let pitch = time_series(&|i| session.samples[i].pitch);
    let roll = time_series(&|i| session.samples[i].roll);

    let title = format!("{} - raw channels", session.name);
    draw_stacked_plot(output_path, (plot.width, plot.height), &title, 3, |panel_index| match panel_index {
        0 => PanelConfig::fitted(
            "Forward acceleration",
            "Time (s)",
            "m/s²",
            vec![PlotSeries::line(
                accel.clone(),
                ACCEL_COLUMNS[FORWARD_ACCEL_AXIS],
                *COLOR_ACCEL_Y,
                LINE_WIDTH_PLOT,
            )],
            Vec::new(),
        ),
        1 => PanelConfig::fitted(
            "Angular velocity",
            "Time (s)",
            "rad/s",
            gyro.iter()
                .enumerate()
                .map(|(axis, data)| PlotSeries::line(data.clone(), GYRO_COLUMNS[axis], *COLOR_GYRO_AXES[axis], LINE_WIDTH_PLOT))
                .collect(),
            Vec::new(),
        ),
        2 => PanelConfig::fitted(
            "Orientation",
            "Time (s)",
            "deg",
            vec![
                PlotSeries::line(pitch.clone(), PITCH_COLUMN, *COLOR_PITCH, LINE_WIDTH_PLOT),
                PlotSeries::line(roll.clone(), ROLL_COLUMN, *COLOR_ROLL, LINE_WIDTH_PLOT),
            ],
            Vec::new(),
        ),
        _ => None,
    })
}

// src/plot_functions/plot_session_channels.rs
