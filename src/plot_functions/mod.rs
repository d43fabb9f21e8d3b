// src/plot_functions/mod.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub mod plot_gyro_summary;
pub mod plot_pitch_tilt;
pub mod plot_session_channels;
pub mod plot_shock_trim;

/// Which chart to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    /// Raw accel_y, gyro axes and orientation over time
    SessionChannels,
    /// Gyro magnitude with detected shock regions and the kept interval
    ShockTrim,
    /// Gyro by position across runs with bin mean, max and upper bound
    GyroSummary,
    /// Cumulative pitch and tilt by position with their bin means
    PitchTilt,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::SessionChannels,
        ChartKind::ShockTrim,
        ChartKind::GyroSummary,
        ChartKind::PitchTilt,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ChartKind::SessionChannels => "session-channels",
            ChartKind::ShockTrim => "shock-trim",
            ChartKind::GyroSummary => "gyro-summary",
            ChartKind::PitchTilt => "pitch-tilt",
        }
    }

    fn file_tag(self) -> &'static str {
        match self {
            ChartKind::SessionChannels => "Channels_stacked",
            ChartKind::ShockTrim => "ShockTrim_stacked",
            ChartKind::GyroSummary => "GyroSummary",
            ChartKind::PitchTilt => "PitchTilt_stacked",
        }
    }

    /// Whether the chart is drawn from a raw log rather than processed series.
    pub fn needs_raw_session(self) -> bool {
        matches!(self, ChartKind::SessionChannels | ChartKind::ShockTrim)
    }

    /// `<dir>/<name>_<Tag>.png`
    pub fn output_path(self, dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{}_{}.png", name, self.file_tag()))
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        ChartKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = ChartKind::ALL.iter().map(|k| k.name()).collect();
                format!("unknown chart '{}', expected one of: {}", s, names.join(", "))
            })
    }
}


// src/plot_functions/mod.rs
