// src/config.rs

//! Analysis configuration.
//!
//! Every threshold, window and length used by the pipeline lives here so a
//! deployment (track length, bin widths, detection policy) is described by
//! one YAML file instead of literals scattered across call sites.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::*;
use crate::data_input::log_data::SensorChannel;
use crate::{Error, Result};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub input: InputConfig,
    pub shock_trim: ShockTrimConfig,
    pub cleaning: CleaningConfig,
    pub position: PositionConfig,
    pub binning: BinningConfig,
    pub detection: DetectionConfig,
    pub plot: PlotConfig,
}

/// Unit of the timestamp column in raw logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

impl TimeUnit {
    pub fn seconds_per_unit(self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Milliseconds => 1e-3,
            TimeUnit::Microseconds => 1e-6,
            TimeUnit::Nanoseconds => 1e-9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Unit of the `time` column
    pub time_unit: TimeUnit,
}

/// Bump (shock) detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShockTrimConfig {
    /// Disable to pass sessions through untouched
    pub enabled: bool,
    /// Smoothed gyro magnitude threshold
    pub threshold: f64,
    /// Centered moving-average window (s)
    pub smoothing_window_s: f64,
    /// Minimum duration of a shock region (s)
    pub min_event_s: f64,
    /// Margin removed after the first and before the last region (s)
    pub buffer_s: f64,
}

/// Z-score outlier removal parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    pub channels: Vec<SensorChannel>,
    pub z_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionConfig {
    /// Physical length covered by one run (m)
    pub track_length_m: f64,
}

/// Position binning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinningConfig {
    pub gyro_bin_width: f64,
    pub pitch_tilt_bin_width: f64,
    /// IQR fence multiplier for the gyro summary of candidate/demo runs
    pub gyro_iqr_multiplier: f64,
    /// IQR fence multiplier for reference-set summaries written to disk
    pub reference_iqr_multiplier: f64,
    /// Width of the coarse ranges in the summary table
    pub display_range_width: f64,
    /// Samples outside [min, max] are ignored when summarizing
    pub clip_min: Option<f64>,
    pub clip_max: Option<f64>,
}

/// How many candidate files must exceed a bin before it is abnormal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceedThreshold {
    Count(usize),
    Fraction(f64),
}

impl ExceedThreshold {
    /// Whether `exceeding` out of `total` files meets the threshold.
    pub fn is_met(self, exceeding: usize, total: usize) -> bool {
        match self {
            ExceedThreshold::Count(n) => exceeding >= n,
            ExceedThreshold::Fraction(f) => total > 0 && exceeding as f64 / total as f64 >= f,
        }
    }
}

/// Anomaly detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Width of the bins exceedances are counted over
    pub coarse_bin_width: f64,
    pub exceed_threshold: ExceedThreshold,
    /// Fewer candidate files yields an insufficient-data verdict
    pub min_files: usize,
    /// k in mean ± k·σ for pitch/tilt baselines
    pub band_sigma: f64,
    /// Scale of the mean_pitch ± mean_tilt band
    pub tilt_band_scale: f64,
    /// Fine bin width of the single-file detector
    pub session_bin_width: f64,
    /// Share of exceeding samples that marks a fine bin anomalous
    pub session_ratio_threshold: f64,
}

/// Output image size of rendered charts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: PLOT_WIDTH,
            height: PLOT_HEIGHT,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            time_unit: TimeUnit::Seconds,
        }
    }
}

impl Default for ShockTrimConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: SHOCK_GYRO_THRESHOLD,
            smoothing_window_s: SHOCK_SMOOTHING_WINDOW_S,
            min_event_s: SHOCK_MIN_EVENT_S,
            buffer_s: SHOCK_BUFFER_S,
        }
    }
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            channels: DEFAULT_CLEAN_CHANNELS
                .iter()
                .filter_map(|name| SensorChannel::from_column(name))
                .collect(),
            z_threshold: OUTLIER_Z_THRESHOLD,
        }
    }
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            track_length_m: DEFAULT_TRACK_LENGTH_M,
        }
    }
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            gyro_bin_width: GYRO_BIN_WIDTH_M,
            pitch_tilt_bin_width: PITCH_TILT_BIN_WIDTH_M,
            gyro_iqr_multiplier: GYRO_IQR_MULTIPLIER,
            reference_iqr_multiplier: REFERENCE_SET_IQR_MULTIPLIER,
            display_range_width: DISPLAY_RANGE_WIDTH_M,
            clip_min: Some(POSITION_CLIP_MIN_M),
            clip_max: Some(POSITION_CLIP_MAX_M),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            coarse_bin_width: DETECTION_COARSE_BIN_M,
            exceed_threshold: ExceedThreshold::Count(EXCEED_FILE_COUNT),
            min_files: MIN_CANDIDATE_FILES,
            band_sigma: BAND_SIGMA_MULTIPLIER,
            tilt_band_scale: TILT_BAND_SCALE,
            session_bin_width: SESSION_FINE_BIN_M,
            session_ratio_threshold: SESSION_ANOMALY_RATIO,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            shock_trim: ShockTrimConfig::default(),
            cleaning: CleaningConfig::default(),
            position: PositionConfig::default(),
            binning: BinningConfig::default(),
            detection: DetectionConfig::default(),
            plot: PlotConfig::default(),
        }
    }
}

fn require_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("{name} must be positive, got {value}")))
    }
}

fn require_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("{name} must be non-negative, got {value}")))
    }
}

impl AnalysisConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values that would make a stage divide by zero or never trigger.
    pub fn validate(&self) -> Result<()> {
        let trim = &self.shock_trim;
        require_positive("shock_trim.threshold", trim.threshold)?;
        require_positive("shock_trim.smoothing_window_s", trim.smoothing_window_s)?;
        require_non_negative("shock_trim.min_event_s", trim.min_event_s)?;
        require_non_negative("shock_trim.buffer_s", trim.buffer_s)?;

        require_positive("cleaning.z_threshold", self.cleaning.z_threshold)?;
        require_positive("position.track_length_m", self.position.track_length_m)?;

        let bins = &self.binning;
        require_positive("binning.gyro_bin_width", bins.gyro_bin_width)?;
        require_positive("binning.pitch_tilt_bin_width", bins.pitch_tilt_bin_width)?;
        require_non_negative("binning.gyro_iqr_multiplier", bins.gyro_iqr_multiplier)?;
        require_non_negative("binning.reference_iqr_multiplier", bins.reference_iqr_multiplier)?;
        require_positive("binning.display_range_width", bins.display_range_width)?;
        if let (Some(min), Some(max)) = (bins.clip_min, bins.clip_max) {
            if min > max {
                return Err(Error::InvalidConfig(format!(
                    "binning.clip_min ({min}) exceeds binning.clip_max ({max})"
                )));
            }
        }

        let det = &self.detection;
        require_positive("detection.coarse_bin_width", det.coarse_bin_width)?;
        require_non_negative("detection.band_sigma", det.band_sigma)?;
        require_non_negative("detection.tilt_band_scale", det.tilt_band_scale)?;
        require_positive("detection.session_bin_width", det.session_bin_width)?;
        if !(0.0..=1.0).contains(&det.session_ratio_threshold) {
            return Err(Error::InvalidConfig(format!(
                "detection.session_ratio_threshold must be within [0, 1], got {}",
                det.session_ratio_threshold
            )));
        }
        if self.plot.width == 0 || self.plot.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "plot size must be non-zero, got {}x{}",
                self.plot.width, self.plot.height
            )));
        }
        match det.exceed_threshold {
            ExceedThreshold::Count(0) => {
                return Err(Error::InvalidConfig(
                    "detection.exceed_threshold count must be at least 1".to_string(),
                ))
            }
            ExceedThreshold::Fraction(f) if !(f > 0.0 && f <= 1.0) => {
                return Err(Error::InvalidConfig(format!(
                    "detection.exceed_threshold fraction must be within (0, 1], got {f}"
                )))
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cleaning.channels.len(), 6);
        assert_eq!(config.detection.exceed_threshold, ExceedThreshold::Count(6));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "position:\n  track_length_m: 2.19\ndetection:\n  exceed_threshold:\n    fraction: 0.5\n";
        let config = AnalysisConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.position.track_length_m, 2.19);
        assert_eq!(config.detection.exceed_threshold, ExceedThreshold::Fraction(0.5));
        assert_eq!(config.shock_trim, ShockTrimConfig::default());
    }

    #[test]
    fn test_cleaning_channels_use_column_names() {
        let yaml = "cleaning:\n  channels: [accel_y, pitch]\n";
        let config = AnalysisConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.cleaning.channels, vec![SensorChannel::AccelY, SensorChannel::Pitch]);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = AnalysisConfig::default();
        config.position.track_length_m = 0.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = AnalysisConfig::default();
        config.binning.clip_min = Some(3.0);
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.detection.exceed_threshold = ExceedThreshold::Fraction(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_exceed_threshold() {
        assert!(ExceedThreshold::Count(6).is_met(6, 9));
        assert!(!ExceedThreshold::Count(6).is_met(5, 9));
        assert!(ExceedThreshold::Fraction(2.0 / 3.0).is_met(6, 9));
        assert!(!ExceedThreshold::Fraction(0.7).is_met(6, 9));
        assert!(!ExceedThreshold::Fraction(0.5).is_met(0, 0));
    }

    #[test]
    fn test_time_unit_scale() {
        assert_eq!(TimeUnit::Nanoseconds.seconds_per_unit(), 1e-9);
        assert_eq!(TimeUnit::Seconds.seconds_per_unit(), 1.0);
    }
}
