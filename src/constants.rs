// src/constants.rs

use plotters::style::colors::full_palette::{
    AMBER, BLUE, DEEPPURPLE, GREEN, GREY, LIGHTBLUE, ORANGE, PURPLE, RED,
};
use plotters::style::RGBColor;

// --- Shock-trim defaults ---
pub const SHOCK_GYRO_THRESHOLD: f64 = 0.3; // Smoothed gyro magnitude above which a bump is assumed
pub const SHOCK_SMOOTHING_WINDOW_S: f64 = 0.2; // Centered moving-average window
pub const SHOCK_MIN_EVENT_S: f64 = 0.05; // Shorter excursions are noise, not bumps
pub const SHOCK_BUFFER_S: f64 = 0.05; // Extra margin cut after/before the bump regions

// --- Outlier cleaning ---
pub const OUTLIER_Z_THRESHOLD: f64 = 3.0;
pub const DEFAULT_CLEAN_CHANNELS: [&str; 6] = ["accel_y", "gyro_x", "gyro_y", "gyro_z", "pitch", "roll"];

// --- Position calibration ---
pub const DEFAULT_TRACK_LENGTH_M: f64 = 2.5;
pub const MIN_ELAPSED_TIME_S: f64 = 1e-9;

// --- Binning ---
pub const GYRO_BIN_WIDTH_M: f64 = 0.1;
pub const PITCH_TILT_BIN_WIDTH_M: f64 = 0.1;
pub const DISPLAY_RANGE_WIDTH_M: f64 = 0.5; // Coarse ranges of the summary table
pub const GYRO_IQR_MULTIPLIER: f64 = 1.5;
pub const REFERENCE_SET_IQR_MULTIPLIER: f64 = 2.5; // Baseline-set summaries use a wider fence
pub const POSITION_CLIP_MIN_M: f64 = 0.0;
pub const POSITION_CLIP_MAX_M: f64 = 2.5;

// --- Anomaly detection ---
pub const DETECTION_COARSE_BIN_M: f64 = 0.2;
pub const MIN_CANDIDATE_FILES: usize = 9;
pub const EXCEED_FILE_COUNT: usize = 6; // "6 of 9 files exceed"
pub const BAND_SIGMA_MULTIPLIER: f64 = 3.0;
pub const TILT_BAND_SCALE: f64 = 0.25;
pub const SESSION_FINE_BIN_M: f64 = 0.3;
pub const SESSION_ANOMALY_RATIO: f64 = 0.7;

// Guards floor() against representation error in bin centres such as 3 * 0.1
pub const BIN_EDGE_EPSILON: f64 = 1e-9;

// --- Plot dimensions ---
pub const PLOT_WIDTH: u32 = 1920;
pub const PLOT_HEIGHT: u32 = 1080;

// Font sizes
pub const FONT_SIZE_MAIN_TITLE: i32 = 24;
pub const FONT_SIZE_CHART_TITLE: i32 = 20;
pub const FONT_SIZE_AXIS_LABEL: i32 = 14;
pub const FONT_SIZE_LEGEND: i32 = 14;
pub const FONT_SIZE_MESSAGE: i32 = 20;

// --- Plot Color Assignments ---
pub const COLOR_GYRO_AXES: [&RGBColor; 3] = [&RED, &GREEN, &PURPLE];
pub const COLOR_ACCEL_Y: &RGBColor = &BLUE;
pub const COLOR_PITCH: &RGBColor = &GREEN;
pub const COLOR_ROLL: &RGBColor = &RED;
pub const COLOR_GYRO_RAW: &RGBColor = &DEEPPURPLE;
pub const COLOR_GYRO_SMOOTH: &RGBColor = &AMBER;
pub const COLOR_THRESHOLD: &RGBColor = &RED;
pub const COLOR_SHOCK_REGION: &RGBColor = &RED;
pub const COLOR_STABLE_MARKER: &RGBColor = &GREEN;
pub const COLOR_RUN_TRACE: &RGBColor = &GREY;
pub const COLOR_MEAN: &RGBColor = &LIGHTBLUE;
pub const COLOR_MAX: &RGBColor = &GREEN;
pub const COLOR_UPPER_BOUND: &RGBColor = &ORANGE;
pub const COLOR_BAND: &RGBColor = &DEEPPURPLE;

pub const RUN_TRACE_OPACITY: f64 = 0.35;
pub const BAND_OPACITY: f64 = 0.25;
pub const SHOCK_REGION_OPACITY: f64 = 0.2;

// Stroke widths for lines
pub const LINE_WIDTH_PLOT: u32 = 1;
pub const LINE_WIDTH_SUMMARY: u32 = 3;
pub const LINE_WIDTH_LEGEND: u32 = 2;

// src/constants.rs
