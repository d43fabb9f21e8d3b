// src/axis_names.rs

//! Centralized sensor axis and column naming.
//!
//! Keeps the CSV column spellings used by the phone logger and the
//! derived `_add` files in one place.

pub const AXIS_COUNT: usize = 3;

pub const TIME_COLUMN: &str = "time";
pub const TIME_COLUMN_ALIAS: &str = "timestamp";
pub const ACCEL_COLUMNS: [&str; AXIS_COUNT] = ["accel_x", "accel_y", "accel_z"];
pub const GYRO_COLUMNS: [&str; AXIS_COUNT] = ["gyro_x", "gyro_y", "gyro_z"];
pub const PITCH_COLUMN: &str = "pitch";
pub const ROLL_COLUMN: &str = "roll";

/// Forward (longitudinal) accelerometer axis for a phone mounted along the track
pub const FORWARD_ACCEL_AXIS: usize = 1;

// Derived columns
pub const POSITION_COLUMN: &str = "position";
pub const GYRO_MAGNITUDE_COLUMN: &str = "gyro";
pub const CUMULATIVE_PITCH_COLUMN: &str = "cumulative_pitch";
pub const CUMULATIVE_ROLL_COLUMN: &str = "cumulative_roll";
pub const TILT_COLUMN: &str = "tilt";
