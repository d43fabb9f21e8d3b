// src/lib.rs - Library interface for the bridge monitoring pipeline

//! Position-binned vibration and tilt analysis of phone sensor logs recorded
//! while a vehicle crosses a bridge.
//!
//! Raw logs are shock-trimmed, cleaned, position-calibrated and turned into
//! derived signals ([`pipeline::process_session`]); sets of runs are summarized
//! per position bin and compared against a reference baseline
//! ([`pipeline::flag_anomalies`]).

pub mod axis_names;
pub mod config;
pub mod constants;
pub mod data_analysis;
pub mod data_input;
pub mod error;
pub mod pipeline;
pub mod plot_framework;
pub mod plot_functions;
pub mod types;

pub use config::AnalysisConfig;
pub use error::{Error, Result};
