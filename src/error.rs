// src/error.rs

//! Error types for the bridge monitor library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration file could not be parsed or written
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Report serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A column the current stage needs is absent from the file header
    #[error("missing required column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    /// No usable samples were read from a file
    #[error("session '{0}' contains no valid samples")]
    EmptySession(String),

    /// Position calibration is impossible for this session
    #[error("cannot calibrate position: {reason}")]
    CannotCalibrate { reason: String },

    /// Configuration values are out of range
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// Chart rendering failed
    #[error("Plot error: {0}")]
    Plot(String),
}

impl Error {
    pub(crate) fn calibrate(reason: impl Into<String>) -> Self {
        Error::CannotCalibrate {
            reason: reason.into(),
        }
    }

    /// Whether this error means the file should be skipped rather than counted as a failure.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Error::MissingColumn { .. } | Error::EmptySession(_))
    }
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
