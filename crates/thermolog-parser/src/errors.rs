use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CleanerError {
    #[error("failed to open input '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create output '{}': {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create parent directories for '{}': {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to inspect header of '{}': {source}", path.display())]
    Inspect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output would overwrite its own input '{}'", path.display())]
    OutputIsInput { path: PathBuf },

    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to flush '{}': {source}", path.display())]
    Flush {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not determine the delimiter of '{}'", path.display())]
    UndetectableDelimiter { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    #[error("calibration anchor {name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    #[error("calibration anchors share the same voltage {voltage}")]
    DegenerateVoltage { voltage: f64 },
}
