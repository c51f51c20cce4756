use std::path::PathBuf;

use thiserror::Error;

use crate::gcode::types::Axis;

/// Everything that can stop a skew correction run
#[derive(Error, Debug)]
pub enum SkewError {
    #[error("Invalid calibration: baseline {baseline} must be greater than |offset| {offset}")]
    InvalidCalibration { offset: f64, baseline: f64 },

    #[error("Malformed {axis} coordinate on line {line_no}: {line}")]
    MalformedCoordinate {
        line_no: usize,
        axis: Axis,
        line: String,
    },

    #[error("Output path is the same as the input: {0}")]
    SameInputOutput(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read calibration file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, SkewError>;
