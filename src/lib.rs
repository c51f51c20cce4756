//! skewfix - XY skew correction for G-code produced for cantilevered-axis printers.
//!
//! The X axis of a cantilever printer may not sit exactly perpendicular to Y.
//! Moving along X then drifts Y by a constant amount per millimetre and the
//! real X travel comes up slightly short. This crate rewrites G0/G1 moves so
//! the printed part comes out square.

pub mod config;
pub mod error;
pub mod gcode;

pub use config::calibration::Calibration;
pub use error::{Result, SkewError};
pub use gcode::file::{CorrectionReport, correct_file, correct_stream, output_path};
pub use gcode::transform::{SkewCorrector, SkewFactors};
