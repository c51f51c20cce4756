use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SkewError};

/// Measured skew of the machine.
///
/// Print or scribe a square, then measure:
/// * `offset`: how far (mm) the far X corner sits above (+) or below (-)
///   where it should be along Y
/// * `baseline`: the side length (mm) of the square the offset was measured on
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub offset: f64,
    pub baseline: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            offset: 1.3,
            baseline: 156.0,
        }
    }
}

impl Calibration {
    pub fn new(offset: f64, baseline: f64) -> Self {
        Self { offset, baseline }
    }

    /// `baseline` must be finite and strictly longer than `|offset|`,
    /// otherwise the stretch factor has no real value.
    pub fn validate(&self) -> Result<()> {
        let ok = self.offset.is_finite()
            && self.baseline.is_finite()
            && self.baseline > self.offset.abs();
        if ok {
            Ok(())
        } else {
            Err(SkewError::InvalidCalibration {
                offset: self.offset,
                baseline: self.baseline,
            })
        }
    }

    /// Replace whichever values were given on the command line
    pub fn with_overrides(mut self, offset: Option<f64>, baseline: Option<f64>) -> Self {
        if let Some(offset) = offset {
            self.offset = offset;
        }
        if let Some(baseline) = baseline {
            self.baseline = baseline;
        }
        self
    }

    pub fn json_path() -> PathBuf {
        std::env::current_exe()
            .unwrap_or_default()
            .parent()
            .unwrap_or(Path::new("."))
            .join("skew_calibration.json")
    }

    /// Calibration next to the executable, or the default one if there is none.
    pub fn load() -> Self {
        Self::load_or_default(&Self::json_path())
    }

    /// A file that exists but can't be parsed is reported, then ignored.
    pub fn load_or_default(path: &Path) -> Self {
        let Ok(data) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&data) {
            Ok(cal) => cal,
            Err(e) => {
                warn!(
                    "Ignoring unreadable calibration {}: {e}; using offset 1.3 / baseline 156",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Strict load for a user-supplied file
    pub fn load_from(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(|source| SkewError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| SkewError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
