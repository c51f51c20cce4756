use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};

use super::transform::SkewCorrector;
use crate::config::calibration::Calibration;
use crate::error::{Result, SkewError};

const OUTPUT_SUFFIX: &str = "-fix-skew";

/// Totals for one corrected stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrectionReport {
    pub lines: usize,
    pub modified: usize,
}

/// Run every line of `reader` through `corrector` into `writer`.
///
/// Line endings (`\n`, `\r\n`, or none on the last line) are carried over as
/// they are, so untouched lines come out byte-for-byte identical.
pub fn correct_stream<R: BufRead, W: Write>(
    corrector: &mut SkewCorrector,
    mut reader: R,
    mut writer: W,
) -> Result<CorrectionReport> {
    let mut buf = String::new();
    loop {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            break;
        }
        let content = match buf.strip_suffix('\n') {
            Some(s) => s.strip_suffix('\r').unwrap_or(s),
            None => buf.as_str(),
        };
        let ending = &buf[content.len()..];

        let corrected = corrector.process(content)?;
        writer.write_all(corrected.as_bytes())?;
        writer.write_all(ending.as_bytes())?;
    }
    writer.flush()?;

    Ok(CorrectionReport {
        lines: corrector.lines(),
        modified: corrector.modified(),
    })
}

/// Correct `input` into `output`, replacing `output` if it already exists.
/// On error whatever was written so far is left in `output`.
pub fn correct_file(cal: &Calibration, input: &Path, output: &Path) -> Result<CorrectionReport> {
    let mut corrector = SkewCorrector::new(cal)?;

    let reader = BufReader::new(File::open(input)?);
    if output.exists() {
        if fs::canonicalize(output)? == fs::canonicalize(input)? {
            return Err(SkewError::SameInputOutput(output.to_path_buf()));
        }
        warn!("Replacing existing {}", output.display());
    }
    let mut writer = BufWriter::new(File::create(output)?);

    info!("Correcting {} -> {}", input.display(), output.display());
    let report = correct_stream(&mut corrector, reader, &mut writer)?;
    writer.flush()?;
    info!("{} lines read, {} rewritten", report.lines, report.modified);
    Ok(report)
}

/// `part.gcode` -> `part-fix-skew.gcode`, next to the input
pub fn output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "gcode".to_string());
    input.with_file_name(format!("{stem}{OUTPUT_SUFFIX}.{ext}"))
}
