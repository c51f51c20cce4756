use log::{debug, trace};

use super::parser;
use super::types::{Axis, CoordField};
use crate::config::calibration::Calibration;
use crate::error::{Result, SkewError};

/// Constants derived once from a [`Calibration`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkewFactors {
    /// Y shift per mm of X (shear)
    pub y_per_unit: f64,
    /// X stretch compensating the tilted axis
    pub x_per_unit: f64,
}

impl SkewFactors {
    pub fn from_calibration(cal: &Calibration) -> Result<Self> {
        cal.validate()?;
        let b = cal.baseline;
        let o = cal.offset;
        Ok(Self {
            y_per_unit: o / b,
            x_per_unit: b / (b * b - o * o).sqrt(),
        })
    }

    /// Machine coordinates that land on the intended `(x, y)`. Not rounded.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.x_per_unit, y - x * self.y_per_unit)
    }

    /// Inverse of [`apply`](Self::apply)
    pub fn invert(&self, x_out: f64, y_out: f64) -> (f64, f64) {
        let x = x_out / self.x_per_unit;
        (x, y_out + x * self.y_per_unit)
    }
}

/// Stateful line-by-line skew corrector.
///
/// G-code moves may omit an axis and rely on the last commanded value, so the
/// corrector keeps a cursor that must see every line of the stream in order.
#[derive(Debug, Clone)]
pub struct SkewCorrector {
    factors: SkewFactors,
    x: f64,
    y: f64,
    lines: usize,
    modified: usize,
}

impl SkewCorrector {
    pub fn new(cal: &Calibration) -> Result<Self> {
        let factors = SkewFactors::from_calibration(cal)?;
        debug!(
            "Skew factors for offset {} / baseline {}: y shift {:.6}/mm, x scale {:.7}",
            cal.offset, cal.baseline, factors.y_per_unit, factors.x_per_unit
        );
        Ok(Self {
            factors,
            x: 0.0,
            y: 0.0,
            lines: 0,
            modified: 0,
        })
    }

    pub fn factors(&self) -> SkewFactors {
        self.factors
    }

    /// Last known (uncorrected) X/Y
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Lines seen so far
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Lines rewritten so far
    pub fn modified(&self) -> usize {
        self.modified
    }

    /// Correct one line (without its line terminator).
    ///
    /// Non-move lines come back untouched. A move only gets rewritten when it
    /// carries both X and Y; a move with a single axis still updates the
    /// cursor but is emitted as-is.
    pub fn process(&mut self, line: &str) -> Result<String> {
        self.lines += 1;

        let Some(fields) = parser::parse_motion(line) else {
            return Ok(line.to_string());
        };

        if let Some(x) = &fields.x {
            self.x = self.field_value(x, line)?;
        }
        if let Some(y) = &fields.y {
            self.y = self.field_value(y, line)?;
        }

        let (Some(x_field), Some(y_field)) = (fields.x, fields.y) else {
            return Ok(line.to_string());
        };

        let (x_out, y_out) = self.factors.apply(self.x, self.y);
        let x_word = format!("X{}", format_coord(round3(x_out)));
        let y_word = format!("Y{}", format_coord(round3(y_out)));

        let mut words = [(x_field.span, x_word), (y_field.span, y_word)];
        words.sort_by_key(|(span, _)| span.start);

        let mut out = String::with_capacity(line.len() + 8);
        let mut cursor = 0;
        for (span, word) in &words {
            out.push_str(&line[cursor..span.start]);
            out.push_str(word);
            cursor = span.end;
        }
        out.push_str(&line[cursor..]);

        self.modified += 1;
        trace!("line {}: {} -> {}", self.lines, line, out);
        Ok(out)
    }

    fn field_value(&self, field: &CoordField<'_>, line: &str) -> Result<f64> {
        field.value().ok_or_else(|| malformed(self.lines, field.axis, line))
    }
}

fn malformed(line_no: usize, axis: Axis, line: &str) -> SkewError {
    SkewError::MalformedCoordinate {
        line_no,
        axis,
        line: line.to_string(),
    }
}

/// Round to 3 decimals on the exact binary value, exact ties going to the
/// even digit (`1.0625` -> `1.062`, `1.0005` -> `1.0`)
fn round3(v: f64) -> f64 {
    let r = format!("{v:.3}").parse().unwrap_or(v);
    // no "-0.0" in the output
    if r == 0.0 { 0.0 } else { r }
}

/// Plain decimal text, never exponent form, always with a decimal point (`50.0`)
fn format_coord(v: f64) -> String {
    let s = v.to_string();
    if s.contains('.') { s } else { format!("{s}.0") }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corrector(offset: f64, baseline: f64) -> SkewCorrector {
        SkewCorrector::new(&Calibration::new(offset, baseline)).unwrap()
    }

    #[test]
    fn test_measured_machine() {
        let mut c = corrector(1.3, 156.0);
        let f = c.factors();
        assert!((f.y_per_unit - 0.008333).abs() < 1e-6);
        assert!((f.x_per_unit - 1.0000347).abs() < 1e-7);

        assert_eq!(c.process("G1 X100 Y50 F1200").unwrap(), "G1 X100.003 Y49.167 F1200");
        assert_eq!(c.modified(), 1);
    }

    #[test]
    fn test_zero_offset_is_identity() {
        let mut c = corrector(0.0, 200.0);
        assert_eq!(c.process("G1 X10 Y5").unwrap(), "G1 X10.0 Y5.0");
        assert_eq!(c.process("G0 X12.34567 Y-7.5 Z0.3").unwrap(), "G0 X12.346 Y-7.5 Z0.3");
        assert_eq!(c.process("G1 X0 Y-0.0001").unwrap(), "G1 X0.0 Y0.0");
    }

    #[test]
    fn test_pass_through() {
        let mut c = corrector(1.3, 156.0);
        for line in [
            "",
            "; generated by slicer",
            "M104 S210",
            "T0",
            "G28",
            "G92 E0",
            "G10 L2 P1 X5 Y5",
            "G1 X20 E1.5",
            "G1 Y30 F600",
            "G1 Z0.2 F300",
            "G1 F1500 ; X-axis note",
        ] {
            assert_eq!(c.process(line).unwrap(), line);
        }
        assert_eq!(c.modified(), 0);
        assert_eq!(c.lines(), 11);
        // only the two single-axis moves touched the cursor
        assert_eq!(c.position(), (20.0, 30.0));
    }

    #[test]
    fn test_cursor_carries_between_lines() {
        let mut c = corrector(0.6, 1.0);

        assert_eq!(c.process("G1 X10 Y5").unwrap(), "G1 X12.5 Y-1.0");
        assert_eq!(c.position(), (10.0, 5.0));

        assert_eq!(c.process("G1 X20").unwrap(), "G1 X20");
        assert_eq!(c.position(), (20.0, 5.0));

        assert_eq!(c.process("G1 Y8").unwrap(), "G1 Y8");
        assert_eq!(c.position(), (20.0, 8.0));

        assert_eq!(c.modified(), 1);
    }

    #[test]
    fn test_modified_count() {
        let mut c = corrector(1.3, 156.0);
        let mut lines = Vec::new();
        for i in 0..7 {
            lines.push(format!("G1 X{i} Y{i} E0.1"));
            lines.push(format!("G1 X{i}"));
        }
        lines.extend(["M106", "G1 Z1", "; layer", "G0 Y3", "M107", "G4 P10"].map(String::from));
        assert_eq!(lines.len(), 20);

        for line in &lines {
            c.process(line).unwrap();
        }
        assert_eq!(c.modified(), 7);
        assert_eq!(c.lines(), 20);
    }

    #[test]
    fn test_only_first_words_rewritten() {
        let mut c = corrector(0.6, 1.0);
        assert_eq!(c.process("G1 Y5 X10 ; go").unwrap(), "G1 Y-1.0 X12.5 ; go");
        assert_eq!(c.process("g1 x10 y5 X99").unwrap(), "g1 X12.5 Y-1.0 X99");
        assert_eq!(c.process("G1X10Y5E2").unwrap(), "G1X12.5Y-1.0E2");
        assert_eq!(c.process("G1 X10 Y5 (X1 Y1)").unwrap(), "G1 X12.5 Y-1.0 (X1 Y1)");
    }

    #[test]
    fn test_rounding_ties_to_even() {
        let mut c = corrector(0.0, 100.0);
        assert_eq!(c.process("G1 X1.0625 Y1.0005").unwrap(), "G1 X1.062 Y1.0");
        assert_eq!(c.process("G1 X2.0 Y-1.0625").unwrap(), "G1 X2.0 Y-1.062");
        assert_eq!(round3(0.0015), 0.002);
        assert_eq!(round3(-0.0004), 0.0);
    }

    #[test]
    fn test_large_coordinates_stay_decimal() {
        assert_eq!(format_coord(2e16), "20000000000000000.0");
        assert_eq!(format_coord(100.003), "100.003");
        assert_eq!(format_coord(-7.0), "-7.0");

        let mut c = corrector(0.0, 100.0);
        assert_eq!(
            c.process("G0 X1 Y20000000000000000").unwrap(),
            "G0 X1.0 Y20000000000000000.0"
        );
    }

    #[test]
    fn test_negative_offset() {
        let mut c = corrector(-0.6, 1.0);
        assert_eq!(c.process("G0 X10 Y5").unwrap(), "G0 X12.5 Y11.0");
    }

    #[test]
    fn test_malformed_coordinate() {
        let mut c = corrector(1.3, 156.0);
        c.process("G1 X1 Y1").unwrap();
        let err = c.process("G1 X- Y10").unwrap_err();
        match err {
            SkewError::MalformedCoordinate { line_no, axis, line } => {
                assert_eq!(line_no, 2);
                assert_eq!(axis, Axis::X);
                assert_eq!(line, "G1 X- Y10");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = c.process("G0 X5 Y.").unwrap_err();
        assert!(matches!(err, SkewError::MalformedCoordinate { axis: Axis::Y, .. }));
    }

    #[test]
    fn test_invalid_calibration() {
        for (offset, baseline) in [(10.0, 10.0), (-11.0, 10.0), (0.0, 0.0)] {
            let err = SkewCorrector::new(&Calibration::new(offset, baseline)).unwrap_err();
            assert!(matches!(err, SkewError::InvalidCalibration { .. }));
        }
    }

    #[test]
    fn test_apply_invert_round_trip() {
        for (offset, baseline) in [(1.3, 156.0), (-2.0, 120.0), (0.0, 50.0), (30.0, 100.0)] {
            let f = SkewFactors::from_calibration(&Calibration::new(offset, baseline)).unwrap();
            for &(x, y) in &[(0.0, 0.0), (100.0, 50.0), (-35.25, 210.5), (235.0, -4.125)] {
                let (xo, yo) = f.apply(x, y);
                let (xr, yr) = f.invert(round3(xo), round3(yo));
                assert!((xr - x).abs() <= 1e-3, "x {x} -> {xr}");
                assert!((yr - y).abs() <= 1e-3, "y {y} -> {yr}");
            }
        }
    }
}
