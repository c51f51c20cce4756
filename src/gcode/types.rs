use std::fmt;
use std::ops::Range;

/// Positional axes the skew correction cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
        }
    }

    pub fn matches(self, b: u8) -> bool {
        b.to_ascii_uppercase() == self.letter() as u8
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// An axis word found in a motion line, e.g. `X-12.5` or `y40`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordField<'a> {
    pub axis: Axis,
    /// Byte range of the whole word (letter included) within the line
    pub span: Range<usize>,
    /// Numeric text after the letter
    pub number: &'a str,
}

impl CoordField<'_> {
    /// `None` for text such as `-`, `.` or `1..5` that the scanner accepts
    /// but which is not a number, or a digit run too long to be finite.
    pub fn value(&self) -> Option<f64> {
        self.number.parse().ok().filter(|v: &f64| v.is_finite())
    }
}

/// The X/Y words of one G0/G1 line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MotionFields<'a> {
    pub x: Option<CoordField<'a>>,
    pub y: Option<CoordField<'a>>,
}
