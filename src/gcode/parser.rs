use super::types::{Axis, CoordField, MotionFields};

/// Returns true for rapid/linear moves (`G0`, `G1`, `G00`, `g01`, `G1X10`...).
/// `G10`, `G17`, `G28` and friends are not moves.
pub fn is_motion(line: &str) -> bool {
    let code = line.trim_start();
    let Some(rest) = code.strip_prefix(['G', 'g']) else {
        return false;
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return false;
    }
    // Compare as text so overly long numbers can't overflow
    matches!(rest[..digits].trim_start_matches('0'), "" | "1")
}

/// Classify a line and pull out its X/Y words.
/// Returns `None` for anything that is not a G0/G1 move.
pub fn parse_motion(line: &str) -> Option<MotionFields<'_>> {
    if !is_motion(line) {
        return None;
    }
    Some(MotionFields {
        x: find_field(line, Axis::X),
        y: find_field(line, Axis::Y),
    })
}

/// First occurrence of `axis` followed by numeric text, ignoring comments.
pub fn find_field(line: &str, axis: Axis) -> Option<CoordField<'_>> {
    let bytes = line.as_bytes();
    let mut in_paren = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_paren {
            if b == b')' {
                in_paren = false;
            }
            continue;
        }
        match b {
            b';' => return None,
            b'(' => in_paren = true,
            _ if axis.matches(b) => {
                let len = numeric_len(&bytes[i + 1..]);
                if len > 0 {
                    return Some(CoordField {
                        axis,
                        span: i..i + 1 + len,
                        number: &line[i + 1..i + 1 + len],
                    });
                }
            }
            _ => {}
        }
    }
    None
}

/// Length of `[+-]? digits* dots* digits*` at the start of `bytes`
fn numeric_len(bytes: &[u8]) -> usize {
    let mut n = 0;
    if matches!(bytes.first(), Some(b'-' | b'+')) {
        n += 1;
    }
    n += bytes[n..].iter().take_while(|b| b.is_ascii_digit()).count();
    n += bytes[n..].iter().take_while(|&&b| b == b'.').count();
    n += bytes[n..].iter().take_while(|b| b.is_ascii_digit()).count();
    n
}
