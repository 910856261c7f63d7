//! Reply buffer handed to command handlers.

use core::fmt::{self, Write};

use heapless::String;

use crate::{Diagnostic, OUTPUT_BUFFER_SIZE};

/// Significant digits used by [`write_general`].
const PRECISION: usize = 6;

/// Fixed-capacity text a handler fills during one dispatch call.
///
/// Writes never grow the buffer past [`OUTPUT_BUFFER_SIZE`]; text that does
/// not fit is cut at the last whole character, the way `snprintf` would.
#[derive(Debug, Default)]
pub struct Reply {
    buf: String<OUTPUT_BUFFER_SIZE>,
}

impl Reply {
    pub const fn new() -> Self {
        Self { buf: String::new() }
    }

    pub fn as_str(&self) -> &str {
        self.buf.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        OUTPUT_BUFFER_SIZE
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Replaces the contents with `text`. Returns `false` if it was truncated.
    pub fn set(&mut self, text: &str) -> bool {
        self.buf.clear();
        self.push_str(text)
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.set(diagnostic.message());
    }

    /// Appends `text`, truncating it if needed. Returns `false` if it was.
    pub fn push_str(&mut self, text: &str) -> bool {
        let room = OUTPUT_BUFFER_SIZE - self.buf.len();
        if text.len() <= room {
            return self.buf.push_str(text).is_ok();
        }

        let mut end = room;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let _ = self.buf.push_str(&text[..end]);
        false
    }
}

impl Write for Reply {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.push_str(s) { Ok(()) } else { Err(fmt::Error) }
    }
}

/// Formats `value` like C's `%g`: six significant digits, trailing zeros
/// removed, scientific notation below 1e-4 or from 1e6 upwards.
pub fn write_general<W: Write>(out: &mut W, value: f64) -> fmt::Result {
    if value.is_nan() {
        return out.write_str("nan");
    }
    if value.is_infinite() {
        return out.write_str(if value < 0.0 { "-inf" } else { "inf" });
    }

    let mut scientific: String<32> = String::new();
    write!(scientific, "{:.*e}", PRECISION - 1, value)?;
    let (mantissa, exponent) = scientific.split_once('e').ok_or(fmt::Error)?;
    let exponent: i32 = exponent.parse().map_err(|_| fmt::Error)?;

    if exponent < -4 || exponent >= PRECISION as i32 {
        out.write_str(trim_fraction(mantissa))?;
        let sign = if exponent < 0 { '-' } else { '+' };
        write!(out, "e{}{:02}", sign, exponent.unsigned_abs())
    } else {
        let decimals = (PRECISION as i32 - 1 - exponent) as usize;
        let mut fixed: String<48> = String::new();
        write!(fixed, "{:.*}", decimals, value)?;
        out.write_str(trim_fraction(&fixed))
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn general(value: f64) -> std::string::String {
        let mut out = std::string::String::new();
        write_general(&mut out, value).unwrap();
        out
    }

    #[test]
    fn general_format_matches_printf() {
        assert_eq!(general(3.0), "3");
        assert_eq!(general(5.0), "5");
        assert_eq!(general(-2.5), "-2.5");
        assert_eq!(general(0.1 + 0.2), "0.3");
        assert_eq!(general(1.0 / 3.0), "0.333333");
        assert_eq!(general(2.0 / 3.0), "0.666667");
        assert_eq!(general(123457.0), "123457");
        assert_eq!(general(0.0001), "0.0001");
        assert_eq!(general(0.00001), "1e-05");
        assert_eq!(general(1_000_000.0), "1e+06");
        assert_eq!(general(999_999.0 * 999_999.0), "9.99998e+11");
        assert_eq!(general(0.0), "0");
        assert_eq!(general(-0.0), "-0");
    }

    #[test]
    fn non_finite_values() {
        assert_eq!(general(f64::INFINITY), "inf");
        assert_eq!(general(f64::NEG_INFINITY), "-inf");
        assert_eq!(general(f64::NAN), "nan");
    }

    #[test]
    fn overlong_text_is_truncated_on_char_boundary() {
        let mut reply = Reply::new();
        let mut text = std::string::String::new();
        for _ in 0..OUTPUT_BUFFER_SIZE - 1 {
            text.push('a');
        }
        text.push('ñ');

        assert!(!reply.set(&text));
        assert_eq!(reply.as_str().len(), OUTPUT_BUFFER_SIZE - 1);
        assert!(reply.as_str().ends_with('a'));
    }

    #[test]
    fn report_replaces_previous_contents() {
        let mut reply = Reply::new();
        reply.set("stale");
        reply.report(Diagnostic::DivisionByZero);
        assert_eq!(reply.as_str(), "ERROR\r\n");
    }
}
