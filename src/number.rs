//! Decimal number validation for command parameters.
//!
//! The accepted grammar is deliberately narrow: an optional leading `-`,
//! digits, and at most one `.` that is not the last character. Exponents,
//! `+` signs, hex and `inf`/`nan` forms are all refused here even though
//! `f64::from_str` would take them.

/// Largest number of digits a parameter may carry, sign and point excluded.
pub const MAX_DIGITS: usize = 6;

/// Hard ceiling on token length, checked before the grammar is scanned.
pub const MAX_TOKEN_LENGTH: usize = f32::DIGITS as usize + 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Validation {
    NonNumeric,
    Overflow,
    Numeric,
}

pub fn validate_number(token: &str) -> Validation {
    let bytes = token.as_bytes();

    if bytes.len() > MAX_TOKEN_LENGTH {
        return Validation::Overflow;
    }

    let unsigned = bytes.strip_prefix(b"-").unwrap_or(bytes);

    let mut digits = 0;
    let mut point = false;
    for &byte in unsigned {
        match byte {
            b'0'..=b'9' => digits += 1,
            b'.' if !point => point = true,
            _ => return Validation::NonNumeric,
        }
    }

    if digits == 0 || unsigned.last() == Some(&b'.') {
        return Validation::NonNumeric;
    }

    if digits > MAX_DIGITS {
        return Validation::Overflow;
    }

    Validation::Numeric
}
