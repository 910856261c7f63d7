//! Space-delimited parameter access over a command line.
//!
//! Token 0 is the command name; parameters are numbered from 1. Runs of
//! spaces count as a single delimiter and trailing spaces never produce an
//! empty parameter.

use crate::Diagnostic;
use crate::number::{Validation, validate_number};
use crate::reply::Reply;

/// Iterator over the `(offset, length)` of every parameter after the command name.
#[derive(Debug, Clone)]
pub struct Parameters<'a> {
    line: &'a [u8],
    pos: usize,
}

impl<'a> Parameters<'a> {
    pub fn new(line: &'a str) -> Self {
        let line = line.as_bytes();
        let pos = line.iter().position(|&b| b == b' ').unwrap_or(line.len());
        Self { line, pos }
    }
}

impl Iterator for Parameters<'_> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while self.line.get(self.pos) == Some(&b' ') {
            self.pos += 1;
        }
        if self.pos >= self.line.len() {
            return None;
        }

        let start = self.pos;
        while self.pos < self.line.len() && self.line[self.pos] != b' ' {
            self.pos += 1;
        }
        Some((start, self.pos - start))
    }
}

/// Offset and length of the `n`th parameter (1-indexed), if present.
pub fn get_parameter(line: &str, n: usize) -> Option<(usize, usize)> {
    let index = n.checked_sub(1)?;
    Parameters::new(line).nth(index)
}

/// Text of the `n`th parameter (1-indexed), if present.
pub fn parameter(line: &str, n: usize) -> Option<&str> {
    let (offset, len) = get_parameter(line, n)?;
    line.get(offset..offset + len)
}

pub fn parameter_count(line: &str) -> usize {
    Parameters::new(line).count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValidationError {
    NonNumeric,
    Overflow,
}

impl From<ValidationError> for Diagnostic {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::NonNumeric => Diagnostic::NonNumericParameter,
            ValidationError::Overflow => Diagnostic::ParameterOverflow,
        }
    }
}

/// Validates parameters 1 and 2 and parses them as `f64`.
///
/// On failure the matching diagnostic is already written into `reply`. A
/// non-numeric parameter is reported ahead of an overflowing one.
pub fn extract_operands(line: &str, reply: &mut Reply) -> Result<(f64, f64), ValidationError> {
    let first = parameter(line, 1);
    let second = parameter(line, 2);

    let check = |token: Option<&str>| token.map_or(Validation::NonNumeric, validate_number);
    let verdicts = [check(first), check(second)];

    let outcome = if verdicts.contains(&Validation::NonNumeric) {
        Err(ValidationError::NonNumeric)
    } else if verdicts.contains(&Validation::Overflow) {
        Err(ValidationError::Overflow)
    } else {
        match (parse(first), parse(second)) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(ValidationError::NonNumeric),
        }
    };

    if let Err(err) = outcome {
        reply.report(err.into());
    }
    outcome
}

fn parse(token: Option<&str>) -> Option<f64> {
    token?.parse().ok()
}
