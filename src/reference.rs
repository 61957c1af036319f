//! Reference-table loading
//!
//! Conformance fixtures are plain-text comma-delimited numeric tables,
//! one table per pipeline stage, loaded as 2-D arrays of `f32` or
//! `Complex<f32>`. Complex entries use NumPy's textual form:
//! `(1.5+0.25j)`, `1.5-2e-3j`, `2j` or a bare real.

use std::fs;
use std::path::Path;

use num_complex::Complex;

use crate::{FeatureError, Result};

/// Load a real-valued table from a file
pub fn load_matrix<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<f32>>> {
    let text = fs::read_to_string(path.as_ref())?;
    parse_matrix(&text)
}

/// Load a complex-valued table from a file
pub fn load_complex_matrix<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<Complex<f32>>>> {
    let text = fs::read_to_string(path.as_ref())?;
    parse_complex_matrix(&text)
}

/// Parse a real-valued table from delimited text
pub fn parse_matrix(text: &str) -> Result<Vec<Vec<f32>>> {
    parse_rows(text, |token, line| {
        token.parse::<f32>().map_err(|_| {
            FeatureError::Parse(format!("line {}: invalid number `{}`", line, token))
        })
    })
}

/// Parse a complex-valued table from delimited text
pub fn parse_complex_matrix(text: &str) -> Result<Vec<Vec<Complex<f32>>>> {
    parse_rows(text, parse_complex)
}

/// Split delimited text into rows of parsed values, rejecting ragged rows
fn parse_rows<T, F>(text: &str, mut parse: F) -> Result<Vec<Vec<T>>>
where
    F: FnMut(&str, usize) -> Result<T>,
{
    let mut rows: Vec<Vec<T>> = Vec::new();

    for (line_idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row: Vec<T> = line
            .split(',')
            .map(|token| parse(token.trim(), line_idx + 1))
            .collect::<Result<_>>()?;

        if let Some(first) = rows.first() {
            if row.len() != first.len() {
                return Err(FeatureError::ShapeMismatch {
                    expected: (rows.len() + 1, first.len()),
                    actual: (rows.len() + 1, row.len()),
                });
            }
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Parse one complex entry
fn parse_complex(token: &str, line: usize) -> Result<Complex<f32>> {
    let bad = || FeatureError::Parse(format!("line {}: invalid complex number `{}`", line, token));

    let body = token
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(token);

    let imag_body = body.strip_suffix(['j', 'J']);
    let body = match imag_body {
        Some(b) => b,
        // no imaginary suffix: a bare real
        None => return Ok(Complex::new(body.parse::<f32>().map_err(|_| bad())?, 0.0)),
    };

    // split real and imaginary at the last sign that is not an exponent's
    let bytes = body.as_bytes();
    let split = (1..bytes.len()).rev().find(|&i| {
        matches!(bytes[i], b'+' | b'-') && !matches!(bytes[i - 1], b'e' | b'E')
    });

    match split {
        Some(i) => {
            let re = body[..i].parse::<f32>().map_err(|_| bad())?;
            let im = parse_signed_unit(&body[i..]).ok_or_else(bad)?;
            Ok(Complex::new(re, im))
        }
        None => {
            let im = parse_signed_unit(body).ok_or_else(bad)?;
            Ok(Complex::new(0.0, im))
        }
    }
}

/// Parse an imaginary part, where a bare sign (or nothing) means ±1
fn parse_signed_unit(s: &str) -> Option<f32> {
    match s {
        "" | "+" => Some(1.0),
        "-" => Some(-1.0),
        _ => s.parse::<f32>().ok(),
    }
}
