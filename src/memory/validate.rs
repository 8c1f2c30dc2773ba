//! Input checks shared by every write and read path.
//!
//! All numeric bounds of the data model are enforced here, before any
//! statement runs. A failed check is always a [`MemoryError::Validation`].

use chrono::{DateTime, Utc};

use super::error::{MemoryError, MemoryResult};

/// Require `value` to lie in the closed interval `[lo, hi]`. NaN is rejected.
pub fn check_range(field: &str, value: f64, lo: f64, hi: f64) -> MemoryResult<()> {
    if value.is_nan() || value < lo || value > hi {
        return Err(MemoryError::Validation(format!(
            "{field} must be between {lo} and {hi}, got {value}"
        )));
    }
    Ok(())
}

pub fn check_unit(field: &str, value: f64) -> MemoryResult<()> {
    check_range(field, value, 0.0, 1.0)
}

pub fn check_signed_unit(field: &str, value: f64) -> MemoryResult<()> {
    check_range(field, value, -1.0, 1.0)
}

pub fn check_optional_unit(field: &str, value: Option<f64>) -> MemoryResult<()> {
    value.map_or(Ok(()), |v| check_unit(field, v))
}

pub fn check_not_blank(field: &str, value: &str) -> MemoryResult<()> {
    if value.trim().is_empty() {
        return Err(MemoryError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_timestamp(field: &str, value: &str) -> MemoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            MemoryError::Validation(format!("{field} is not an RFC 3339 timestamp ({value}): {e}"))
        })
}

/// A two-element closed numeric interval `[min, max]` inside `[lo, hi]`.
pub fn numeric_interval(field: &str, raw: &[f64], lo: f64, hi: f64) -> MemoryResult<(f64, f64)> {
    let [min, max] = two(field, raw)?;
    check_range(field, min, lo, hi)?;
    check_range(field, max, lo, hi)?;
    if min > max {
        return Err(MemoryError::Validation(format!(
            "{field} is malformed: min {min} is greater than max {max}"
        )));
    }
    Ok((min, max))
}

/// A two-element closed time interval `[start, end]`, returned as stored-format strings.
pub fn time_interval(field: &str, raw: &[String]) -> MemoryResult<(String, String)> {
    let [start, end] = two(field, raw)?;
    let start = parse_timestamp(field, &start)?;
    let end = parse_timestamp(field, &end)?;
    if start > end {
        return Err(MemoryError::Validation(format!(
            "{field} is malformed: start is after end"
        )));
    }
    Ok((super::format_timestamp(start), super::format_timestamp(end)))
}

fn two<T: Clone>(field: &str, raw: &[T]) -> MemoryResult<[T; 2]> {
    match raw {
        [a, b] => Ok([a.clone(), b.clone()]),
        _ => Err(MemoryError::Validation(format!(
            "{field} must have exactly two elements, got {}",
            raw.len()
        ))),
    }
}
