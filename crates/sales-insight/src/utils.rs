//! Shared utilities for validation, cleaning and aggregation.
//!
//! Helpers here convert polars columns into plain Rust vectors so that the
//! per-row logic elsewhere stays independent of the column's physical dtype.

use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    is_integer_dtype(dtype) || matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Check if a DataType is an integer type.
#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Check if a DataType holds text.
#[inline]
pub fn is_text_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String | DataType::Categorical(_, _))
}

/// Short dtype name for reports.
pub fn dtype_name(dtype: &DataType) -> String {
    dtype.to_string()
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// Common error/missing value markers in data.
pub const ERROR_MARKERS: [&str; 9] = [
    "error", "unknown", "n/a", "na", "nan", "null", "missing", "none", "#n/a",
];

/// Number of offending values quoted in a type mismatch.
pub const MISMATCH_SAMPLES: usize = 5;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Clean a string for numeric parsing by removing formatting characters.
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Check if a string is an error/missing value marker.
pub fn is_error_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.is_empty() || ERROR_MARKERS.iter().any(|&marker| lower == marker)
}

/// Try to parse a string as a numeric value (f64).
///
/// Handles currency symbols, percentages and thousands separators.
/// Non-finite results are rejected.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Trim and collapse internal whitespace runs to a single space.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s.trim(), " ").into_owned()
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// =============================================================================
// Column Extraction Utilities
// =============================================================================

/// Read a column as optional floats.
///
/// Numeric columns are cast; textual columns are parsed value by value
/// (unparseable text becomes `None`); other dtypes yield all `None`.
pub fn numeric_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    if is_numeric_dtype(series.dtype()) {
        let float_series = series.cast(&DataType::Float64)?;
        let values = float_series.f64()?.into_iter().collect();
        Ok(values)
    } else if series.dtype() == &DataType::String {
        let values = series
            .str()?
            .into_iter()
            .map(|opt| opt.and_then(parse_numeric_string))
            .collect();
        Ok(values)
    } else {
        Ok(vec![None; series.len()])
    }
}

/// Read a column as optional owned strings, whatever its dtype.
pub fn string_values(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let str_series = series.cast(&DataType::String)?;
    let values = str_series
        .str()?
        .into_iter()
        .map(|opt| opt.map(|s| s.to_string()))
        .collect();
    Ok(values)
}

/// Sorted distinct non-null values of a column.
pub fn distinct_strings(series: &Series) -> PolarsResult<Vec<String>> {
    let mut values: Vec<String> = string_values(series)?.into_iter().flatten().collect();
    values.sort();
    values.dedup();
    Ok(values)
}

/// Arithmetic mean of the non-null values, `None` when there are none.
pub fn mean_of(values: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
        assert!(is_integer_dtype(&DataType::UInt32));
        assert!(!is_integer_dtype(&DataType::Float32));
    }

    #[test]
    fn test_clean_numeric_string() {
        assert_eq!(clean_numeric_string("$1,234.56"), "1234.56");
        assert_eq!(clean_numeric_string("  42%  "), "42");
        assert_eq!(clean_numeric_string("€100"), "100");
    }

    #[test]
    fn test_is_error_marker() {
        assert!(is_error_marker("N/A"));
        assert!(is_error_marker("  missing "));
        assert!(is_error_marker(""));
        assert!(!is_error_marker("42"));
    }

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_numeric_string("42"), Some(42.0));
        assert_eq!(parse_numeric_string("$1,234.56"), Some(1234.56));
        assert_eq!(parse_numeric_string("-100"), Some(-100.0));
        assert_eq!(parse_numeric_string(""), None);
        assert_eq!(parse_numeric_string("abc"), None);
        assert_eq!(parse_numeric_string("inf"), None);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Email   +  Call "), "Email + Call");
        assert_eq!(collapse_whitespace("Call"), "Call");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(93.934_7, 2), 93.93);
        assert_eq!(round_to(100.0, 2), 100.0);
        assert_eq!(round_to(0.125_1, 2), 0.13);
    }

    #[test]
    fn test_numeric_values_from_text() {
        let series = Series::new("revenue".into(), &[Some("10.5"), None, Some("abc"), Some("$20")]);
        let values = numeric_values(&series).unwrap();
        assert_eq!(values, vec![Some(10.5), None, None, Some(20.0)]);
    }

    #[test]
    fn test_numeric_values_from_integers() {
        let series = Series::new("week".into(), &[Some(1i64), None, Some(3)]);
        let values = numeric_values(&series).unwrap();
        assert_eq!(values, vec![Some(1.0), None, Some(3.0)]);
    }

    #[test]
    fn test_distinct_strings_sorted() {
        let series = Series::new("m".into(), &[Some("b"), Some("a"), None, Some("b")]);
        assert_eq!(distinct_strings(&series).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_mean_of() {
        assert_eq!(mean_of(&[Some(10.0), None, Some(20.0)]), Some(15.0));
        assert_eq!(mean_of(&[None, None]), None);
        assert_eq!(mean_of(&[]), None);
    }
}
