//! Per-column schema checks.
//!
//! Each check looks at one column against its [`ColumnSpec`] and returns at
//! most one anomaly summarizing every offending value.

use crate::schema::{ColumnSpec, SemanticType};
use crate::types::Anomaly;
use crate::utils::{
    MISMATCH_SAMPLES, distinct_strings, is_error_marker, is_integer_dtype, is_numeric_dtype,
    is_text_dtype, parse_numeric_string, string_values,
};
use polars::prelude::*;

/// Values that cannot be read as the declared semantic type.
pub(crate) fn check_type(
    spec: &ColumnSpec,
    series: &Series,
    numeric: &[Option<f64>],
) -> PolarsResult<Option<Anomaly>> {
    let dtype = series.dtype();
    let expected = spec.semantic_type;

    let offending: Vec<String> = match expected {
        SemanticType::Integer | SemanticType::Float if is_numeric_dtype(dtype) => numeric
            .iter()
            .flatten()
            .filter(|v| !expected.accepts(**v))
            .map(|v| v.to_string())
            .collect(),
        SemanticType::Integer | SemanticType::Float if dtype == &DataType::String => series
            .str()?
            .into_iter()
            .flatten()
            .filter(|raw| {
                !is_error_marker(raw)
                    && parse_numeric_string(raw).is_none_or(|v| !expected.accepts(v))
            })
            .map(|raw| raw.to_string())
            .collect(),
        SemanticType::Categorical | SemanticType::Identifier
            if is_text_dtype(dtype) || is_integer_dtype(dtype) =>
        {
            Vec::new()
        }
        _ => string_values(series)?.into_iter().flatten().collect(),
    };

    if offending.is_empty() {
        return Ok(None);
    }
    Ok(Some(Anomaly::TypeMismatch {
        column: spec.name.clone(),
        expected,
        count: offending.len(),
        samples: offending.into_iter().take(MISMATCH_SAMPLES).collect(),
    }))
}

/// Nulls in a column that does not accept them.
pub(crate) fn check_nulls(spec: &ColumnSpec, series: &Series) -> Option<Anomaly> {
    let count = series.null_count();
    (!spec.nullable && count > 0).then(|| Anomaly::UnexpectedNull {
        column: spec.name.clone(),
        count,
    })
}

/// Values below the declared lower bound.
pub(crate) fn check_minimum(spec: &ColumnSpec, numeric: &[Option<f64>]) -> Option<Anomaly> {
    let minimum = spec.minimum?;
    let count = numeric.iter().flatten().filter(|v| **v < minimum).count();
    (count > 0).then(|| Anomaly::OutOfRange {
        column: spec.name.clone(),
        minimum,
        count,
    })
}

/// Identifier values seen more than once.
pub(crate) fn check_identifier(
    spec: &ColumnSpec,
    series: &Series,
) -> PolarsResult<Option<Anomaly>> {
    if spec.semantic_type != SemanticType::Identifier {
        return Ok(None);
    }
    let present = series.len() - series.null_count();
    let count = present - distinct_strings(series)?.len();
    Ok((count > 0).then(|| Anomaly::DuplicateIdentifier {
        column: spec.name.clone(),
        count,
    }))
}
