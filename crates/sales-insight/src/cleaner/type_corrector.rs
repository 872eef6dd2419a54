//! Type correction for bringing columns in line with their declared schema.

use crate::error::Result;
use crate::schema::{DatasetSchema, SemanticType};
use crate::types::{Anomaly, CoercionOutcome};
use crate::utils::{
    MISMATCH_SAMPLES, dtype_name, is_error_marker, is_integer_dtype, parse_numeric_string,
};
use polars::prelude::*;
use tracing::{debug, warn};

/// Type corrector for converting columns to their declared semantic types.
pub struct TypeCorrector;

/// Parsed values of one textual column plus what could not be read.
struct ParsedColumn {
    values: Vec<Option<f64>>,
    rejected: usize,
    samples: Vec<String>,
}

impl TypeCorrector {
    /// Convert textual columns declared numeric into numeric columns.
    ///
    /// Missing markers ("N/A", "unknown", empty) become null silently. Any
    /// other value that does not parse becomes null and is counted in one
    /// `TypeMismatch` per column. Integer columns holding whole numbers
    /// become `Int64`, everything else `Float64`. Integer-typed columns
    /// declared `Float` are widened to `Float64`.
    pub fn coerce_to_schema(
        &self,
        df: &mut DataFrame,
        schema: &DatasetSchema,
    ) -> Result<(Vec<CoercionOutcome>, Vec<Anomaly>)> {
        let mut outcomes = Vec::new();
        let mut anomalies = Vec::new();

        for spec in schema.columns() {
            if !spec.semantic_type.is_numeric() {
                continue;
            }
            let Ok(col) = df.column(&spec.name) else {
                continue;
            };
            let series = col.as_materialized_series();
            let from_dtype = series.dtype().clone();

            let new_series = match &from_dtype {
                DataType::String => {
                    let parsed = Self::parse_column(series, spec.semantic_type)?;
                    if parsed.rejected > 0 {
                        warn!(
                            "{} value(s) in '{}' could not be read as {}",
                            parsed.rejected, spec.name, spec.semantic_type
                        );
                        anomalies.push(Anomaly::TypeMismatch {
                            column: spec.name.clone(),
                            expected: spec.semantic_type,
                            count: parsed.rejected,
                            samples: parsed.samples,
                        });
                    }
                    outcomes.push(CoercionOutcome {
                        column: spec.name.clone(),
                        from_dtype: dtype_name(&from_dtype),
                        to_dtype: String::new(),
                        rejected: parsed.rejected,
                    });
                    Self::build_series(&spec.name, spec.semantic_type, parsed.values)
                }
                dtype if spec.semantic_type == SemanticType::Float && is_integer_dtype(dtype) => {
                    outcomes.push(CoercionOutcome {
                        column: spec.name.clone(),
                        from_dtype: dtype_name(&from_dtype),
                        to_dtype: String::new(),
                        rejected: 0,
                    });
                    series.cast(&DataType::Float64)?
                }
                _ => continue,
            };

            if let Some(outcome) = outcomes.last_mut() {
                outcome.to_dtype = dtype_name(new_series.dtype());
                debug!(
                    "Coerced '{}' from {} to {}",
                    outcome.column, outcome.from_dtype, outcome.to_dtype
                );
            }
            df.replace(&spec.name, new_series)?;
        }

        Ok((outcomes, anomalies))
    }

    fn parse_column(series: &Series, expected: SemanticType) -> Result<ParsedColumn> {
        let mut parsed = ParsedColumn {
            values: Vec::with_capacity(series.len()),
            rejected: 0,
            samples: Vec::new(),
        };

        for opt in series.str()?.into_iter() {
            let value = match opt {
                None => None,
                Some(raw) if is_error_marker(raw) => None,
                Some(raw) => {
                    let number = parse_numeric_string(raw).filter(|v| expected.accepts(*v));
                    if number.is_none() {
                        parsed.rejected += 1;
                        if parsed.samples.len() < MISMATCH_SAMPLES {
                            parsed.samples.push(raw.to_string());
                        }
                    }
                    number
                }
            };
            parsed.values.push(value);
        }

        Ok(parsed)
    }

    fn build_series(name: &str, semantic_type: SemanticType, values: Vec<Option<f64>>) -> Series {
        match semantic_type {
            SemanticType::Integer => {
                let ints: Vec<Option<i64>> =
                    values.into_iter().map(|v| v.map(|x| x as i64)).collect();
                Series::new(name.into(), ints)
            }
            _ => Series::new(name.into(), values),
        }
    }
}
