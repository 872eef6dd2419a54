//! Dataset inspection against an explicit schema.
//!
//! [`DatasetInspector::inspect`] never mutates the dataset and never fails
//! on malformed data: missing columns, unreadable values and constraint
//! violations all come back as anomalies inside the [`ValidationReport`].

mod checks;

use crate::error::Result;
use crate::schema::{DatasetSchema, SemanticType};
use crate::types::{Anomaly, ColumnReport, ValidationReport};
use crate::utils::{distinct_strings, dtype_name, is_numeric_dtype, is_text_dtype, numeric_values};
use polars::prelude::*;
use tracing::{debug, info};

/// Maximum number of distinct values listed for a categorical column.
pub const UNIQUE_VALUES_CAP: usize = 50;

/// Inspector producing a [`ValidationReport`] for a dataset.
pub struct DatasetInspector;

impl DatasetInspector {
    /// Inspect a dataset against a schema.
    ///
    /// Schema columns absent from the dataset are reported first, in schema
    /// order. Per-column findings then follow the dataset's column order.
    pub fn inspect(df: &DataFrame, schema: &DatasetSchema) -> Result<ValidationReport> {
        let mut anomalies: Vec<Anomaly> = schema
            .columns()
            .iter()
            .filter(|spec| df.column(&spec.name).is_err())
            .map(|spec| Anomaly::MissingColumn {
                column: spec.name.clone(),
            })
            .collect();

        let mut columns = Vec::with_capacity(df.width());
        for col in df.get_columns() {
            let series = col.as_materialized_series();
            let name = series.name().to_string();
            let spec = schema.get(&name);
            let dtype = series.dtype();

            let treat_as_numeric =
                is_numeric_dtype(dtype) || spec.is_some_and(|s| s.semantic_type.is_numeric());
            let numeric = if treat_as_numeric {
                numeric_values(series)?
            } else {
                Vec::new()
            };

            let distinct = distinct_strings(series)?;
            let listed = match spec {
                Some(spec) => spec.semantic_type == SemanticType::Categorical,
                None => is_text_dtype(dtype),
            };
            let unique_values = if listed {
                distinct.iter().take(UNIQUE_VALUES_CAP).cloned().collect()
            } else {
                Vec::new()
            };

            let present = numeric.iter().flatten();
            let min = present.clone().copied().reduce(f64::min);
            let max = present.copied().reduce(f64::max);

            if let Some(spec) = spec {
                anomalies.extend(checks::check_type(spec, series, &numeric)?);
                anomalies.extend(checks::check_nulls(spec, series));
                anomalies.extend(checks::check_minimum(spec, &numeric));
                anomalies.extend(checks::check_identifier(spec, series)?);
            }

            debug!(
                "Inspected '{}': {} null(s), {} distinct",
                name,
                series.null_count(),
                distinct.len()
            );

            columns.push(ColumnReport {
                name,
                dtype: dtype_name(dtype),
                semantic_type: spec.map(|s| s.semantic_type),
                null_count: series.null_count(),
                distinct_count: distinct.len(),
                min,
                max,
                unique_values,
            });
        }

        let duplicate_row_count = if df.width() == 0 {
            0
        } else {
            df.height()
                - df.unique::<&str, &str>(None, UniqueKeepStrategy::First, None)?
                    .height()
        };

        info!(
            "Inspection found {} anomalies and {} duplicate row(s)",
            anomalies.len(),
            duplicate_row_count
        );

        Ok(ValidationReport {
            shape: df.shape(),
            columns,
            duplicate_row_count,
            anomalies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::columns;

    fn sales_frame() -> DataFrame {
        df! {
            columns::WEEK => [1i64, 2, 2, 6],
            columns::SALES_METHOD => ["Email", "email", "email", "Call"],
            columns::CUSTOMER_ID => ["a1", "b2", "b2", "d4"],
            columns::NB_SOLD => [10i64, 9, 9, 12],
            columns::REVENUE => [Some(100.5), None, None, Some(50.0)],
            columns::YEARS_AS_CUSTOMER => [1i64, 5, 5, 0],
            columns::NB_SITE_VISITS => [24i64, 28, 28, 30],
            columns::STATE => ["Texas", "Ohio", "Ohio", "Iowa"],
        }
        .unwrap()
    }

    #[test]
    fn test_inspect_clean_shape() {
        let df = sales_frame();
        let report = DatasetInspector::inspect(&df, &DatasetSchema::product_sales()).unwrap();

        assert_eq!(report.shape, (4, 8));
        assert_eq!(report.columns.len(), 8);
        assert_eq!(report.null_count(columns::REVENUE), Some(2));
        assert_eq!(report.duplicate_row_count, 1);

        let revenue = report.column(columns::REVENUE).unwrap();
        assert_eq!(revenue.min, Some(50.0));
        assert_eq!(revenue.max, Some(100.5));

        let method = report.column(columns::SALES_METHOD).unwrap();
        assert_eq!(method.distinct_count, 3);
        assert_eq!(method.unique_values, vec!["Call", "Email", "email"]);

        // Duplicate row repeats its customer id
        assert_eq!(
            report.anomalies,
            vec![Anomaly::DuplicateIdentifier {
                column: columns::CUSTOMER_ID.to_string(),
                count: 1
            }]
        );
    }

    #[test]
    fn test_inspect_does_not_mutate() {
        let df = sales_frame();
        let before = df.clone();
        DatasetInspector::inspect(&df, &DatasetSchema::product_sales()).unwrap();
        assert!(df.equals_missing(&before));
    }

    #[test]
    fn test_inspect_reports_missing_and_mismatched_columns() {
        let df = df! {
            columns::WEEK => [1i64, 2],
            columns::REVENUE => ["12.5", "lots"],
        }
        .unwrap();

        let report = DatasetInspector::inspect(&df, &DatasetSchema::product_sales()).unwrap();

        let missing: Vec<&str> = report
            .anomalies
            .iter()
            .filter(|a| a.code() == "MISSING_COLUMN")
            .map(|a| a.column())
            .collect();
        assert_eq!(missing.len(), 6);
        assert!(missing.contains(&columns::STATE));

        assert!(report.anomalies.iter().any(|a| matches!(
            a,
            Anomaly::TypeMismatch { column, count: 1, .. } if column == columns::REVENUE
        )));
        assert_eq!(report.column(columns::REVENUE).unwrap().max, Some(12.5));
    }

    #[test]
    fn test_inspect_empty_dataset() {
        let df = DataFrame::empty();
        let report = DatasetInspector::inspect(&df, &DatasetSchema::product_sales()).unwrap();
        assert_eq!(report.shape, (0, 0));
        assert_eq!(report.duplicate_row_count, 0);
        assert_eq!(report.anomalies.len(), 8);
    }
}
