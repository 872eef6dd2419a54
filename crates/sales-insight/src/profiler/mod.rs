//! Data profiling module for numeric columns.
//!
//! Profiling is informational only: it describes the distribution of each
//! requested column and counts values outside the IQR fences, but never
//! modifies a row.

mod statistics;

pub use statistics::{IQR_FENCE, summarize};

use crate::error::Result;
use crate::schema::SemanticType;
use crate::types::{Anomaly, SummaryStatistics};
use crate::utils::{MISMATCH_SAMPLES, is_numeric_dtype, numeric_values, string_values};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Data profiler for describing numeric columns.
pub struct DataProfiler;

impl DataProfiler {
    /// Describe each requested column and count its outliers.
    ///
    /// Missing or non-numeric columns are reported as anomalies and left out
    /// of the returned map.
    pub fn detect_outliers<S: AsRef<str>>(
        df: &DataFrame,
        columns: &[S],
    ) -> Result<(BTreeMap<String, SummaryStatistics>, Vec<Anomaly>)> {
        let mut statistics = BTreeMap::new();
        let mut anomalies = Vec::new();

        for name in columns {
            let name = name.as_ref();
            let Ok(col) = df.column(name) else {
                warn!("Cannot describe '{}': column not found", name);
                anomalies.push(Anomaly::MissingColumn {
                    column: name.to_string(),
                });
                continue;
            };
            let series = col.as_materialized_series();

            if !is_numeric_dtype(series.dtype()) {
                let samples = string_values(series)?
                    .into_iter()
                    .flatten()
                    .take(MISMATCH_SAMPLES)
                    .collect();
                anomalies.push(Anomaly::TypeMismatch {
                    column: name.to_string(),
                    expected: SemanticType::Float,
                    count: series.len() - series.null_count(),
                    samples,
                });
                continue;
            }

            let stats = summarize(&numeric_values(series)?);
            if stats.outlier_count > 0 {
                debug!(
                    "'{}' has {} value(s) outside {}x IQR",
                    name, stats.outlier_count, IQR_FENCE
                );
            }
            statistics.insert(name.to_string(), stats);
        }

        Ok((statistics, anomalies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_outliers_does_not_modify() {
        let df = df! {
            "nb_sold" => [10i64, 11, 12, 13, 100],
            "state" => ["A", "B", "C", "D", "E"],
        }
        .unwrap();
        let before = df.clone();

        let (stats, anomalies) =
            DataProfiler::detect_outliers(&df, &["nb_sold", "state", "revenue"]).unwrap();

        assert!(df.equals(&before));
        assert_eq!(stats.len(), 1);
        assert_eq!(stats["nb_sold"].outlier_count, 1);
        assert_eq!(stats["nb_sold"].median, Some(12.0));
        let codes: Vec<&str> = anomalies.iter().map(|a| a.code()).collect();
        assert_eq!(codes, vec!["TYPE_MISMATCH", "MISSING_COLUMN"]);
    }
}
