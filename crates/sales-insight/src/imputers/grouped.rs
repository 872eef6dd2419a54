//! Grouped-mean imputation.
//!
//! Nulls in a numeric column are replaced with the mean of the non-null
//! values sharing the same group key. Groups without a single value to
//! average keep their nulls and are reported.

use crate::error::Result;
use crate::schema::SemanticType;
use crate::types::{Anomaly, GroupFill, ImputationOutcome};
use crate::utils::{MISMATCH_SAMPLES, is_numeric_dtype, numeric_values, string_values};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Running sum and count of one group's non-null values.
#[derive(Debug, Default, Clone, Copy)]
struct GroupAccumulator {
    sum: f64,
    count: usize,
    nulls: usize,
}

impl GroupAccumulator {
    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Imputer filling numeric nulls with their group's mean.
pub struct GroupedMeanImputer;

impl GroupedMeanImputer {
    /// Fill nulls in `target_column` with the mean of their `group_by_column` group.
    ///
    /// The target column becomes `Float64`. Row order is preserved. Groups
    /// are visited in key order so fills and anomalies are deterministic.
    pub fn impute_missing_numeric(
        df: &mut DataFrame,
        target_column: &str,
        group_by_column: &str,
    ) -> Result<(ImputationOutcome, Vec<Anomaly>)> {
        let mut outcome = ImputationOutcome {
            target_column: target_column.to_string(),
            group_by_column: group_by_column.to_string(),
            ..Default::default()
        };

        let missing: Vec<Anomaly> = [target_column, group_by_column]
            .into_iter()
            .filter(|name| df.column(name).is_err())
            .map(|name| Anomaly::MissingColumn {
                column: name.to_string(),
            })
            .collect();
        if !missing.is_empty() {
            warn!(
                "Cannot impute '{}' by '{}': column not found",
                target_column, group_by_column
            );
            return Ok((outcome, missing));
        }

        let target = df.column(target_column)?.as_materialized_series();
        if !is_numeric_dtype(target.dtype()) {
            let samples: Vec<String> = string_values(target)?
                .into_iter()
                .flatten()
                .take(MISMATCH_SAMPLES)
                .collect();
            let count = target.len() - target.null_count();
            warn!(
                "Cannot impute '{}': dtype {} is not numeric",
                target_column,
                target.dtype()
            );
            return Ok((
                outcome,
                vec![Anomaly::TypeMismatch {
                    column: target_column.to_string(),
                    expected: SemanticType::Float,
                    count,
                    samples,
                }],
            ));
        }

        let mut values = numeric_values(target)?;
        let keys = string_values(df.column(group_by_column)?.as_materialized_series())?;
        outcome.nulls_before = values.iter().filter(|v| v.is_none()).count();

        let mut groups: BTreeMap<&str, GroupAccumulator> = BTreeMap::new();
        let mut null_key_rows = 0;
        for (value, key) in values.iter().zip(keys.iter()) {
            match (key, value) {
                (Some(key), Some(v)) => {
                    let acc = groups.entry(key.as_str()).or_default();
                    acc.sum += v;
                    acc.count += 1;
                }
                (Some(key), None) => groups.entry(key.as_str()).or_default().nulls += 1,
                (None, None) => null_key_rows += 1,
                (None, Some(_)) => {}
            }
        }

        let means: BTreeMap<&str, f64> = groups
            .iter()
            .filter_map(|(key, acc)| acc.mean().map(|mean| (*key, mean)))
            .collect();

        for (value, key) in values.iter_mut().zip(keys.iter()) {
            if value.is_none()
                && let Some(key) = key
                && let Some(mean) = means.get(key.as_str())
            {
                *value = Some(*mean);
            }
        }

        let mut anomalies = Vec::new();
        for (key, acc) in &groups {
            if acc.nulls == 0 {
                continue;
            }
            match acc.mean() {
                Some(mean) => outcome.fills.push(GroupFill {
                    group: key.to_string(),
                    mean,
                    filled: acc.nulls,
                }),
                None => {
                    warn!(
                        "Group {}='{}' has no '{}' values; {} null(s) left unfilled",
                        group_by_column, key, target_column, acc.nulls
                    );
                    anomalies.push(Anomaly::UnresolvedNull {
                        column: target_column.to_string(),
                        group_by: group_by_column.to_string(),
                        group: Some(key.to_string()),
                        rows: acc.nulls,
                    });
                }
            }
        }
        if null_key_rows > 0 {
            warn!(
                "{} null(s) in '{}' left unfilled: '{}' is null on those rows",
                null_key_rows, target_column, group_by_column
            );
            anomalies.push(Anomaly::UnresolvedNull {
                column: target_column.to_string(),
                group_by: group_by_column.to_string(),
                group: None,
                rows: null_key_rows,
            });
        }

        outcome.nulls_after = values.iter().filter(|v| v.is_none()).count();
        df.replace(target_column, Series::new(target_column.into(), values))?;

        debug!(
            "Imputed '{}' by '{}': {} -> {} null(s)",
            target_column, group_by_column, outcome.nulls_before, outcome.nulls_after
        );

        Ok((outcome, anomalies))
    }
}
