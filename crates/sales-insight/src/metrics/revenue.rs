//! Revenue reductions: total, mean and average revenue per customer.

use crate::error::{AnalysisError, Result};
use crate::utils::{mean_of, numeric_values, round_to, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Decimal places kept in per-method averages.
pub const ARPC_DECIMALS: i32 = 2;

/// Revenue of one sales method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodRevenue {
    pub method: String,
    /// Mean revenue, rounded to two decimal places.
    pub mean: f64,
    /// Exact revenue sum of the method, not rounded.
    pub total: f64,
    /// Rows contributing to the mean.
    pub customers: usize,
}

/// Read a column as optional floats, failing if it does not exist.
pub(crate) fn revenue_values(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>> {
    let col = df
        .column(column)
        .map_err(|_| AnalysisError::ColumnNotFound(column.to_string()))?;
    Ok(numeric_values(col.as_materialized_series())?)
}

/// Read a column as optional strings, failing if it does not exist.
pub(crate) fn label_values(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
    let col = df
        .column(column)
        .map_err(|_| AnalysisError::ColumnNotFound(column.to_string()))?;
    Ok(string_values(col.as_materialized_series())?)
}

/// Sum of all non-null revenue values. Zero for an empty dataset.
pub fn total_revenue(df: &DataFrame, revenue_column: &str) -> Result<f64> {
    Ok(revenue_values(df, revenue_column)?.iter().flatten().sum())
}

/// Mean of all non-null revenue values.
pub fn mean_revenue(df: &DataFrame, revenue_column: &str) -> Result<Option<f64>> {
    Ok(mean_of(&revenue_values(df, revenue_column)?))
}

/// Average revenue per customer and total revenue for each sales method.
///
/// Rows with a null method or a null revenue are skipped. The result is
/// sorted ascending by the rounded mean; methods with equal means keep
/// alphabetical order.
pub fn arpc_by_method(
    df: &DataFrame,
    revenue_column: &str,
    method_column: &str,
) -> Result<Vec<MethodRevenue>> {
    let revenue = revenue_values(df, revenue_column)?;
    let methods = label_values(df, method_column)?;

    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for (value, method) in revenue.iter().zip(methods.iter()) {
        if let (Some(value), Some(method)) = (value, method) {
            let entry = groups.entry(method.as_str()).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }

    let mut result: Vec<MethodRevenue> = groups
        .into_iter()
        .map(|(method, (sum, count))| MethodRevenue {
            method: method.to_string(),
            mean: round_to(sum / count as f64, ARPC_DECIMALS),
            total: sum,
            customers: count,
        })
        .collect();
    result.sort_by(|a, b| a.mean.total_cmp(&b.mean));

    Ok(result)
}
