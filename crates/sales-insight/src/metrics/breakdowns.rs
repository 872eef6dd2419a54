//! Exploratory breakdowns of revenue by channel, time and customer attributes.
//!
//! These are the series behind the count plot, bar and line charts and the
//! correlation heatmap of the exploratory analysis. All are pure reductions.

use super::revenue::{label_values, revenue_values};
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Number of rows carrying one label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// Revenue summed over the rows sharing one numeric key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedRevenue {
    pub key: f64,
    pub revenue: f64,
}

/// Revenue totals keyed by the values of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueBreakdown {
    pub column: String,
    pub points: Vec<KeyedRevenue>,
}

/// Weekly revenue of one sales method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSeries {
    pub method: String,
    pub points: Vec<KeyedRevenue>,
}

/// Row count and revenue of one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub region: String,
    pub count: usize,
    pub revenue: f64,
}

/// Pairwise Pearson correlations.
///
/// `values[i][j]` correlates `columns[i]` with `columns[j]`; `None` when
/// fewer than two rows have both values or either side is constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

/// Sort by key and merge equal keys, summing their revenue.
fn sum_by_key(mut pairs: Vec<(f64, f64)>) -> Vec<KeyedRevenue> {
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut points: Vec<KeyedRevenue> = Vec::new();
    for (key, revenue) in pairs {
        match points.last_mut() {
            Some(last) if last.key == key => last.revenue += revenue,
            _ => points.push(KeyedRevenue { key, revenue }),
        }
    }
    points
}

/// Row count per label, most frequent first; equal counts in label order.
pub fn label_counts(df: &DataFrame, column: &str) -> Result<Vec<LabelCount>> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for label in label_values(df, column)?.into_iter().flatten() {
        *counts.entry(label).or_default() += 1;
    }

    let mut result: Vec<LabelCount> = counts
        .into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect();
    result.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(result)
}

/// Revenue summed per value of a numeric column, in key order.
///
/// Rows where either the key or the revenue is null are skipped.
pub fn revenue_by(df: &DataFrame, revenue_column: &str, key_column: &str) -> Result<RevenueBreakdown> {
    let revenue = revenue_values(df, revenue_column)?;
    let keys = revenue_values(df, key_column)?;

    let pairs = keys
        .iter()
        .zip(revenue.iter())
        .filter_map(|(key, value)| Some(((*key)?, (*value)?)))
        .collect();

    Ok(RevenueBreakdown {
        column: key_column.to_string(),
        points: sum_by_key(pairs),
    })
}

/// Revenue per week for each sales method, methods in name order.
pub fn weekly_revenue_by_method(
    df: &DataFrame,
    revenue_column: &str,
    method_column: &str,
    week_column: &str,
) -> Result<Vec<MethodSeries>> {
    let revenue = revenue_values(df, revenue_column)?;
    let methods = label_values(df, method_column)?;
    let weeks = revenue_values(df, week_column)?;

    let mut per_method: BTreeMap<&str, Vec<(f64, f64)>> = BTreeMap::new();
    for ((value, method), week) in revenue.iter().zip(methods.iter()).zip(weeks.iter()) {
        if let (Some(value), Some(method), Some(week)) = (value, method, week) {
            per_method
                .entry(method.as_str())
                .or_default()
                .push((*week, *value));
        }
    }

    Ok(per_method
        .into_iter()
        .map(|(method, pairs)| MethodSeries {
            method: method.to_string(),
            points: sum_by_key(pairs),
        })
        .collect())
}

/// The `n` most frequent regions with their revenue totals.
pub fn top_regions(
    df: &DataFrame,
    revenue_column: &str,
    region_column: &str,
    n: usize,
) -> Result<Vec<RegionSummary>> {
    let revenue = revenue_values(df, revenue_column)?;
    let regions = label_values(df, region_column)?;

    let mut summaries: HashMap<&str, RegionSummary> = HashMap::new();
    for (value, region) in revenue.iter().zip(regions.iter()) {
        let Some(region) = region else {
            continue;
        };
        let summary = summaries
            .entry(region.as_str())
            .or_insert_with(|| RegionSummary {
                region: region.clone(),
                count: 0,
                revenue: 0.0,
            });
        summary.count += 1;
        summary.revenue += value.unwrap_or(0.0);
    }

    let mut result: Vec<RegionSummary> = summaries.into_values().collect();
    result.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.region.cmp(&b.region)));
    result.truncate(n);
    Ok(result)
}

/// Pearson correlation over the rows where both values are present.
fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys.iter())
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Correlation matrix of the given numeric columns.
///
/// Columns absent from the dataset are left out of the matrix.
pub fn correlation_matrix<S: AsRef<str>>(df: &DataFrame, columns: &[S]) -> Result<CorrelationMatrix> {
    let mut names = Vec::new();
    let mut series = Vec::new();
    for name in columns {
        let name = name.as_ref();
        if df.column(name).is_ok() {
            series.push(revenue_values(df, name)?);
            names.push(name.to_string());
        }
    }

    let values = (0..series.len())
        .map(|i| {
            (0..series.len())
                .map(|j| {
                    let r = pearson(&series[i], &series[j]);
                    if i == j { r.map(|_| 1.0) } else { r }
                })
                .collect()
        })
        .collect();

    Ok(CorrelationMatrix {
        columns: names,
        values,
    })
}
