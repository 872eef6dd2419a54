//! Business metrics computed from the cleaned dataset.
//!
//! The headline figures are total revenue and average revenue per customer
//! (ARPC) by sales method. The exploratory breakdowns in [`breakdowns`]
//! back the charts a plotting tool would draw.

pub mod breakdowns;
mod revenue;

pub use breakdowns::{
    CorrelationMatrix, KeyedRevenue, LabelCount, MethodSeries, RegionSummary, RevenueBreakdown,
    correlation_matrix, label_counts, revenue_by, top_regions, weekly_revenue_by_method,
};
pub use revenue::{ARPC_DECIMALS, MethodRevenue, arpc_by_method, mean_revenue, total_revenue};

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Every metric derived from a cleaned dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessMetrics {
    pub total_revenue: f64,
    pub mean_revenue: Option<f64>,
    pub arpc_by_method: Vec<MethodRevenue>,
    pub method_counts: Vec<LabelCount>,
    pub revenue_breakdowns: Vec<RevenueBreakdown>,
    pub weekly_revenue_by_method: Vec<MethodSeries>,
    pub top_regions: Vec<RegionSummary>,
    pub correlations: Option<CorrelationMatrix>,
    /// Metrics that could not be computed because a column is missing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

impl BusinessMetrics {
    /// Compute every metric named by the configuration.
    ///
    /// A metric whose columns are missing is skipped and listed in
    /// `skipped`; the others are still computed.
    pub fn compute(df: &DataFrame, config: &AnalysisConfig) -> Result<Self> {
        let mut metrics = BusinessMetrics::default();
        let revenue = config.revenue_column.as_str();

        if let Some(total) = metrics.optional("total revenue", total_revenue(df, revenue))? {
            metrics.total_revenue = total;
        }
        metrics.mean_revenue = metrics
            .optional("mean revenue", mean_revenue(df, revenue))?
            .flatten();
        metrics.arpc_by_method = metrics
            .optional(
                "ARPC by method",
                arpc_by_method(df, revenue, &config.method_column),
            )?
            .unwrap_or_default();
        metrics.method_counts = metrics
            .optional("method counts", label_counts(df, &config.method_column))?
            .unwrap_or_default();

        for key in &config.breakdown_columns {
            let label = format!("revenue by {}", key);
            if let Some(breakdown) = metrics.optional(&label, revenue_by(df, revenue, key))? {
                metrics.revenue_breakdowns.push(breakdown);
            }
        }

        metrics.weekly_revenue_by_method = metrics
            .optional(
                "weekly revenue by method",
                weekly_revenue_by_method(df, revenue, &config.method_column, &config.week_column),
            )?
            .unwrap_or_default();
        metrics.top_regions = metrics
            .optional(
                "top regions",
                top_regions(df, revenue, &config.region_column, config.top_regions),
            )?
            .unwrap_or_default();

        let matrix = correlation_matrix(df, &config.correlation_columns)?;
        if !matrix.columns.is_empty() {
            metrics.correlations = Some(matrix);
        }

        debug!(
            "Computed metrics: total revenue {:.2}, {} method(s)",
            metrics.total_revenue,
            metrics.arpc_by_method.len()
        );
        Ok(metrics)
    }

    /// Turn a missing column into a skipped metric, propagate anything else.
    fn optional<T>(&mut self, name: &str, result: Result<T>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(AnalysisError::ColumnNotFound(column)) => {
                warn!("Skipping {}: column '{}' not found", name, column);
                self.skipped.push(format!("{} (missing column '{}')", name, column));
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::columns;

    #[test]
    fn test_compute_on_sales_frame() {
        let df = df! {
            columns::WEEK => [1i64, 1, 2, 2],
            columns::SALES_METHOD => ["Email", "Email", "Call", "Call"],
            columns::NB_SOLD => [9i64, 10, 8, 12],
            columns::REVENUE => [100.0, 100.0, 50.0, 150.0],
            columns::YEARS_AS_CUSTOMER => [1i64, 2, 3, 4],
            columns::NB_SITE_VISITS => [20i64, 22, 25, 30],
            columns::STATE => ["Ohio", "Ohio", "Iowa", "Utah"],
        }
        .unwrap();

        let metrics = BusinessMetrics::compute(&df, &AnalysisConfig::default()).unwrap();

        assert!((metrics.total_revenue - 400.0).abs() < 1e-6);
        assert_eq!(metrics.mean_revenue, Some(100.0));
        assert_eq!(metrics.arpc_by_method.len(), 2);
        assert_eq!(metrics.revenue_breakdowns.len(), 4);
        assert_eq!(metrics.weekly_revenue_by_method.len(), 2);
        assert_eq!(metrics.top_regions[0].region, "Ohio");
        assert_eq!(metrics.correlations.as_ref().unwrap().columns.len(), 4);
        assert!(metrics.skipped.is_empty());
    }

    #[test]
    fn test_compute_skips_missing_columns() {
        let df = df! {
            columns::SALES_METHOD => ["Email", "Call"],
            columns::REVENUE => [10.0, 20.0],
        }
        .unwrap();

        let metrics = BusinessMetrics::compute(&df, &AnalysisConfig::default()).unwrap();

        assert!((metrics.total_revenue - 30.0).abs() < 1e-6);
        assert_eq!(metrics.arpc_by_method.len(), 2);
        assert!(metrics.top_regions.is_empty());
        assert!(metrics.revenue_breakdowns.is_empty());
        // 4 breakdowns, weekly revenue and top regions
        assert_eq!(metrics.skipped.len(), 6);
        assert_eq!(metrics.correlations.unwrap().columns, vec!["revenue"]);
    }
}
