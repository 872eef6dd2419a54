//! Sales Insight Library
//!
//! Validation, cleaning and revenue metrics for product sales datasets,
//! built with Rust and Polars.
//!
//! # Overview
//!
//! This library provides:
//!
//! - **Validation**: Inspect a dataset against a declared schema without modifying it
//! - **Type Coercion**: Parse numeric columns that were loaded as text
//! - **Normalization**: Canonical spelling for categorical labels (whitespace, casing, aliases)
//! - **Imputation**: Fill numeric nulls with the mean of their group
//! - **Outlier Statistics**: Descriptive statistics and IQR outlier counts
//! - **Business Metrics**: Total revenue, ARPC by sales method and revenue breakdowns
//! - **Progress Reporting**: Real-time progress updates for every stage
//!
//! Data problems never abort a run. They are collected as [`Anomaly`]
//! entries; only IO failures return an error.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sales_insight::{Pipeline, load_dataset};
//!
//! let df = load_dataset("data/product_sales.csv")?;
//!
//! let result = Pipeline::builder()
//!     .dataset_name("product_sales")
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process(df)?;
//!
//! println!("Total revenue: {:.2}", result.metrics.total_revenue);
//! for method in &result.metrics.arpc_by_method {
//!     println!("{}: {:.2}", method.method, method.mean);
//! }
//! ```
//!
//! # Configuration
//!
//! Use [`AnalysisConfig`] to choose which columns are normalized and imputed:
//!
//! ```rust,ignore
//! use sales_insight::config::*;
//!
//! let config = AnalysisConfig::builder()
//!     .normalization(
//!         NormalizationRule::new("sales_method", CasingRule::TitleCase)
//!             .alias("Em + Call", "Email + Call"),
//!     )
//!     .imputation(ImputationRule::new("revenue", "sales_method"))
//!     .top_regions(5)
//!     .save_to_disk(false)
//!     .build()?;
//! ```
//!
//! # Individual Operations
//!
//! Every stage is also usable on its own:
//!
//! ```rust,ignore
//! use sales_insight::*;
//!
//! let report = DatasetInspector::inspect(&df, &DatasetSchema::product_sales())?;
//! normalize_categorical(&mut df, "sales_method", CasingRule::TitleCase, &aliases)?;
//! GroupedMeanImputer::impute_missing_numeric(&mut df, "revenue", "sales_method")?;
//! let (stats, _) = DataProfiler::detect_outliers(&df, &["revenue", "nb_sold"])?;
//! let arpc = arpc_by_method(&df, "revenue", "sales_method")?;
//! ```

pub mod cleaner;
pub mod config;
pub mod error;
pub mod imputers;
pub mod loader;
pub mod metrics;
pub mod pipeline;
pub mod profiler;
pub mod reporting;
pub mod schema;
pub mod types;
pub mod utils;
pub mod validator;

// Re-exports for convenient access
pub use cleaner::{DataCleaner, TypeCorrector, normalize_categorical, normalize_value};
pub use config::{
    AnalysisConfig, AnalysisConfigBuilder, CasingRule, ConfigValidationError, ImputationRule,
    NormalizationRule,
};
pub use error::{AnalysisError, Result as AnalysisResult, ResultExt};
pub use imputers::GroupedMeanImputer;
pub use loader::load_dataset;
pub use metrics::{BusinessMetrics, MethodRevenue, arpc_by_method, total_revenue};
pub use pipeline::{
    AnalysisStage, ClosureProgressReporter, Pipeline, PipelineBuilder, ProgressReporter,
    ProgressUpdate,
};
pub use profiler::DataProfiler;
pub use reporting::{AnalysisReport, ReportGenerator, RunSummary};
pub use schema::{ColumnSpec, DatasetSchema, SemanticType};
pub use types::{
    Anomaly, CleaningLog, ColumnReport, ImputationOutcome, NormalizationOutcome, PipelineResult,
    SummaryStatistics, ValidationReport,
};
pub use validator::DatasetInspector;
