//! Main analysis pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating inspection, cleaning, profiling and metrics.

use crate::cleaner::DataCleaner;
use crate::config::{AnalysisConfig, ConfigValidationError};
use crate::error::{Result, ResultExt};
use crate::metrics::BusinessMetrics;
use crate::pipeline::progress::{
    AnalysisStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
use crate::profiler::DataProfiler;
use crate::reporting::ReportGenerator;
use crate::schema::DatasetSchema;
use crate::types::{CleaningLog, PipelineResult};
use crate::validator::DatasetInspector;
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// The main analysis pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use sales_insight::{AnalysisConfig, DatasetSchema, Pipeline};
///
/// let result = Pipeline::builder()
///     .config(AnalysisConfig::builder().top_regions(5).build()?)
///     .schema(DatasetSchema::product_sales())
///     .dataset_name("product_sales")
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .process(dataframe)?;
///
/// println!("Total revenue: {:.2}", result.metrics.total_revenue);
/// ```
pub struct Pipeline {
    config: AnalysisConfig,
    schema: DatasetSchema,
    dataset_name: String,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cleaner: DataCleaner,
    reporter: ReportGenerator,
}

// Ensure Pipeline is Send (can be moved to another thread)
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    /// Run a dataset through the pipeline.
    ///
    /// Data problems never fail the run: they are returned as anomalies in
    /// the result. Only IO failures and internal polars errors return `Err`,
    /// in which case no output file is left behind.
    pub fn process(&self, df: DataFrame) -> Result<PipelineResult> {
        match self.process_internal(df) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Analysis completed successfully"));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn process_internal(&self, mut df: DataFrame) -> Result<PipelineResult> {
        let start_time = Instant::now();

        info!(
            "Starting analysis of '{}' ({} rows x {} columns)",
            self.dataset_name,
            df.height(),
            df.width()
        );
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Initializing,
            0.0,
            "Starting analysis...",
        ));

        // Step 1: Inspect the raw dataset
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Inspecting,
            0.0,
            "Inspecting dataset...",
        ));
        info!("Step 1: Inspecting dataset...");
        let before = DatasetInspector::inspect(&df, &self.schema).context("Inspection failed")?;
        for anomaly in &before.anomalies {
            warn!("{}", anomaly);
        }

        // Step 2: Type coercion
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::TypeCoercion,
            0.0,
            "Coercing column types...",
        ));
        info!("Step 2: Coercing column types...");
        let mut cleaning = CleaningLog::default();
        let mut anomalies = self
            .cleaner
            .coerce(&mut df, &self.schema, &mut cleaning)
            .context("Type coercion failed")?;

        // Step 3: Normalization
        info!("Step 3: Normalizing categorical columns...");
        let rules = &self.config.normalizations;
        for (i, rule) in rules.iter().enumerate() {
            self.report_progress(ProgressUpdate::with_items(
                AnalysisStage::Normalization,
                format!("Column: {}", rule.column),
                i,
                rules.len(),
                format!("Normalizing {}", rule.column),
            ));
            anomalies.extend(
                self.cleaner
                    .normalize(&mut df, rule, &mut cleaning)
                    .context(format!("Normalization of '{}' failed", rule.column))?,
            );
        }

        // Step 4: Imputation
        info!("Step 4: Imputing missing values...");
        let rules = &self.config.imputations;
        for (i, rule) in rules.iter().enumerate() {
            self.report_progress(ProgressUpdate::with_items(
                AnalysisStage::Imputation,
                format!("Column: {}", rule.target_column),
                i,
                rules.len(),
                format!(
                    "Imputing {} by {}",
                    rule.target_column, rule.group_by_column
                ),
            ));
            anomalies.extend(
                self.cleaner
                    .impute(&mut df, rule, &mut cleaning)
                    .context(format!("Imputation of '{}' failed", rule.target_column))?,
            );
        }

        // Step 5: Inspect the cleaned dataset
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Reinspecting,
            0.0,
            "Re-inspecting cleaned dataset...",
        ));
        info!("Step 5: Re-inspecting cleaned dataset...");
        let after = DatasetInspector::inspect(&df, &self.schema).context("Inspection failed")?;

        // Step 6: Outliers
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::OutlierDetection,
            0.0,
            "Describing numeric columns...",
        ));
        info!("Step 6: Describing numeric columns...");
        let (statistics, profile_anomalies) =
            DataProfiler::detect_outliers(&df, &self.config.outlier_columns)
                .context("Outlier detection failed")?;
        anomalies.extend(profile_anomalies);

        // Step 7: Metrics
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Metrics,
            0.0,
            "Computing business metrics...",
        ));
        info!("Step 7: Computing business metrics...");
        let metrics =
            BusinessMetrics::compute(&df, &self.config).context("Metric computation failed")?;
        for skipped in &metrics.skipped {
            debug!("Skipped metric: {}", skipped);
        }

        // Step 8: Write the cleaned dataset
        let output_path = if self.config.save_to_disk {
            self.report_progress(ProgressUpdate::new(
                AnalysisStage::Writing,
                0.0,
                "Writing cleaned dataset...",
            ));
            info!("Step 8: Writing cleaned dataset...");
            Some(self.reporter.write_cleaned_csv(&mut df, &self.dataset_name)?)
        } else {
            debug!("Skipping output, save_to_disk is disabled");
            None
        };

        let duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Analysis complete in {} ms: {} anomalies",
            duration_ms,
            before.anomalies.len() + anomalies.len()
        );

        Ok(PipelineResult {
            cleaned: df,
            before,
            after,
            cleaning,
            statistics,
            metrics,
            anomalies,
            output_path,
            duration_ms,
        })
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<AnalysisConfig>,
    schema: Option<DatasetSchema>,
    dataset_name: Option<String>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// Ensure PipelineBuilder is Send (can be moved to another thread during construction)
static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the analysis configuration.
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the schema datasets are validated against.
    ///
    /// Defaults to [`DatasetSchema::product_sales`].
    pub fn schema(mut self, schema: DatasetSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Name used for output files, usually the input file stem.
    pub fn dataset_name(mut self, name: impl Into<String>) -> Self {
        self.dataset_name = Some(name.into());
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use sales_insight::{ProgressReporter, ProgressUpdate};
    /// use std::sync::Arc;
    ///
    /// struct StageLogger;
    ///
    /// impl ProgressReporter for StageLogger {
    ///     fn report(&self, update: ProgressUpdate) {
    ///         println!("{}: {}", update.stage.display_name(), update.message);
    ///     }
    /// }
    ///
    /// let pipeline = Pipeline::builder()
    ///     .progress_reporter(Arc::new(StageLogger))
    ///     .build()?;
    /// ```
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// This is a convenience method for simple progress handling.
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let reporter = ReportGenerator::new(config.output_dir.clone(), config.output_name.clone());

        Ok(Pipeline {
            config,
            schema: self.schema.unwrap_or_default(),
            dataset_name: self.dataset_name.unwrap_or_else(|| "dataset".to_string()),
            progress_reporter: self.progress_reporter,
            cleaner: DataCleaner,
            reporter,
        })
    }
}
