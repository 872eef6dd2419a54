//! Progress reporting for the analysis pipeline.
//!
//! The pipeline emits a [`ProgressUpdate`] when each stage starts and,
//! for iterative stages, once per column.
//!
//! # Example
//!
//! ```rust,ignore
//! use sales_insight::Pipeline;
//!
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:?}] {}", update.stage, update.message);
//!     })
//!     .build()?
//!     .process(df);
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the analysis pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    /// Pipeline is initializing
    Initializing,
    /// Inspecting the raw dataset against the schema
    Inspecting,
    /// Converting textual columns to their declared types
    TypeCoercion,
    /// Normalizing categorical labels
    Normalization,
    /// Filling numeric nulls with group means
    Imputation,
    /// Inspecting the cleaned dataset
    Reinspecting,
    /// Describing numeric columns and counting outliers
    OutlierDetection,
    /// Computing business metrics
    Metrics,
    /// Writing the cleaned dataset
    Writing,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl AnalysisStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::Inspecting => "Inspecting Dataset",
            Self::TypeCoercion => "Coercing Types",
            Self::Normalization => "Normalizing Categories",
            Self::Imputation => "Imputing Values",
            Self::Reinspecting => "Re-inspecting Dataset",
            Self::OutlierDetection => "Detecting Outliers",
            Self::Metrics => "Computing Metrics",
            Self::Writing => "Writing Output",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Returns the share of the overall run taken by this stage (0.0 - 1.0).
    pub fn weight(&self) -> f32 {
        match self {
            Self::Initializing => 0.02,
            Self::Inspecting => 0.13,
            Self::TypeCoercion => 0.10,
            Self::Normalization => 0.10,
            Self::Imputation => 0.15,
            Self::Reinspecting => 0.10,
            Self::OutlierDetection => 0.10,
            Self::Metrics => 0.15,
            Self::Writing => 0.15,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Initializing => 0.0,
            Self::Inspecting => 0.02,
            Self::TypeCoercion => 0.15,
            Self::Normalization => 0.25,
            Self::Imputation => 0.35,
            Self::Reinspecting => 0.50,
            Self::OutlierDetection => 0.60,
            Self::Metrics => 0.70,
            Self::Writing => 0.85,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// Progress update emitted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: AnalysisStage,

    /// Optional sub-stage description (e.g., "Column: revenue")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable message describing current activity
    pub message: String,
}

impl ProgressUpdate {
    /// Creates a new progress update for a stage.
    pub fn new(stage: AnalysisStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            sub_stage: None,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    /// Creates a progress update for the `current`-th of `total` items of a stage.
    pub fn with_items(
        stage: AnalysisStage,
        sub_stage: impl Into<String>,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let stage_progress = if total > 0 {
            current as f32 / total as f32
        } else {
            0.0
        };
        Self {
            sub_stage: Some(sub_stage.into()),
            ..Self::new(stage, stage_progress, message)
        }
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(AnalysisStage::Complete, 1.0, message)
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(AnalysisStage::Failed, 0.0, message)
    }
}

/// Trait for receiving progress updates during analysis.
///
/// Implementations must be `Send + Sync` so a pipeline holding one can be
/// moved to another thread.
pub trait ProgressReporter: Send + Sync {
    /// Called when progress is made.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
