//! Error types for the sales analysis pipeline.
//!
//! Only conditions that make a run impossible live here (unreadable input,
//! unwritable output, invalid configuration). Data problems such as missing
//! columns or unparseable values are not errors: they are collected as
//! [`Anomaly`](crate::types::Anomaly) entries in the validation report.
//!
//! Errors are serializable so that `--json` output can carry them.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the analysis pipeline.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid schema descriptor provided.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Report generation failed.
    #[error("Failed to generate report: {0}")]
    ReportGenerationFailed(String),

    /// IO error wrapper. Always fatal.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalysisError>,
    },
}

impl AnalysisError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalysisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::InvalidSchema(_) => "INVALID_SCHEMA",
            Self::ReportGenerationFailed(_) => "REPORT_GENERATION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether the input file could not be read or an output could not be written.
    pub fn is_io_failure(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::WithContext { source, .. } => source.is_io_failure(),
            _ => false,
        }
    }
}

impl From<crate::config::ConfigValidationError> for AnalysisError {
    fn from(err: crate::config::ConfigValidationError) -> Self {
        AnalysisError::InvalidConfig(err.to_string())
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for AnalysisError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AnalysisError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalysisError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalysisError::Io(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            AnalysisError::ColumnNotFound("revenue".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
        assert_eq!(
            AnalysisError::InvalidSchema("empty".to_string()).error_code(),
            "INVALID_SCHEMA"
        );
    }

    #[test]
    fn test_is_io_failure() {
        let io = AnalysisError::Io(std::io::Error::other("disk full"));
        assert!(io.is_io_failure());
        assert!(io.with_context("Writing cleaned dataset").is_io_failure());
        assert!(!AnalysisError::InvalidConfig("bad".to_string()).is_io_failure());
    }

    #[test]
    fn test_error_serialization() {
        let error = AnalysisError::ColumnNotFound("sales_method".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("sales_method"));
    }

    #[test]
    fn test_with_context() {
        let error = AnalysisError::ColumnNotFound("week".to_string()).with_context("During loading");
        assert!(error.to_string().contains("During loading"));
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND");
    }

    #[test]
    fn test_io_result_context() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        let err = result.context("Reading input").unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
        assert!(err.to_string().starts_with("Reading input"));
    }
}
