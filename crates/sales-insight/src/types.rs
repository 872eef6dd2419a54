use crate::metrics::BusinessMetrics;
use crate::schema::SemanticType;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// Anomalies
// ============================================================================

/// A data problem found while validating or cleaning a dataset.
///
/// Anomalies never stop processing. They are accumulated and surfaced at
/// the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// An expected column is absent from the dataset.
    MissingColumn { column: String },

    /// Values that cannot be read as the column's expected type.
    TypeMismatch {
        column: String,
        expected: SemanticType,
        count: usize,
        samples: Vec<String>,
    },

    /// Nulls in a column declared non-nullable.
    UnexpectedNull { column: String, count: usize },

    /// Values below the column's declared minimum.
    OutOfRange {
        column: String,
        minimum: f64,
        count: usize,
    },

    /// Identifier values that occur more than once.
    DuplicateIdentifier { column: String, count: usize },

    /// Nulls that imputation could not fill.
    ///
    /// `group` is `None` when the rows' group key is itself null.
    UnresolvedNull {
        column: String,
        group_by: String,
        group: Option<String>,
        rows: usize,
    },
}

impl Anomaly {
    /// Stable code identifying the anomaly kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingColumn { .. } => "MISSING_COLUMN",
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::UnexpectedNull { .. } => "UNEXPECTED_NULL",
            Self::OutOfRange { .. } => "OUT_OF_RANGE",
            Self::DuplicateIdentifier { .. } => "DUPLICATE_IDENTIFIER",
            Self::UnresolvedNull { .. } => "UNRESOLVED_NULL",
        }
    }

    /// Column the anomaly refers to.
    pub fn column(&self) -> &str {
        match self {
            Self::MissingColumn { column }
            | Self::TypeMismatch { column, .. }
            | Self::UnexpectedNull { column, .. }
            | Self::OutOfRange { column, .. }
            | Self::DuplicateIdentifier { column, .. }
            | Self::UnresolvedNull { column, .. } => column,
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn { column } => {
                write!(f, "column '{}' is missing from the dataset", column)
            }
            Self::TypeMismatch {
                column,
                expected,
                count,
                samples,
            } => {
                write!(
                    f,
                    "{} value(s) in '{}' are not {}",
                    count, column, expected
                )?;
                if !samples.is_empty() {
                    write!(f, " (e.g. {})", samples.join(", "))?;
                }
                Ok(())
            }
            Self::UnexpectedNull { column, count } => {
                write!(f, "{} null value(s) in non-nullable column '{}'", count, column)
            }
            Self::OutOfRange {
                column,
                minimum,
                count,
            } => write!(
                f,
                "{} value(s) in '{}' are below the minimum of {}",
                count, column, minimum
            ),
            Self::DuplicateIdentifier { column, count } => write!(
                f,
                "{} row(s) repeat an identifier already seen in '{}'",
                count, column
            ),
            Self::UnresolvedNull {
                column,
                group_by,
                group,
                rows,
            } => match group {
                Some(group) => write!(
                    f,
                    "{} null value(s) in '{}' left unfilled: group {}='{}' has no values",
                    rows, column, group_by, group
                ),
                None => write!(
                    f,
                    "{} null value(s) in '{}' left unfilled: '{}' is null on those rows",
                    rows, column, group_by
                ),
            },
        }
    }
}

// ============================================================================
// Validation report
// ============================================================================

/// Findings about a single column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnReport {
    pub name: String,
    /// Physical dtype as loaded (e.g. "i64", "str").
    pub dtype: String,
    /// Declared semantic type, if the schema mentions the column.
    pub semantic_type: Option<SemanticType>,
    pub null_count: usize,
    /// Number of distinct non-null values.
    pub distinct_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Sorted distinct values, for categorical columns only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unique_values: Vec<String>,
}

/// Result of inspecting a dataset against a schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// (rows, columns)
    pub shape: (usize, usize),
    pub columns: Vec<ColumnReport>,
    /// Rows identical to an earlier row over the full row tuple.
    pub duplicate_row_count: usize,
    pub anomalies: Vec<Anomaly>,
}

impl ValidationReport {
    pub fn column(&self, name: &str) -> Option<&ColumnReport> {
        self.columns.iter().find(|col| col.name == name)
    }

    /// Null count of a column, `None` if the column was not found.
    pub fn null_count(&self, name: &str) -> Option<usize> {
        self.column(name).map(|col| col.null_count)
    }

    pub fn total_nulls(&self) -> usize {
        self.columns.iter().map(|col| col.null_count).sum()
    }

    pub fn has_anomalies(&self) -> bool {
        !self.anomalies.is_empty()
    }
}

// ============================================================================
// Descriptive statistics
// ============================================================================

/// Descriptive statistics of a numeric column.
///
/// Quartiles use linear interpolation between closest ranks and the
/// standard deviation is the sample (n - 1) estimate. Fields are `None`
/// when the column has too few values to define them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
    /// Values outside the 1.5 x IQR fences.
    pub outlier_count: usize,
}

// ============================================================================
// Cleaning outcomes
// ============================================================================

/// What a categorical normalization changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizationOutcome {
    pub column: String,
    /// Number of non-null values whose text changed.
    pub values_changed: usize,
    /// Number of values replaced through the alias map.
    pub aliases_applied: usize,
    pub distinct_before: Vec<String>,
    pub distinct_after: Vec<String>,
}

/// Group mean used to fill a group's nulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupFill {
    pub group: String,
    pub mean: f64,
    pub filled: usize,
}

/// What a grouped imputation changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImputationOutcome {
    pub target_column: String,
    pub group_by_column: String,
    pub nulls_before: usize,
    pub nulls_after: usize,
    pub fills: Vec<GroupFill>,
}

impl ImputationOutcome {
    pub fn filled(&self) -> usize {
        self.fills.iter().map(|fill| fill.filled).sum()
    }
}

/// What converting a textual column to its declared numeric type changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoercionOutcome {
    pub column: String,
    pub from_dtype: String,
    pub to_dtype: String,
    /// Values that could not be parsed and were set to null.
    pub rejected: usize,
}

/// Everything the cleaning stage did, in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningLog {
    pub coercions: Vec<CoercionOutcome>,
    pub normalizations: Vec<NormalizationOutcome>,
    pub imputations: Vec<ImputationOutcome>,
    /// Human-readable description of each step.
    pub steps: Vec<String>,
}

// ============================================================================
// Pipeline result
// ============================================================================

/// Everything one pipeline run produced.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// The cleaned dataset, same rows and columns as the input.
    pub cleaned: DataFrame,
    /// Inspection of the raw dataset.
    pub before: ValidationReport,
    /// Inspection of the cleaned dataset.
    pub after: ValidationReport,
    pub cleaning: CleaningLog,
    /// Descriptive statistics per numeric column.
    pub statistics: BTreeMap<String, SummaryStatistics>,
    pub metrics: BusinessMetrics,
    /// Anomalies raised by cleaning and profiling, in the order found.
    pub anomalies: Vec<Anomaly>,
    /// Where the cleaned CSV was written, if it was.
    pub output_path: Option<PathBuf>,
    pub duration_ms: u64,
}

impl PipelineResult {
    /// All anomalies of the run: the raw inspection first, then cleaning.
    pub fn all_anomalies(&self) -> impl Iterator<Item = &Anomaly> {
        self.before.anomalies.iter().chain(self.anomalies.iter())
    }

    /// Columns with at least one value outside the IQR fences.
    pub fn outlier_columns(&self) -> Vec<&str> {
        self.statistics
            .iter()
            .filter(|(_, stats)| stats.outlier_count > 0)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
