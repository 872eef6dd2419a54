use crate::error::{AnalysisError, Result, ResultExt};
use crate::metrics::BusinessMetrics;
use crate::types::{Anomaly, CleaningLog, PipelineResult, SummaryStatistics, ValidationReport};
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ============================================================================
// Analysis Report Types
// ============================================================================

/// Full report of one analysis run.
///
/// Used for both JSON output to stdout (`--json`) and the report file
/// (`--emit-report`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    // Metadata
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file
    pub input_file: String,
    /// Path to the cleaned CSV (if written)
    pub output_file: Option<String>,

    /// Counts describing the run
    pub summary: RunSummary,

    /// Inspection of the raw dataset
    pub validation_before: ValidationReport,
    /// Inspection of the cleaned dataset
    pub validation_after: ValidationReport,

    /// What the cleaning stage changed
    pub cleaning: CleaningLog,

    /// Descriptive statistics per numeric column
    pub statistics: BTreeMap<String, SummaryStatistics>,

    /// Revenue metrics and breakdowns
    pub metrics: BusinessMetrics,

    /// Anomalies raised while cleaning and profiling
    pub anomalies: Vec<Anomaly>,
}

/// Headline numbers of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Total execution time in milliseconds
    pub duration_ms: u64,
    pub rows: usize,
    pub columns: usize,
    pub nulls_before: usize,
    pub nulls_after: usize,
    pub duplicate_rows: usize,
    /// Anomalies across both inspection and cleaning
    pub anomaly_count: usize,
    /// Nulls filled by imputation
    pub values_imputed: usize,
    /// Categorical values rewritten by normalization
    pub values_normalized: usize,
    /// Columns with values outside the IQR fences
    pub outlier_columns: Vec<String>,
}

/// Writes cleaned datasets and reports to an output directory.
pub struct ReportGenerator {
    output_dir: PathBuf,
    output_name: Option<String>,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./outputs"),
            output_name: None,
        }
    }
}

impl ReportGenerator {
    /// Create a new ReportGenerator with custom output settings.
    pub fn new(output_dir: PathBuf, output_name: Option<String>) -> Self {
        Self {
            output_dir,
            output_name,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path the cleaned dataset of `dataset_name` is written to.
    pub fn cleaned_path(&self, dataset_name: &str) -> PathBuf {
        let file_name = self
            .output_name
            .clone()
            .unwrap_or_else(|| format!("{}_cleaned", dataset_name));
        self.output_dir.join(format!("{}.csv", file_name))
    }

    /// Write the cleaned dataset as CSV, keeping column layout and row order.
    pub fn write_cleaned_csv(&self, df: &mut DataFrame, dataset_name: &str) -> Result<PathBuf> {
        let output_path = self.cleaned_path(dataset_name);
        self.write_atomically(&output_path, |file| {
            CsvWriter::new(file)
                .include_header(true)
                .with_separator(b',')
                .with_quote_char(b'"')
                .finish(df)
                .context("Failed to write cleaned dataset")
        })?;

        info!("Dataset saved: {}", output_path.display());
        Ok(output_path)
    }

    /// Write a file next to its destination, then rename it into place.
    ///
    /// A failure at any point removes the temporary file and leaves any
    /// existing file at `output_path` untouched.
    fn write_atomically<F>(&self, output_path: &Path, write: F) -> Result<()>
    where
        F: FnOnce(&mut File) -> Result<()>,
    {
        fs::create_dir_all(&self.output_dir).context(format!(
            "Failed to create output directory {}",
            self.output_dir.display()
        ))?;

        let mut tmp_name = output_path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let written = File::create(&tmp_path)
            .context(format!("Failed to create {}", tmp_path.display()))
            .and_then(|mut file| {
                write(&mut file)?;
                file.sync_all()
                    .context(format!("Failed to flush {}", tmp_path.display()))
            })
            .and_then(|()| {
                fs::rename(&tmp_path, output_path)
                    .context(format!("Failed to move output to {}", output_path.display()))
            });

        if written.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        written
    }

    /// Build an [`AnalysisReport`] from the result of a pipeline run.
    pub fn build_report(input_file: &str, result: &PipelineResult) -> AnalysisReport {
        let summary = RunSummary {
            duration_ms: result.duration_ms,
            rows: result.cleaned.height(),
            columns: result.cleaned.width(),
            nulls_before: result.before.total_nulls(),
            nulls_after: result.after.total_nulls(),
            duplicate_rows: result.after.duplicate_row_count,
            anomaly_count: result.all_anomalies().count(),
            values_imputed: result.cleaning.imputations.iter().map(|i| i.filled()).sum(),
            values_normalized: result
                .cleaning
                .normalizations
                .iter()
                .map(|n| n.values_changed)
                .sum(),
            outlier_columns: result
                .outlier_columns()
                .into_iter()
                .map(String::from)
                .collect(),
        };

        debug!(
            "Built report for {} with {} anomalies",
            input_file, summary.anomaly_count
        );

        AnalysisReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.to_string(),
            output_file: result
                .output_path
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
            summary,
            validation_before: result.before.clone(),
            validation_after: result.after.clone(),
            cleaning: result.cleaning.clone(),
            statistics: result.statistics.clone(),
            metrics: result.metrics.clone(),
            anomalies: result.anomalies.clone(),
        }
    }

    /// Write a report to `<output_dir>/<report_base_name>_report.json`.
    ///
    /// Uses the same temporary-file-then-rename path as the cleaned CSV, so a
    /// failed write never leaves a truncated report.
    pub fn write_report_to_file<T: Serialize>(
        &self,
        report: &T,
        report_base_name: &str,
    ) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| AnalysisError::ReportGenerationFailed(e.to_string()))?;

        let report_path = self
            .output_dir
            .join(format!("{}_report.json", report_base_name));
        self.write_atomically(&report_path, |file| {
            file.write_all(json.as_bytes())
                .context(format!("Failed to write {}", report_path.display()))
        })?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cleaned_path_defaults_to_dataset_name() {
        let generator = ReportGenerator::new(PathBuf::from("out"), None);
        assert_eq!(
            generator.cleaned_path("product_sales"),
            PathBuf::from("out/product_sales_cleaned.csv")
        );

        let generator = ReportGenerator::new(PathBuf::from("out"), Some("final".to_string()));
        assert_eq!(generator.cleaned_path("product_sales"), PathBuf::from("out/final.csv"));
    }

    #[test]
    fn test_write_cleaned_csv_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let generator = ReportGenerator::new(dir.path().join("nested"), None);
        let mut df = df! {
            "week" => [1i64, 2],
            "sales_method" => ["Email", "Call"],
        }
        .unwrap();

        let path = generator.write_cleaned_csv(&mut df, "sales").unwrap();

        assert!(path.exists());
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "week,sales_method\n1,Email\n2,Call\n");

        assert!(temp_files(&dir.path().join("nested")).is_empty());
    }

    #[test]
    fn test_write_report_to_file() {
        let dir = TempDir::new().unwrap();
        let generator = ReportGenerator::new(dir.path().to_path_buf(), None);
        let anomalies = vec![Anomaly::MissingColumn {
            column: "state".to_string(),
        }];

        let path = generator.write_report_to_file(&anomalies, "sales").unwrap();

        assert_eq!(path.file_name().unwrap(), "sales_report.json");
        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed[0]["kind"], "missing_column");
        assert!(temp_files(dir.path()).is_empty());
    }

    #[test]
    fn test_failed_report_write_leaves_no_partial_file() {
        let dir = TempDir::new().unwrap();
        // A directory in the way makes the final rename fail
        fs::create_dir(dir.path().join("sales_report.json")).unwrap();
        let generator = ReportGenerator::new(dir.path().to_path_buf(), None);

        let err = generator
            .write_report_to_file(&vec!["Email", "Call"], "sales")
            .unwrap_err();

        assert!(err.is_io_failure());
        assert!(dir.path().join("sales_report.json").is_dir());
        assert!(temp_files(dir.path()).is_empty());
    }

    #[test]
    fn test_report_replaces_previous_report() {
        let dir = TempDir::new().unwrap();
        let generator = ReportGenerator::new(dir.path().to_path_buf(), None);

        generator.write_report_to_file(&vec![1, 2, 3], "sales").unwrap();
        let path = generator.write_report_to_file(&vec![4], "sales").unwrap();

        let parsed: Vec<i32> = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed, vec![4]);
    }

    fn temp_files(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.to_string_lossy().ends_with(".tmp"))
            .collect()
    }
}
