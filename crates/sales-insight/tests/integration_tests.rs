//! Integration tests for the sales analysis pipeline.
//!
//! These tests load the CSV fixtures, run the full pipeline and check the
//! cleaned data, the metrics and the files written to disk.

use polars::prelude::*;
use pretty_assertions::assert_eq;
use sales_insight::utils::{numeric_values, string_values};
use sales_insight::{
    AnalysisConfig, AnalysisError, AnalysisStage, Anomaly, DatasetInspector, DatasetSchema,
    Pipeline, PipelineResult, ReportGenerator, SemanticType, load_dataset,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture(filename: &str) -> DataFrame {
    load_dataset(fixtures_path().join(filename)).expect("Failed to read fixture")
}

fn in_memory_config() -> AnalysisConfig {
    AnalysisConfig::builder().save_to_disk(false).build().unwrap()
}

fn run_in_memory(filename: &str) -> PipelineResult {
    Pipeline::builder()
        .config(in_memory_config())
        .build()
        .unwrap()
        .process(load_fixture(filename))
        .expect("Pipeline should complete successfully")
}

fn strings(df: &DataFrame, column: &str) -> Vec<Option<String>> {
    string_values(df.column(column).unwrap().as_materialized_series()).unwrap()
}

fn numbers(df: &DataFrame, column: &str) -> Vec<Option<f64>> {
    numeric_values(df.column(column).unwrap().as_materialized_series()).unwrap()
}

fn some(values: &[&str]) -> Vec<Option<String>> {
    values.iter().map(|v| Some(v.to_string())).collect()
}

fn arpc(result: &PipelineResult) -> Vec<(String, f64)> {
    result
        .metrics
        .arpc_by_method
        .iter()
        .map(|m| (m.method.clone(), m.mean))
        .collect()
}

// ============================================================================
// End-to-end
// ============================================================================

#[test]
fn test_small_dataset_end_to_end() {
    let result = run_in_memory("sales_small.csv");

    assert_eq!(
        strings(&result.cleaned, "sales_method"),
        some(&["Email", "Email", "Call", "Call"])
    );
    assert_eq!(
        numbers(&result.cleaned, "revenue"),
        vec![Some(100.0), Some(100.0), Some(50.0), Some(150.0)]
    );
    assert!((result.metrics.total_revenue - 400.0).abs() < 1e-6);
    assert_eq!(
        arpc(&result),
        vec![("Call".to_string(), 100.0), ("Email".to_string(), 100.0)]
    );
    assert!(result.anomalies.is_empty());
}

#[test]
fn test_messy_dataset_is_normalized_and_imputed() {
    let result = run_in_memory("sales_messy.csv");
    let df = &result.cleaned;

    assert_eq!(df.shape(), (10, 8));
    assert_eq!(
        strings(df, "sales_method"),
        some(&[
            "Email",
            "Email",
            "Email + Call",
            "Email + Call",
            "Call",
            "Call",
            "Email + Call",
            "Email",
            "Call",
            "Email",
        ])
    );

    // Group means: Email 100.0, Email + Call 190.0, Call 48.0
    let revenue = numbers(df, "revenue");
    assert_eq!(revenue[1], Some(100.0));
    assert_eq!(revenue[5], Some(48.0));
    assert_eq!(revenue[6], Some(190.0));
    assert_eq!(result.after.null_count("revenue"), Some(0));

    assert!((result.metrics.total_revenue - 1114.0).abs() < 1e-6);
    assert_eq!(
        arpc(&result),
        vec![
            ("Call".to_string(), 48.0),
            ("Email".to_string(), 100.0),
            ("Email + Call".to_string(), 190.0),
        ]
    );
    let totals: Vec<(&str, f64)> = result
        .metrics
        .arpc_by_method
        .iter()
        .map(|m| (m.method.as_str(), m.total))
        .collect();
    assert_eq!(
        totals,
        vec![("Call", 144.0), ("Email", 400.0), ("Email + Call", 570.0)]
    );

    let imputation = &result.cleaning.imputations[0];
    assert_eq!(imputation.nulls_before, 3);
    assert_eq!(imputation.nulls_after, 0);
    assert_eq!(imputation.filled(), 3);

    let regions: Vec<(&str, usize)> = result
        .metrics
        .top_regions
        .iter()
        .map(|r| (r.region.as_str(), r.count))
        .collect();
    assert_eq!(
        regions,
        vec![("Ohio", 4), ("Texas", 4), ("Iowa", 1), ("New York", 1)]
    );
}

#[test]
fn test_pipeline_is_idempotent_on_cleaned_output() {
    let first = run_in_memory("sales_messy.csv");

    let second = Pipeline::builder()
        .config(in_memory_config())
        .build()
        .unwrap()
        .process(first.cleaned.clone())
        .unwrap();

    assert!(second.cleaned.equals_missing(&first.cleaned));
    assert_eq!(second.cleaning.normalizations[0].values_changed, 0);
    assert_eq!(second.cleaning.imputations[0].filled(), 0);
}

// ============================================================================
// Anomalies
// ============================================================================

#[test]
fn test_missing_column_is_reported_not_fatal() {
    let result = run_in_memory("sales_missing_state.csv");

    assert!(result.before.anomalies.contains(&Anomaly::MissingColumn {
        column: "state".to_string()
    }));
    assert!((result.metrics.total_revenue - 240.0).abs() < 1e-6);
    assert!(result.metrics.top_regions.is_empty());
    assert!(
        result
            .metrics
            .skipped
            .iter()
            .any(|s| s.starts_with("top regions"))
    );
}

#[test]
fn test_bad_values_are_reported() {
    let df = load_fixture("sales_bad_values.csv");
    let report = DatasetInspector::inspect(&df, &DatasetSchema::product_sales()).unwrap();

    let mismatch = report
        .anomalies
        .iter()
        .find(|a| a.column() == "nb_sold")
        .expect("nb_sold should be flagged");
    match mismatch {
        Anomaly::TypeMismatch {
            expected,
            count,
            samples,
            ..
        } => {
            assert_eq!(*expected, SemanticType::Integer);
            assert_eq!(*count, 1);
            assert_eq!(samples, &vec!["ten".to_string()]);
        }
        other => panic!("Unexpected anomaly: {:?}", other),
    }

    let codes: Vec<&str> = report.anomalies.iter().map(|a| a.code()).collect();
    assert!(codes.contains(&"DUPLICATE_IDENTIFIER"));
    assert!(codes.contains(&"OUT_OF_RANGE"));

    let result = Pipeline::builder()
        .config(in_memory_config())
        .build()
        .unwrap()
        .process(df)
        .unwrap();

    assert_eq!(numbers(&result.cleaned, "nb_sold"), vec![None, Some(8.0), Some(9.0)]);
    assert_eq!(result.cleaning.coercions[0].rejected, 1);
    assert!(
        result
            .after
            .anomalies
            .contains(&Anomaly::UnexpectedNull {
                column: "nb_sold".to_string(),
                count: 1
            })
    );
}

#[test]
fn test_inspect_does_not_mutate_input() {
    let df = load_fixture("sales_messy.csv");
    let before = df.clone();

    let report = DatasetInspector::inspect(&df, &DatasetSchema::product_sales()).unwrap();

    assert!(df.equals_missing(&before));
    assert_eq!(report.shape, (10, 8));
    assert_eq!(report.duplicate_row_count, 0);
    let methods = &report.column("sales_method").unwrap().unique_values;
    assert!(methods.contains(&"Em + Call".to_string()));
    assert!(methods.contains(&"CALL".to_string()));
}

#[test]
fn test_missing_input_is_io_failure() {
    let err = load_dataset(fixtures_path().join("does_not_exist.csv")).unwrap_err();
    assert!(err.is_io_failure());
    assert!(matches!(err, AnalysisError::WithContext { .. }));
}

// ============================================================================
// Output files
// ============================================================================

#[test]
fn test_cleaned_csv_keeps_layout_and_row_order() {
    let dir = TempDir::new().unwrap();
    let input = load_fixture("sales_messy.csv");
    let input_columns: Vec<String> = input
        .get_column_names()
        .iter()
        .map(|c| c.to_string())
        .collect();
    let input_ids = strings(&input, "customer_id");

    let config = AnalysisConfig::builder()
        .output_dir(dir.path())
        .build()
        .unwrap();
    let result = Pipeline::builder()
        .config(config)
        .dataset_name("sales_messy")
        .build()
        .unwrap()
        .process(input)
        .unwrap();

    let output_path = result.output_path.clone().expect("CSV should be written");
    assert_eq!(output_path, dir.path().join("sales_messy_cleaned.csv"));

    let written = load_dataset(&output_path).unwrap();
    let written_columns: Vec<String> = written
        .get_column_names()
        .iter()
        .map(|c| c.to_string())
        .collect();
    assert_eq!(written_columns, input_columns);
    assert_eq!(strings(&written, "customer_id"), input_ids);
    assert_eq!(strings(&written, "sales_method"), strings(&result.cleaned, "sales_method"));
    assert_eq!(written.column("revenue").unwrap().null_count(), 0);

    assert_no_temp_files(dir.path());
}

#[test]
fn test_report_written_next_to_output() {
    let dir = TempDir::new().unwrap();
    let result = run_in_memory("sales_messy.csv");

    let report = ReportGenerator::build_report("sales_messy.csv", &result);
    assert_eq!(report.summary.rows, 10);
    assert_eq!(report.summary.values_imputed, 3);
    assert!(report.output_file.is_none());

    let generator = ReportGenerator::new(dir.path().to_path_buf(), None);
    let path = generator.write_report_to_file(&report, "sales_messy").unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(json["input_file"], "sales_messy.csv");
    assert_eq!(json["metrics"]["arpc_by_method"][0]["method"], "Call");
    assert_eq!(json["validation_after"]["shape"][0], 10);
}

#[test]
fn test_progress_reaches_writing_stage() {
    let dir = TempDir::new().unwrap();
    let stages = Arc::new(Mutex::new(Vec::new()));
    let stages_clone = stages.clone();

    let config = AnalysisConfig::builder()
        .output_dir(dir.path())
        .build()
        .unwrap();
    Pipeline::builder()
        .config(config)
        .on_progress(move |update| stages_clone.lock().unwrap().push(update.stage))
        .build()
        .unwrap()
        .process(load_fixture("sales_small.csv"))
        .unwrap();

    let stages = stages.lock().unwrap();
    assert!(stages.contains(&AnalysisStage::Writing));
    assert_eq!(stages.last(), Some(&AnalysisStage::Complete));
}

fn assert_no_temp_files(dir: &Path) {
    let leftovers: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "Temporary files left behind: {:?}", leftovers);
}
