//! CLI entry point for the sales analysis pipeline.

use anyhow::{Result, anyhow};
use clap::Parser;
use dotenv::dotenv;
use polars::prelude::*;
use sales_insight::{
    AnalysisConfig, AnalysisReport, DatasetInspector, DatasetSchema, Pipeline, ReportGenerator,
    ValidationReport, load_dataset,
};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Sales dataset validator, cleaner and revenue metrics",
    long_about = "Validates a product sales CSV against its schema, normalizes categorical \
                  labels, fills missing revenue with the mean of its sales method and reports \
                  revenue metrics.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  RUST_LOG              Overrides --log-level (may be set in .env)\n\n\
                  EXAMPLES:\n  \
                  # Clean a dataset and print a summary\n  \
                  sales-insight -i product_sales.csv\n\n  \
                  # Inspect only, write nothing\n  \
                  sales-insight -i product_sales.csv --dry-run\n\n  \
                  # Custom rules and a JSON report next to the cleaned CSV\n  \
                  sales-insight -i product_sales.csv --config rules.json -r\n\n  \
                  # Machine-readable output\n  \
                  sales-insight -i product_sales.csv --json | jq .metrics.arpc_by_method"
)]
struct Args {
    /// Path to the CSV file to analyze
    #[arg(short, long)]
    input: String,

    /// Output directory for results
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Custom output file name (without extension)
    ///
    /// If not specified, uses "<input_name>_cleaned"
    #[arg(long)]
    output_name: Option<String>,

    /// JSON file with the analysis configuration
    ///
    /// Defines normalization rules, imputation rules and metric columns
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON file with the dataset schema
    ///
    /// If not specified, the product sales schema is used
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Inspect the dataset without cleaning it or writing anything
    #[arg(long)]
    dry_run: bool,

    /// Number of regions listed in the top regions table
    #[arg(long)]
    top_regions: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Write a detailed JSON report to the output directory
    ///
    /// The report will be saved as <input_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // Load .env first so RUST_LOG set there reaches the filter
    dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let schema = match &args.schema {
        Some(path) => DatasetSchema::from_json_file(path)?,
        None => DatasetSchema::product_sales(),
    };

    info!("Loading dataset from: {}", args.input);
    let data = load_dataset(&args.input)?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    if args.dry_run {
        return run_dry_run(&args, &data, &schema);
    }

    let config = build_config(&args)?;
    let pipeline = Pipeline::builder()
        .config(config)
        .schema(schema)
        .dataset_name(extract_file_stem(&args.input))
        .on_progress(|update| {
            debug!("[{:.0}%] {}", update.progress * 100.0, update.message);
        })
        .build()?;

    run_pipeline(pipeline, &args, data)
}

/// Load the configuration file, if any, and apply the CLI overrides.
fn build_config(args: &Args) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::default(),
    };

    config.output_dir = PathBuf::from(&args.output);
    if let Some(ref name) = args.output_name {
        config.output_name = Some(name.clone());
    }
    if let Some(n) = args.top_regions {
        config.top_regions = n;
    }

    Ok(config)
}

/// Run dry-run mode: inspect the raw dataset and print the findings.
///
/// Note: This function uses `println!` intentionally for user-facing CLI output.
fn run_dry_run(args: &Args, data: &DataFrame, schema: &DatasetSchema) -> Result<()> {
    let report = DatasetInspector::inspect(data, schema)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Inspection of {}", args.input);
    println!("{}\n", "=".repeat(80));

    print_validation_report(&report);
    Ok(())
}

/// Run pipeline and print results
fn run_pipeline(pipeline: Pipeline, args: &Args, data: DataFrame) -> Result<()> {
    info!("{}", "=".repeat(80));
    info!("Starting sales analysis pipeline...");
    info!("{}", "=".repeat(80));

    match pipeline.process(data) {
        Ok(result) => {
            let report = ReportGenerator::build_report(&args.input, &result);
            handle_pipeline_output(&report, args)
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            Err(anyhow!("Pipeline failed: {}", e))
        }
    }
}

/// Handle pipeline output based on CLI flags.
///
/// Output behavior:
/// - Default: Print human-readable summary to stdout
/// - `--json`: Print JSON to stdout only (no logs)
/// - `--emit-report`: Write JSON report to file
fn handle_pipeline_output(report: &AnalysisReport, args: &Args) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    if args.emit_report {
        let input_stem = extract_file_stem(&args.input);
        let generator = ReportGenerator::new(PathBuf::from(&args.output), None);
        let report_path = generator.write_report_to_file(report, &input_stem)?;
        info!("Report written to: {}", report_path.display());
    }

    print_human_readable_summary(report);
    Ok(())
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn format_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

fn print_validation_report(report: &ValidationReport) {
    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  Rows: {}", report.shape.0);
    println!("  Columns: {}", report.shape.1);
    println!("  Duplicate rows: {}", report.duplicate_row_count);
    println!();

    println!("COLUMNS");
    println!("{}", "-".repeat(40));
    println!(
        "{:<20} {:<10} {:<12} {:<8} {:<8}",
        "Column", "Dtype", "Declared", "Nulls", "Unique"
    );
    println!("{}", "-".repeat(62));
    for col in &report.columns {
        let declared = col
            .semantic_type
            .map_or_else(|| "-".to_string(), |t| t.to_string());
        println!(
            "{:<20} {:<10} {:<12} {:<8} {:<8}",
            truncate_str(&col.name, 19),
            truncate_str(&col.dtype, 9),
            declared,
            col.null_count,
            col.distinct_count
        );
    }
    println!();

    let categorical: Vec<_> = report
        .columns
        .iter()
        .filter(|col| !col.unique_values.is_empty())
        .collect();
    if !categorical.is_empty() {
        println!("UNIQUE VALUES");
        println!("{}", "-".repeat(40));
        for col in categorical {
            println!("  {}: {}", col.name, col.unique_values.join(", "));
        }
        println!();
    }

    println!("ANOMALIES");
    println!("{}", "-".repeat(40));
    if report.anomalies.is_empty() {
        println!("  No anomalies detected");
    } else {
        for anomaly in &report.anomalies {
            println!("  - [{}] {}", anomaly.code(), anomaly);
        }
    }
    println!();
}

/// Print a human-readable summary of the analysis results.
///
/// This is the default output when `--json` is not specified.
fn print_human_readable_summary(report: &AnalysisReport) {
    let summary = &report.summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("ANALYSIS COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        report.input_file, summary.rows, summary.columns
    );
    if let Some(ref output_file) = report.output_file {
        println!("Output: {}", output_file);
    }
    println!();

    print_validation_report(&report.validation_after);

    println!("Processing Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!(
        "  Nulls: {} -> {}",
        summary.nulls_before, summary.nulls_after
    );
    println!("  Values normalized: {}", summary.values_normalized);
    println!("  Values imputed: {}", summary.values_imputed);
    println!("  Anomalies: {}", summary.anomaly_count);
    if !report.cleaning.steps.is_empty() {
        println!("Actions Taken:");
        for step in &report.cleaning.steps {
            println!("  - {}", step);
        }
    }
    for anomaly in &report.anomalies {
        println!("  ! [{}] {}", anomaly.code(), anomaly);
    }
    println!();

    if !report.statistics.is_empty() {
        println!("DESCRIPTIVE STATISTICS");
        println!("{}", "-".repeat(40));
        println!(
            "{:<20} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>9}",
            "Column", "Count", "Mean", "Std", "Min", "Median", "Max", "Outliers"
        );
        for (name, stats) in &report.statistics {
            println!(
                "{:<20} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>9}",
                truncate_str(name, 19),
                stats.count,
                format_opt(stats.mean),
                format_opt(stats.std),
                format_opt(stats.min),
                format_opt(stats.median),
                format_opt(stats.max),
                stats.outlier_count
            );
        }
        println!();
    }

    let metrics = &report.metrics;
    println!("BUSINESS METRICS");
    println!("{}", "-".repeat(40));
    println!("  Total revenue: {:.2}", metrics.total_revenue);
    println!("  Mean revenue:  {}", format_opt(metrics.mean_revenue));
    if !metrics.arpc_by_method.is_empty() {
        println!("  Revenue by method (average per customer, total):");
        for method in &metrics.arpc_by_method {
            println!(
                "    {:<20} {:>10.2} ({} customers, {:.2} total)",
                method.method, method.mean, method.customers, method.total
            );
        }
    }
    if !metrics.top_regions.is_empty() {
        println!("  Top regions:");
        for region in &metrics.top_regions {
            println!(
                "    {:<20} {:>6} rows {:>12.2}",
                truncate_str(&region.region, 19),
                region.count,
                region.revenue
            );
        }
    }
    for skipped in &metrics.skipped {
        println!("  Skipped: {}", skipped);
    }
    println!();
}
