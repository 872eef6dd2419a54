//! Report generation module.
//!
//! This module writes cleaned datasets and builds the structured
//! [`AnalysisReport`] of a run, suitable for:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`--emit-report` CLI flag)
//! - Programmatic access in library mode
//!
//! # Example
//!
//! ```rust,ignore
//! use sales_insight::reporting::ReportGenerator;
//!
//! let report = ReportGenerator::build_report("data/product_sales.csv", &result);
//! println!("{}", serde_json::to_string_pretty(&report)?);
//!
//! let generator = ReportGenerator::new(PathBuf::from("outputs"), None);
//! generator.write_report_to_file(&report, "product_sales")?;
//! ```

mod generator;

pub use generator::{AnalysisReport, ReportGenerator, RunSummary};
