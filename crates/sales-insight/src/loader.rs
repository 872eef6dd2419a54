//! CSV loading with fallback strategies.
//!
//! The loader tries progressively more forgiving readers. A file that
//! cannot be read at all is an IO failure; a file whose columns cannot be
//! typed is still loaded, as text, and left to type coercion.

use crate::error::{AnalysisError, Result, ResultExt};
use polars::prelude::*;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load a comma-delimited file with a header row.
///
/// Strategies, in order:
/// 1. Typed read, inferring the schema from every row
/// 2. Every column read as text
/// 3. Content pre-cleaned (doubled quotes, blank lines) then read as text
pub fn load_dataset(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();

    // Missing or unreadable files are fatal before any parsing is attempted
    fs::metadata(path).context(format!("Failed to read {}", path.display()))?;

    // Strategy 1: Typed read over the full file
    match read_csv(path, None) {
        Ok(df) => {
            info!(
                "Loaded {}: {} rows x {} columns",
                path.display(),
                df.height(),
                df.width()
            );
            return Ok(df);
        }
        Err(e) => debug!("Typed loading failed: {}", e),
    }

    // Strategy 2: All columns as text
    match read_csv(path, Some(0)) {
        Ok(df) => {
            warn!(
                "Loaded {} with every column as text, types will be coerced",
                path.display()
            );
            return Ok(df);
        }
        Err(e) => debug!("Text loading failed: {}", e),
    }

    // Strategy 3: Pre-clean content
    let content =
        fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
    let cursor = Cursor::new(clean_csv_content(&content));

    CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
        .into_reader_with_file_handle(cursor)
        .finish()
        .map_err(|e| {
            AnalysisError::Polars(e).with_context(format!("Failed to parse {}", path.display()))
        })
}

fn read_csv(path: &Path, infer_schema_length: Option<usize>) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_infer_schema_length(infer_schema_length)
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}

/// Collapse doubled quotes and drop blank lines.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_typed_columns() {
        let file = csv_file("week,sales_method,revenue\n1,Email,100.5\n2,Call,\n");
        let df = load_dataset(file.path()).unwrap();

        assert_eq!(df.shape(), (2, 3));
        assert_eq!(df.column("week").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("revenue").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("revenue").unwrap().null_count(), 1);
    }

    #[test]
    fn test_missing_file_is_io_failure() {
        let err = load_dataset("does/not/exist.csv").unwrap_err();
        assert!(err.is_io_failure());
    }

    #[test]
    fn test_clean_csv_content() {
        let cleaned = clean_csv_content("a,b\n\n\"\"x\"\",1\n   \n");
        assert_eq!(cleaned, "a,b\n\"x\",1");
    }
}
