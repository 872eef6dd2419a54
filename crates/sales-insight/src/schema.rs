//! Explicit schema descriptor for tabular datasets.
//!
//! A [`DatasetSchema`] lists the columns a dataset is expected to carry,
//! each with a semantic type, a nullability flag and an optional lower
//! bound. The validator and the type corrector take the schema as input
//! instead of assuming column names, so the same code runs against any
//! dataset whose layout can be described this way.
//!
//! # Example
//!
//! ```rust,ignore
//! use sales_insight::schema::{ColumnSpec, DatasetSchema, SemanticType};
//!
//! let schema = DatasetSchema::new(vec![
//!     ColumnSpec::new("order_id", SemanticType::Identifier),
//!     ColumnSpec::new("amount", SemanticType::Float).nullable().minimum(0.0),
//! ])?;
//! ```

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Column names of the product sales dataset.
pub mod columns {
    pub const WEEK: &str = "week";
    pub const SALES_METHOD: &str = "sales_method";
    pub const CUSTOMER_ID: &str = "customer_id";
    pub const NB_SOLD: &str = "nb_sold";
    pub const REVENUE: &str = "revenue";
    pub const YEARS_AS_CUSTOMER: &str = "years_as_customer";
    pub const NB_SITE_VISITS: &str = "nb_site_visits";
    pub const STATE: &str = "state";

    /// Numeric columns described and correlated in the exploratory analysis.
    pub const NUMERIC_MEASURES: [&str; 4] = [REVENUE, NB_SOLD, YEARS_AS_CUSTOMER, NB_SITE_VISITS];
}

/// Expected meaning of a column's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    /// Whole numbers (counts, indices)
    Integer,
    /// Real numbers (amounts)
    Float,
    /// Labels drawn from a small set
    Categorical,
    /// Per-record identifiers, expected unique
    Identifier,
}

impl SemanticType {
    /// Whether values of this type are parsed as numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    /// Whether values of this type are kept as text.
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Categorical | Self::Identifier)
    }

    /// Whether a parsed number is a valid value of this type.
    pub fn accepts(&self, value: f64) -> bool {
        match self {
            Self::Integer => value.fract() == 0.0,
            Self::Float => true,
            Self::Categorical | Self::Identifier => false,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Categorical => "categorical",
            Self::Identifier => "identifier",
        };
        f.write_str(name)
    }
}

/// Expectations for a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub semantic_type: SemanticType,
    /// Whether nulls are acceptable on input.
    #[serde(default)]
    pub nullable: bool,
    /// Inclusive lower bound for numeric columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
}

impl ColumnSpec {
    /// A non-nullable column without bounds.
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
            nullable: false,
            minimum: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }
}

/// Ordered set of column expectations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSchema {
    columns: Vec<ColumnSpec>,
}

impl DatasetSchema {
    /// Create a schema, rejecting empty or duplicated column names.
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self> {
        let schema = Self { columns };
        schema.validate()?;
        Ok(schema)
    }

    /// Schema of the product sales dataset.
    pub fn product_sales() -> Self {
        use columns::*;

        Self {
            columns: vec![
                ColumnSpec::new(WEEK, SemanticType::Integer).minimum(0.0),
                ColumnSpec::new(SALES_METHOD, SemanticType::Categorical),
                ColumnSpec::new(CUSTOMER_ID, SemanticType::Identifier),
                ColumnSpec::new(NB_SOLD, SemanticType::Integer).minimum(0.0),
                ColumnSpec::new(REVENUE, SemanticType::Float)
                    .nullable()
                    .minimum(0.0),
                ColumnSpec::new(YEARS_AS_CUSTOMER, SemanticType::Integer).minimum(0.0),
                ColumnSpec::new(NB_SITE_VISITS, SemanticType::Integer).minimum(0.0),
                ColumnSpec::new(STATE, SemanticType::Categorical),
            ],
        }
    }

    /// Load a schema from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let schema: DatasetSchema = serde_json::from_str(&content)?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(AnalysisError::InvalidSchema(
                "schema declares no columns".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for spec in &self.columns {
            if spec.name.trim().is_empty() {
                return Err(AnalysisError::InvalidSchema(
                    "column name must not be empty".to_string(),
                ));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(AnalysisError::InvalidSchema(format!(
                    "column '{}' declared more than once",
                    spec.name
                )));
            }
            if spec.minimum.is_some() && !spec.semantic_type.is_numeric() {
                return Err(AnalysisError::InvalidSchema(format!(
                    "column '{}' is {} but declares a minimum",
                    spec.name, spec.semantic_type
                )));
            }
        }

        Ok(())
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Look up a column by name.
    pub fn get(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|spec| spec.name == name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Default for DatasetSchema {
    fn default() -> Self {
        Self::product_sales()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_sales_schema() {
        let schema = DatasetSchema::product_sales();
        assert_eq!(schema.len(), 8);
        assert!(schema.validate().is_ok());

        let revenue = schema.get(columns::REVENUE).unwrap();
        assert_eq!(revenue.semantic_type, SemanticType::Float);
        assert!(revenue.nullable);

        let week = schema.get(columns::WEEK).unwrap();
        assert!(!week.nullable);
        assert_eq!(week.minimum, Some(0.0));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = DatasetSchema::new(vec![
            ColumnSpec::new("a", SemanticType::Integer),
            ColumnSpec::new("a", SemanticType::Float),
        ]);
        assert!(matches!(result, Err(AnalysisError::InvalidSchema(_))));
    }

    #[test]
    fn test_minimum_on_text_rejected() {
        let result = DatasetSchema::new(vec![
            ColumnSpec::new("label", SemanticType::Categorical).minimum(1.0),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_schema_rejected() {
        assert!(DatasetSchema::new(vec![]).is_err());
    }

    #[test]
    fn test_schema_from_json() {
        let json = r#"{
            "columns": [
                {"name": "order_id", "semantic_type": "identifier"},
                {"name": "amount", "semantic_type": "float", "nullable": true, "minimum": 0.0}
            ]
        }"#;
        let schema: DatasetSchema = serde_json::from_str(json).unwrap();
        assert!(schema.validate().is_ok());
        assert_eq!(schema.get("amount").unwrap().minimum, Some(0.0));
        assert!(!schema.get("order_id").unwrap().nullable);
    }
}
