//! Configuration types for the sales analysis pipeline.
//!
//! This module provides configuration options using the builder pattern.
//! The defaults describe the product sales dataset: `sales_method` is
//! title-cased with the `"Em + Call"` abbreviation expanded, and `revenue`
//! is imputed with the mean of its sales method.

use crate::schema::columns;
use crate::utils::collapse_whitespace;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Casing transform applied to categorical values before alias lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CasingRule {
    /// First letter of each word uppercased, the rest lowercased.
    /// A word starts after any character that is not a letter.
    #[default]
    TitleCase,
    /// Every letter lowercased
    Lowercase,
    /// Every letter uppercased
    Uppercase,
    /// Leave casing untouched
    Preserve,
}

impl CasingRule {
    /// Apply the casing transform to a value.
    pub fn apply(&self, value: &str) -> String {
        match self {
            Self::TitleCase => {
                // Word boundaries follow the emitted characters, so a letter
                // whose uppercase form expands ('ß' to "SS") only keeps its
                // first character uppercase and a second pass changes nothing.
                let mut result = String::with_capacity(value.len());
                let mut previous_is_letter = false;
                for c in value.chars() {
                    if !c.is_alphabetic() {
                        result.push(c);
                        previous_is_letter = false;
                        continue;
                    }
                    let cased: Vec<char> = if previous_is_letter {
                        c.to_lowercase().collect()
                    } else {
                        c.to_uppercase().collect()
                    };
                    for ch in cased {
                        if previous_is_letter {
                            result.extend(ch.to_lowercase());
                        } else {
                            result.push(ch);
                        }
                        previous_is_letter = ch.is_alphabetic();
                    }
                }
                result
            }
            Self::Lowercase => value.to_lowercase(),
            Self::Uppercase => value.to_uppercase(),
            Self::Preserve => value.to_string(),
        }
    }
}

/// Normalization of one categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationRule {
    pub column: String,
    #[serde(default)]
    pub casing: CasingRule,
    /// Exact-match substitutions applied after casing.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl NormalizationRule {
    pub fn new(column: impl Into<String>, casing: CasingRule) -> Self {
        Self {
            column: column.into(),
            casing,
            aliases: BTreeMap::new(),
        }
    }

    pub fn alias(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.aliases.insert(from.into(), to.into());
        self
    }
}

/// Grouped-mean imputation of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationRule {
    pub target_column: String,
    pub group_by_column: String,
}

impl ImputationRule {
    pub fn new(target_column: impl Into<String>, group_by_column: impl Into<String>) -> Self {
        Self {
            target_column: target_column.into(),
            group_by_column: group_by_column.into(),
        }
    }
}

/// Configuration for the analysis pipeline.
///
/// Use [`AnalysisConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use sales_insight::config::{AnalysisConfig, CasingRule, NormalizationRule};
///
/// let config = AnalysisConfig::builder()
///     .normalization(NormalizationRule::new("state", CasingRule::TitleCase))
///     .top_regions(5)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Categorical normalizations, applied in order before any imputation.
    pub normalizations: Vec<NormalizationRule>,

    /// Grouped-mean imputations, applied in order after normalization.
    pub imputations: Vec<ImputationRule>,

    /// Columns described by the outlier statistics.
    /// Default: revenue, nb_sold, years_as_customer, nb_site_visits
    pub outlier_columns: Vec<String>,

    /// Columns included in the correlation matrix.
    /// Default: same as `outlier_columns`
    pub correlation_columns: Vec<String>,

    /// Column summed by the business metrics.
    /// Default: "revenue"
    pub revenue_column: String,

    /// Column defining the sales channel.
    /// Default: "sales_method"
    pub method_column: String,

    /// Column holding the week index.
    /// Default: "week"
    pub week_column: String,

    /// Column holding the shipment region.
    /// Default: "state"
    pub region_column: String,

    /// Columns the revenue is broken down by.
    /// Default: week, nb_site_visits, nb_sold, years_as_customer
    pub breakdown_columns: Vec<String>,

    /// Number of regions kept in the top-regions breakdown.
    /// Default: 10
    pub top_regions: usize,

    /// Output directory for the cleaned dataset and reports.
    /// Default: "outputs"
    pub output_dir: PathBuf,

    /// Custom output file name (without extension).
    /// If None, uses "{input_stem}_cleaned".
    pub output_name: Option<String>,

    /// Whether the pipeline writes the cleaned dataset to disk.
    /// Default: true
    pub save_to_disk: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            normalizations: vec![default_method_normalization()],
            imputations: vec![ImputationRule::new(columns::REVENUE, columns::SALES_METHOD)],
            outlier_columns: default_measures(),
            correlation_columns: default_measures(),
            revenue_column: columns::REVENUE.to_string(),
            method_column: columns::SALES_METHOD.to_string(),
            week_column: columns::WEEK.to_string(),
            region_column: columns::STATE.to_string(),
            breakdown_columns: default_breakdowns(),
            top_regions: 10,
            output_dir: PathBuf::from("outputs"),
            output_name: None,
            save_to_disk: true,
        }
    }
}

fn default_method_normalization() -> NormalizationRule {
    NormalizationRule::new(columns::SALES_METHOD, CasingRule::TitleCase)
        .alias("Em + Call", "Email + Call")
}

fn default_measures() -> Vec<String> {
    columns::NUMERIC_MEASURES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_breakdowns() -> Vec<String> {
    [
        columns::WEEK,
        columns::NB_SITE_VISITS,
        columns::NB_SOLD,
        columns::YEARS_AS_CUSTOMER,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: AnalysisConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let named = [
            ("revenue_column", &self.revenue_column),
            ("method_column", &self.method_column),
            ("week_column", &self.week_column),
            ("region_column", &self.region_column),
        ];
        for (field, value) in named {
            if value.trim().is_empty() {
                return Err(ConfigValidationError::EmptyColumnName(field.to_string()));
            }
        }

        for rule in &self.normalizations {
            if rule.column.trim().is_empty() {
                return Err(ConfigValidationError::EmptyColumnName(
                    "normalizations.column".to_string(),
                ));
            }
            validate_aliases(rule)?;
        }

        for rule in &self.imputations {
            if rule.target_column.trim().is_empty() || rule.group_by_column.trim().is_empty() {
                return Err(ConfigValidationError::EmptyColumnName(
                    "imputations".to_string(),
                ));
            }
            if rule.target_column == rule.group_by_column {
                return Err(ConfigValidationError::SelfGroupedImputation(
                    rule.target_column.clone(),
                ));
            }
        }

        if self.top_regions == 0 {
            return Err(ConfigValidationError::InvalidTopRegions(self.top_regions));
        }

        Ok(())
    }
}

/// Alias targets must be left unchanged by a second normalization pass.
fn validate_aliases(rule: &NormalizationRule) -> Result<(), ConfigValidationError> {
    for (from, to) in &rule.aliases {
        let recased = rule.casing.apply(&collapse_whitespace(to));
        let stable = recased == *to
            && rule
                .aliases
                .get(to)
                .is_none_or(|chained| chained == to);
        if !stable {
            return Err(ConfigValidationError::UnstableAlias {
                column: rule.column.clone(),
                from: from.clone(),
                to: to.clone(),
            });
        }
    }
    Ok(())
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Column name for '{0}' must not be empty")]
    EmptyColumnName(String),

    #[error("Imputation of '{0}' cannot be grouped by the same column")]
    SelfGroupedImputation(String),

    #[error(
        "Alias '{from}' -> '{to}' on column '{column}' is not stable under re-normalization"
    )]
    UnstableAlias {
        column: String,
        from: String,
        to: String,
    },

    #[error("Invalid top regions: {0} (must be at least 1)")]
    InvalidTopRegions(usize),
}

/// Builder for [`AnalysisConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    normalizations: Option<Vec<NormalizationRule>>,
    imputations: Option<Vec<ImputationRule>>,
    outlier_columns: Option<Vec<String>>,
    correlation_columns: Option<Vec<String>>,
    revenue_column: Option<String>,
    method_column: Option<String>,
    week_column: Option<String>,
    region_column: Option<String>,
    breakdown_columns: Option<Vec<String>>,
    top_regions: Option<usize>,
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
    save_to_disk: Option<bool>,
}

impl AnalysisConfigBuilder {
    /// Add a categorical normalization.
    ///
    /// The first call replaces the default `sales_method` normalization.
    pub fn normalization(mut self, rule: NormalizationRule) -> Self {
        self.normalizations.get_or_insert_with(Vec::new).push(rule);
        self
    }

    /// Replace all categorical normalizations.
    pub fn normalizations(mut self, rules: Vec<NormalizationRule>) -> Self {
        self.normalizations = Some(rules);
        self
    }

    /// Add a grouped-mean imputation.
    ///
    /// The first call replaces the default `revenue` by `sales_method` imputation.
    pub fn imputation(mut self, rule: ImputationRule) -> Self {
        self.imputations.get_or_insert_with(Vec::new).push(rule);
        self
    }

    /// Replace all imputations.
    pub fn imputations(mut self, rules: Vec<ImputationRule>) -> Self {
        self.imputations = Some(rules);
        self
    }

    pub fn outlier_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outlier_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn correlation_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.correlation_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn breakdown_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.breakdown_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn revenue_column(mut self, column: impl Into<String>) -> Self {
        self.revenue_column = Some(column.into());
        self
    }

    pub fn method_column(mut self, column: impl Into<String>) -> Self {
        self.method_column = Some(column.into());
        self
    }

    pub fn week_column(mut self, column: impl Into<String>) -> Self {
        self.week_column = Some(column.into());
        self
    }

    pub fn region_column(mut self, column: impl Into<String>) -> Self {
        self.region_column = Some(column.into());
        self
    }

    /// Set how many regions the top-regions breakdown keeps.
    pub fn top_regions(mut self, n: usize) -> Self {
        self.top_regions = Some(n);
        self
    }

    /// Set the output directory for the cleaned dataset and reports.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set a custom output file name (without extension).
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Enable or disable writing the cleaned dataset to disk.
    pub fn save_to_disk(mut self, save: bool) -> Self {
        self.save_to_disk = Some(save);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AnalysisConfig` or an error if validation fails.
    pub fn build(self) -> Result<AnalysisConfig, ConfigValidationError> {
        let defaults = AnalysisConfig::default();
        let outlier_columns = self.outlier_columns.unwrap_or(defaults.outlier_columns);
        let config = AnalysisConfig {
            normalizations: self.normalizations.unwrap_or(defaults.normalizations),
            imputations: self.imputations.unwrap_or(defaults.imputations),
            correlation_columns: self
                .correlation_columns
                .unwrap_or_else(|| outlier_columns.clone()),
            outlier_columns,
            revenue_column: self.revenue_column.unwrap_or(defaults.revenue_column),
            method_column: self.method_column.unwrap_or(defaults.method_column),
            week_column: self.week_column.unwrap_or(defaults.week_column),
            region_column: self.region_column.unwrap_or(defaults.region_column),
            breakdown_columns: self.breakdown_columns.unwrap_or(defaults.breakdown_columns),
            top_regions: self.top_regions.unwrap_or(defaults.top_regions),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            output_name: self.output_name,
            save_to_disk: self.save_to_disk.unwrap_or(defaults.save_to_disk),
        };

        config.validate()?;
        Ok(config)
    }
}
