//! Data cleaning module for preprocessing datasets.
//!
//! This module provides functionality for:
//! - Converting textual columns to their declared numeric types
//! - Normalizing categorical labels (whitespace, casing, aliases)
//! - Filling numeric nulls with their group mean
//!
//! Cleaning never removes or reorders rows.

mod normalizer;
mod type_corrector;

pub use normalizer::{normalize_categorical, normalize_value};
pub use type_corrector::TypeCorrector;

use crate::config::{AnalysisConfig, ImputationRule, NormalizationRule};
use crate::error::Result;
use crate::imputers::GroupedMeanImputer;
use crate::schema::DatasetSchema;
use crate::types::{Anomaly, CleaningLog};
use polars::prelude::*;
use tracing::{debug, info};

/// Data cleaner applying the configured cleaning steps.
///
/// Each step records what it did in a [`CleaningLog`] and returns the
/// anomalies it found. [`DataCleaner::clean`] runs every step in order.
pub struct DataCleaner;

impl DataCleaner {
    /// Clean a dataset in place.
    ///
    /// Steps run in this order:
    /// 1. Coerce textual columns declared numeric
    /// 2. Normalize every configured categorical column
    /// 3. Impute every configured numeric column by group
    ///
    /// Normalization precedes imputation so that group keys are canonical.
    pub fn clean(
        &self,
        df: &mut DataFrame,
        schema: &DatasetSchema,
        config: &AnalysisConfig,
    ) -> Result<(CleaningLog, Vec<Anomaly>)> {
        let mut log = CleaningLog::default();

        info!("Performing data cleaning...");
        let mut anomalies = self.coerce(df, schema, &mut log)?;
        for rule in &config.normalizations {
            anomalies.extend(self.normalize(df, rule, &mut log)?);
        }
        for rule in &config.imputations {
            anomalies.extend(self.impute(df, rule, &mut log)?);
        }

        debug!("Cleaning finished with {} anomalies", anomalies.len());
        Ok((log, anomalies))
    }

    /// Convert textual columns to their declared numeric types.
    pub fn coerce(
        &self,
        df: &mut DataFrame,
        schema: &DatasetSchema,
        log: &mut CleaningLog,
    ) -> Result<Vec<Anomaly>> {
        let (coercions, anomalies) = TypeCorrector.coerce_to_schema(df, schema)?;
        for coercion in &coercions {
            log.steps.push(format!(
                "Converted '{}' from {} to {} ({} unreadable value(s) set to null)",
                coercion.column, coercion.from_dtype, coercion.to_dtype, coercion.rejected
            ));
        }
        log.coercions.extend(coercions);
        Ok(anomalies)
    }

    /// Normalize one categorical column.
    pub fn normalize(
        &self,
        df: &mut DataFrame,
        rule: &NormalizationRule,
        log: &mut CleaningLog,
    ) -> Result<Vec<Anomaly>> {
        let (outcome, anomalies) =
            normalize_categorical(df, &rule.column, rule.casing, &rule.aliases)?;
        if anomalies.is_empty() {
            log.steps.push(format!(
                "Normalized '{}': {} value(s) changed, {} distinct -> {} distinct",
                outcome.column,
                outcome.values_changed,
                outcome.distinct_before.len(),
                outcome.distinct_after.len()
            ));
            log.normalizations.push(outcome);
        } else {
            log.steps
                .push(format!("Skipped normalization of '{}'", rule.column));
        }
        Ok(anomalies)
    }

    /// Fill the nulls of one numeric column with their group mean.
    pub fn impute(
        &self,
        df: &mut DataFrame,
        rule: &ImputationRule,
        log: &mut CleaningLog,
    ) -> Result<Vec<Anomaly>> {
        let (outcome, anomalies) = GroupedMeanImputer::impute_missing_numeric(
            df,
            &rule.target_column,
            &rule.group_by_column,
        )?;
        if outcome.nulls_before > 0 {
            log.steps.push(format!(
                "Filled {} null(s) in '{}' with the mean of their '{}' group ({} left)",
                outcome.filled(),
                outcome.target_column,
                outcome.group_by_column,
                outcome.nulls_after
            ));
        } else {
            log.steps
                .push(format!("No nulls to fill in '{}'", outcome.target_column));
        }
        log.imputations.push(outcome);
        Ok(anomalies)
    }
}
