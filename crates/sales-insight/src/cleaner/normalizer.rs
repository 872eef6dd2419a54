//! Categorical normalization: whitespace, casing, then aliases.

use crate::config::CasingRule;
use crate::error::Result;
use crate::schema::SemanticType;
use crate::types::{Anomaly, NormalizationOutcome};
use crate::utils::{
    MISMATCH_SAMPLES, collapse_whitespace, distinct_strings, is_text_dtype, string_values,
};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Normalize the spelling of one value.
///
/// Whitespace is trimmed and collapsed, the casing rule applied, then the
/// result replaced by its alias if one matches exactly.
pub fn normalize_value(
    value: &str,
    casing: CasingRule,
    aliases: &BTreeMap<String, String>,
) -> (String, bool) {
    let cased = casing.apply(&collapse_whitespace(value));
    match aliases.get(&cased) {
        Some(canonical) => (canonical.clone(), true),
        None => (cased, false),
    }
}

/// Rewrite a textual column in place so every non-null value is canonical.
///
/// Nulls pass through. A missing or non-textual column is reported as an
/// anomaly and left untouched. Applying the same rule twice changes nothing
/// the second time as long as every alias target is itself canonical
/// (see [`AnalysisConfig::validate`](crate::config::AnalysisConfig::validate)).
pub fn normalize_categorical(
    df: &mut DataFrame,
    column: &str,
    casing: CasingRule,
    aliases: &BTreeMap<String, String>,
) -> Result<(NormalizationOutcome, Vec<Anomaly>)> {
    let mut outcome = NormalizationOutcome {
        column: column.to_string(),
        ..Default::default()
    };

    let Ok(col) = df.column(column) else {
        warn!("Cannot normalize '{}': column not found", column);
        return Ok((
            outcome,
            vec![Anomaly::MissingColumn {
                column: column.to_string(),
            }],
        ));
    };

    let series = col.as_materialized_series();
    let values = string_values(series)?;

    if !is_text_dtype(series.dtype()) {
        let samples: Vec<String> = values
            .iter()
            .flatten()
            .take(MISMATCH_SAMPLES)
            .cloned()
            .collect();
        let count = series.len() - series.null_count();
        warn!(
            "Cannot normalize '{}': dtype {} is not textual",
            column,
            series.dtype()
        );
        return Ok((
            outcome,
            vec![Anomaly::TypeMismatch {
                column: column.to_string(),
                expected: SemanticType::Categorical,
                count,
                samples,
            }],
        ));
    }

    outcome.distinct_before = distinct_strings(series)?;

    let normalized: Vec<Option<String>> = values
        .into_iter()
        .map(|opt| {
            opt.map(|original| {
                let (value, aliased) = normalize_value(&original, casing, aliases);
                if aliased {
                    outcome.aliases_applied += 1;
                }
                if value != original {
                    outcome.values_changed += 1;
                }
                value
            })
        })
        .collect();

    let new_series = Series::new(column.into(), normalized);
    outcome.distinct_after = distinct_strings(&new_series)?;
    df.replace(column, new_series)?;

    debug!(
        "Normalized '{}': {} value(s) changed, {} distinct -> {}",
        column,
        outcome.values_changed,
        outcome.distinct_before.len(),
        outcome.distinct_after.len()
    );

    Ok((outcome, Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn method_aliases() -> BTreeMap<String, String> {
        BTreeMap::from([("Em + Call".to_string(), "Email + Call".to_string())])
    }

    fn method_values(df: &DataFrame) -> Vec<Option<String>> {
        string_values(df.column("sales_method").unwrap().as_materialized_series()).unwrap()
    }

    #[test]
    fn test_alias_after_casing() {
        let (value, aliased) = normalize_value("Em + Call", CasingRule::TitleCase, &method_aliases());
        assert_eq!(value, "Email + Call");
        assert!(aliased);

        let (value, aliased) = normalize_value("em   +  call ", CasingRule::TitleCase, &method_aliases());
        assert_eq!(value, "Email + Call");
        assert!(aliased);
    }

    #[test]
    fn test_normalize_sales_method() {
        let mut df = df! {
            "sales_method" => [Some("email"), Some("Email"), None, Some("call"), Some("Em + Call")],
        }
        .unwrap();

        let (outcome, anomalies) =
            normalize_categorical(&mut df, "sales_method", CasingRule::TitleCase, &method_aliases())
                .unwrap();

        assert!(anomalies.is_empty());
        assert_eq!(
            method_values(&df),
            vec![
                Some("Email".to_string()),
                Some("Email".to_string()),
                None,
                Some("Call".to_string()),
                Some("Email + Call".to_string()),
            ]
        );
        assert_eq!(outcome.values_changed, 3);
        assert_eq!(outcome.aliases_applied, 1);
        assert_eq!(outcome.distinct_before.len(), 4);
        assert_eq!(outcome.distinct_after, vec!["Call", "Email", "Email + Call"]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut df = df! {
            "sales_method" => [Some("EMAIL"), Some(" em + call"), Some("call"), None],
        }
        .unwrap();

        normalize_categorical(&mut df, "sales_method", CasingRule::TitleCase, &method_aliases())
            .unwrap();
        let once = method_values(&df);

        let (outcome, _) =
            normalize_categorical(&mut df, "sales_method", CasingRule::TitleCase, &method_aliases())
                .unwrap();
        assert_eq!(method_values(&df), once);
        assert_eq!(outcome.values_changed, 0);
        assert_eq!(outcome.aliases_applied, 0);

        let mut df = df! {
            "sales_method" => [Some("straße"), Some("ß"), Some("ŉorth"), Some("ﬁeld")],
        }
        .unwrap();
        let (first, _) =
            normalize_categorical(&mut df, "sales_method", CasingRule::TitleCase, &method_aliases())
                .unwrap();
        let once = method_values(&df);
        assert_eq!(first.values_changed, 4);
        assert_eq!(once[1], Some("Ss".to_string()));

        let (second, _) =
            normalize_categorical(&mut df, "sales_method", CasingRule::TitleCase, &method_aliases())
                .unwrap();
        assert_eq!(method_values(&df), once);
        assert_eq!(second.values_changed, 0);
    }

    #[test]
    fn test_missing_column_reported() {
        let mut df = df! { "state" => ["Texas"] }.unwrap();
        let (outcome, anomalies) =
            normalize_categorical(&mut df, "sales_method", CasingRule::TitleCase, &method_aliases())
                .unwrap();

        assert_eq!(outcome.values_changed, 0);
        assert_eq!(
            anomalies,
            vec![Anomaly::MissingColumn {
                column: "sales_method".to_string()
            }]
        );
    }

    #[test]
    fn test_numeric_column_reported_and_untouched() {
        let mut df = df! { "sales_method" => [1i64, 2, 3] }.unwrap();
        let (_, anomalies) =
            normalize_categorical(&mut df, "sales_method", CasingRule::TitleCase, &method_aliases())
                .unwrap();

        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].code(), "TYPE_MISMATCH");
        assert_eq!(df.column("sales_method").unwrap().dtype(), &DataType::Int64);
    }
}
