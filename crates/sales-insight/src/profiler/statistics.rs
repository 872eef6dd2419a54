//! Descriptive statistics for numeric columns.

use crate::types::SummaryStatistics;

/// Multiplier of the interquartile range defining the outlier fences.
pub const IQR_FENCE: f64 = 1.5;

/// Quantile of sorted values with linear interpolation between closest ranks.
///
/// `q` is in `[0, 1]`. Returns `None` for an empty slice.
pub(crate) fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Sample standard deviation (n - 1 denominator).
pub(crate) fn sample_std(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Summarize the non-null values of a column.
pub fn summarize(values: &[Option<f64>]) -> SummaryStatistics {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    present.sort_by(|a, b| a.total_cmp(b));

    let count = present.len();
    let mean = (count > 0).then(|| present.iter().sum::<f64>() / count as f64);
    let std = mean.and_then(|m| sample_std(&present, m));
    let q25 = quantile(&present, 0.25);
    let q75 = quantile(&present, 0.75);

    let outlier_count = match (q25, q75) {
        (Some(q1), Some(q3)) => {
            let iqr = q3 - q1;
            let low = q1 - IQR_FENCE * iqr;
            let high = q3 + IQR_FENCE * iqr;
            present.iter().filter(|v| **v < low || **v > high).count()
        }
        _ => 0,
    };

    SummaryStatistics {
        count,
        mean,
        std,
        min: present.first().copied(),
        q25,
        median: quantile(&present, 0.5),
        q75,
        max: present.last().copied(),
        outlier_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.0), Some(1.0));
        assert_eq!(quantile(&sorted, 0.25), Some(1.75));
        assert_eq!(quantile(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile(&sorted, 0.75), Some(3.25));
        assert_eq!(quantile(&sorted, 1.0), Some(4.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_summarize() {
        let stats = summarize(&[Some(2.0), None, Some(4.0), Some(4.0), Some(4.0), Some(5.0), Some(5.0), Some(7.0), Some(9.0)]);
        assert_eq!(stats.count, 8);
        assert_eq!(stats.mean, Some(5.0));
        assert_eq!(stats.min, Some(2.0));
        assert_eq!(stats.max, Some(9.0));
        assert_eq!(stats.median, Some(4.5));
        let std = stats.std.unwrap();
        assert!((std - 2.138_089_935).abs() < 1e-6);
    }

    #[test]
    fn test_outlier_count() {
        let stats = summarize(&[Some(10.0), Some(11.0), Some(12.0), Some(13.0), Some(100.0)]);
        // q1 = 11, q3 = 13, fences at 8 and 16
        assert_eq!(stats.outlier_count, 1);
    }

    #[test]
    fn test_single_value_has_no_std() {
        let stats = summarize(&[Some(3.0)]);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.std, None);
        assert_eq!(stats.q25, Some(3.0));
        assert_eq!(stats.outlier_count, 0);
    }

    #[test]
    fn test_empty_column() {
        let stats = summarize(&[None, None]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.mean, None);
        assert_eq!(stats.median, None);
    }
}
