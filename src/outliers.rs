//! Outlier removal using Tukey fences.
//!
//! Quartiles are taken by index into the sorted column (Q1 at `n/4`, Q3 at
//! `3n/4`) rather than interpolated, so the fences match what a user sees when
//! counting rows by hand.

use crate::data::Record;
use crate::error::{Result, VizError};
use tracing::debug;

/// Default IQR multiplier.
pub const DEFAULT_IQR_THRESHOLD: f64 = 1.5;

/// Inclusive range of accepted values for one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fences {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl Fences {
    /// Compute fences from a column's values. Returns `None` for an empty slice.
    pub fn from_values(values: &[f64], threshold: f64) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len();
        let q1 = sorted[n / 4];
        let q3 = sorted[(3 * n) / 4];
        let iqr = q3 - q1;
        Some(Self {
            q1,
            q3,
            lower: q1 - threshold * iqr,
            upper: q3 + threshold * iqr,
        })
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.lower && v <= self.upper
    }
}

/// Drop records whose value in any of `columns` falls outside that column's
/// fences.
///
/// Columns are processed in order and each one sees only the records that
/// survived the previous columns. A record with a non-numeric value in the
/// column being checked is dropped. A column with no numeric values at all is
/// skipped.
///
/// A second pass removes nothing more only when the survivors have the same
/// quartiles as the input. Index-based quartiles can shift: with threshold 0,
/// values 1..=8 keep 3..=7 (fences from Q1 = 3, Q3 = 7), and a second pass
/// over those keeps only 4..=6.
pub fn remove_outliers(records: &[Record], columns: &[String], threshold: f64) -> Result<Vec<Record>> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(VizError::InvalidParameter(format!(
            "outlier threshold must be a finite non-negative number, got {}",
            threshold
        )));
    }

    let mut current: Vec<Record> = records.to_vec();
    for column in columns {
        let values: Vec<f64> = current
            .iter()
            .filter_map(|r| r.get(column).and_then(|v| v.as_finite()))
            .collect();

        let Some(fences) = Fences::from_values(&values, threshold) else {
            debug!("Skipping outlier check for '{}': no numeric values", column);
            continue;
        };

        let before = current.len();
        current.retain(|r| {
            r.get(column)
                .and_then(|v| v.as_finite())
                .map(|v| fences.contains(v))
                .unwrap_or(false)
        });
        debug!(
            "Column '{}': fences [{}, {}], removed {} rows",
            column,
            fences.lower,
            fences.upper,
            before - current.len()
        );
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{record, Value};

    fn column(values: &[f64]) -> Vec<Record> {
        values.iter().map(|&v| record([("v", v)])).collect()
    }

    fn values_of(records: &[Record], col: &str) -> Vec<f64> {
        records.iter().filter_map(|r| r.get(col).and_then(|v| v.as_number())).collect()
    }

    #[test]
    fn test_index_based_quartiles() {
        let fences = Fences::from_values(&[5.0, 1.0, 4.0, 2.0, 3.0, 100.0, 6.0, 7.0], 1.5).unwrap();
        // sorted: 1 2 3 4 5 6 7 100; n=8 -> q1 = [2] = 3, q3 = [6] = 7
        assert_eq!(fences.q1, 3.0);
        assert_eq!(fences.q3, 7.0);
        assert_eq!(fences.lower, -3.0);
        assert_eq!(fences.upper, 13.0);
    }

    #[test]
    fn test_removes_extreme_value() {
        let data = column(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 100.0]);
        let cleaned = remove_outliers(&data, &["v".to_string()], DEFAULT_IQR_THRESHOLD).unwrap();
        assert_eq!(values_of(&cleaned, "v"), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(data.len(), 8);
    }

    #[test]
    fn test_idempotent_on_cleaned_data() {
        let data = column(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 100.0]);
        let cols = vec!["v".to_string()];
        let once = remove_outliers(&data, &cols, 1.5).unwrap();
        let twice = remove_outliers(&once, &cols, 1.5).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_zero_threshold_shrinks_again_on_repeat() {
        let data = column(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let cols = vec!["v".to_string()];
        let once = remove_outliers(&data, &cols, 0.0).unwrap();
        assert_eq!(values_of(&once, "v"), vec![3.0, 4.0, 5.0, 6.0, 7.0]);
        let twice = remove_outliers(&once, &cols, 0.0).unwrap();
        assert_eq!(values_of(&twice, "v"), vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_cumulative_across_columns() {
        let mut data: Vec<Record> = (1..=8)
            .map(|i| record([("a", i as f64), ("b", i as f64)]))
            .collect();
        data[7].insert("a".to_string(), Value::from(1000.0));
        data[0].insert("b".to_string(), Value::from(-1000.0));
        let cleaned =
            remove_outliers(&data, &["a".to_string(), "b".to_string()], 1.5).unwrap();
        assert_eq!(values_of(&cleaned, "a"), vec![2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_non_numeric_value_dropped() {
        let mut data = column(&[1.0, 2.0, 3.0, 4.0]);
        data.push(record([("v", "n/a")]));
        let cleaned = remove_outliers(&data, &["v".to_string()], 1.5).unwrap();
        assert_eq!(cleaned.len(), 4);
    }

    #[test]
    fn test_column_without_numbers_skipped() {
        let data = vec![record([("s", "x")]), record([("s", "y")])];
        let cleaned = remove_outliers(&data, &["s".to_string()], 1.5).unwrap();
        assert_eq!(cleaned, data);
    }

    #[test]
    fn test_zero_threshold_keeps_interquartile_range() {
        let data = column(&[1.0, 2.0, 3.0, 4.0]);
        // n=4 -> q1 = [1] = 2, q3 = [3] = 4
        let cleaned = remove_outliers(&data, &["v".to_string()], 0.0).unwrap();
        assert_eq!(values_of(&cleaned, "v"), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let err = remove_outliers(&column(&[1.0]), &["v".to_string()], -1.0).unwrap_err();
        assert!(err.is_configuration_error());
    }
}
