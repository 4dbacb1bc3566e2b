use crate::data::Record;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Row/column labels and summed cell values of a heatmap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapMatrix {
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    /// Indexed `[row][col]`.
    pub values: Vec<Vec<f64>>,
}

impl HeatmapMatrix {
    /// Smallest and largest cell value.
    pub fn value_range(&self) -> (f64, f64) {
        self.values
            .iter()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }

    pub fn is_empty(&self) -> bool {
        self.row_labels.is_empty() || self.col_labels.is_empty()
    }
}

fn numeric_label(label: &str) -> Option<f64> {
    label.trim().parse::<f64>().ok().filter(|n| !n.is_nan())
}

/// Numeric labels first in numeric order, then text labels in text order.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    match (numeric_label(a), numeric_label(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn sorted_labels<'a>(records: impl Iterator<Item = &'a Record>, column: &str) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for record in records {
        if let Some(v) = record.get(column).filter(|v| !v.is_null()) {
            let label = v.label();
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
    }
    labels.sort_by(|a, b| compare_labels(a, b));
    labels
}

/// Build the matrix for a heatmap of `value` over `row` × `column`.
///
/// Labels come from the data. Each cell holds the sum of `value` over the
/// records that map to it; cells without records stay 0. Records with a
/// missing label or a non-numeric value do not contribute.
pub fn build_heatmap(records: &[Record], row: &str, column: &str, value: &str) -> HeatmapMatrix {
    let usable: Vec<&Record> = records
        .iter()
        .filter(|r| {
            r.get(row).is_some_and(|v| !v.is_null())
                && r.get(column).is_some_and(|v| !v.is_null())
                && r.get(value).and_then(|v| v.as_finite()).is_some()
        })
        .collect();

    let row_labels = sorted_labels(usable.iter().copied(), row);
    let col_labels = sorted_labels(usable.iter().copied(), column);

    let row_index: HashMap<&str, usize> = row_labels
        .iter()
        .enumerate()
        .map(|(i, l)| (l.as_str(), i))
        .collect();
    let col_index: HashMap<&str, usize> = col_labels
        .iter()
        .enumerate()
        .map(|(i, l)| (l.as_str(), i))
        .collect();

    let mut values = vec![vec![0.0; col_labels.len()]; row_labels.len()];
    for record in usable {
        let (Some(r), Some(c), Some(v)) = (
            record.get(row).map(|v| v.label()),
            record.get(column).map(|v| v.label()),
            record.get(value).and_then(|v| v.as_finite()),
        ) else {
            continue;
        };
        if let (Some(&ri), Some(&ci)) = (row_index.get(r.as_str()), col_index.get(c.as_str())) {
            values[ri][ci] += v;
        }
    }

    HeatmapMatrix {
        row_labels,
        col_labels,
        values,
    }
}
