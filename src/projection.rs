//! Chart-specific reshaping of the transformed records.
//!
//! Each chart type needs a different structure: x/y pairs for line and
//! scatter, indexed values for bars, a matrix for heatmaps, a flat list for
//! histograms and a header/row grid for tables.

use crate::data::{Dataset, Record, Value};
use crate::error::{Result, VizError};
use crate::heatmap::{build_heatmap, HeatmapMatrix};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder shown in a table for a missing value.
pub const MISSING_CELL: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Bar,
    Scatter,
    Heatmap,
    Histogram,
    Table,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::Scatter => "scatter",
            ChartType::Heatmap => "heatmap",
            ChartType::Histogram => "histogram",
            ChartType::Table => "table",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which columns a chart reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChartSpec {
    Line { x: String, y: String },
    Scatter { x: String, y: String },
    Bar {
        value: String,
        #[serde(default)]
        label: Option<String>,
    },
    Heatmap { row: String, column: String, value: String },
    Histogram { column: String },
    Table {
        #[serde(default)]
        columns: Vec<String>,
    },
}

impl ChartSpec {
    pub fn chart_type(&self) -> ChartType {
        match self {
            ChartSpec::Line { .. } => ChartType::Line,
            ChartSpec::Scatter { .. } => ChartType::Scatter,
            ChartSpec::Bar { .. } => ChartType::Bar,
            ChartSpec::Heatmap { .. } => ChartType::Heatmap,
            ChartSpec::Histogram { .. } => ChartType::Histogram,
            ChartSpec::Table { .. } => ChartType::Table,
        }
    }

    /// Every column the chart reads.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            ChartSpec::Line { x, y } | ChartSpec::Scatter { x, y } => vec![x.as_str(), y.as_str()],
            ChartSpec::Bar { value, label } => {
                let mut cols = vec![value.as_str()];
                cols.extend(label.as_deref());
                cols
            }
            ChartSpec::Heatmap { row, column, value } => {
                vec![row.as_str(), column.as_str(), value.as_str()]
            }
            ChartSpec::Histogram { column } => vec![column.as_str()],
            ChartSpec::Table { columns } => columns.iter().map(|c| c.as_str()).collect(),
        }
    }

    /// Fail with `ColumnNotFound` for the first column the dataset does not
    /// declare.
    pub fn validate(&self, dataset: &Dataset) -> Result<()> {
        match self.columns().into_iter().find(|c| !dataset.has_feature(c)) {
            Some(missing) => Err(VizError::ColumnNotFound(missing.to_string())),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarEntry {
    pub index: usize,
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Data in the exact shape a renderer draws.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum Projection {
    Points(Vec<Point>),
    Bars(Vec<BarEntry>),
    Heatmap(HeatmapMatrix),
    Histogram(Vec<f64>),
    Table(TableData),
}

impl Projection {
    pub fn is_empty(&self) -> bool {
        match self {
            Projection::Points(p) => p.is_empty(),
            Projection::Bars(b) => b.is_empty(),
            Projection::Heatmap(m) => m.is_empty(),
            Projection::Histogram(v) => v.is_empty(),
            Projection::Table(t) => t.rows.is_empty(),
        }
    }
}

/// Numeric (x, y) pairs sorted ascending by x. Records without two finite
/// numbers are dropped.
pub fn project_points(records: &[Record], x: &str, y: &str) -> Vec<Point> {
    let mut points: Vec<Point> = records
        .iter()
        .filter_map(|r| {
            let px = r.get(x)?.as_finite()?;
            let py = r.get(y)?.as_finite()?;
            Some(Point { x: px, y: py })
        })
        .collect();
    points.sort_by(|a, b| a.x.total_cmp(&b.x));
    points
}

/// One bar per record with a finite value, in dataset order. `index` is the
/// record's position; the label comes from `label` or defaults to the index.
pub fn project_bars(records: &[Record], value: &str, label: Option<&str>) -> Vec<BarEntry> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, r)| {
            let v = r.get(value)?.as_finite()?;
            let text = label
                .and_then(|col| r.get(col))
                .filter(|v| !v.is_null())
                .map(|v| v.label())
                .unwrap_or_else(|| index.to_string());
            Some(BarEntry {
                index,
                label: text,
                value: v,
            })
        })
        .collect()
}

/// Finite numeric values of `column`.
pub fn project_histogram(records: &[Record], column: &str) -> Vec<f64> {
    records
        .iter()
        .filter_map(|r| r.get(column).and_then(|v| v.as_finite()))
        .collect()
}

/// Header row plus one text row per record. Missing values become "N/A".
pub fn project_table(records: &[Record], columns: &[String]) -> TableData {
    let rows = records
        .iter()
        .map(|r| {
            columns
                .iter()
                .map(|c| match r.get(c) {
                    None | Some(Value::Null) => MISSING_CELL.to_string(),
                    Some(v) => v.label(),
                })
                .collect()
        })
        .collect();
    TableData {
        headers: columns.to_vec(),
        rows,
    }
}

/// Reshape `records` for `spec`.
///
/// A table with no explicit columns shows `default_columns`.
pub fn project(records: &[Record], spec: &ChartSpec, default_columns: &[String]) -> Projection {
    match spec {
        ChartSpec::Line { x, y } | ChartSpec::Scatter { x, y } => {
            Projection::Points(project_points(records, x, y))
        }
        ChartSpec::Bar { value, label } => {
            Projection::Bars(project_bars(records, value, label.as_deref()))
        }
        ChartSpec::Heatmap { row, column, value } => {
            Projection::Heatmap(build_heatmap(records, row, column, value))
        }
        ChartSpec::Histogram { column } => Projection::Histogram(project_histogram(records, column)),
        ChartSpec::Table { columns } => {
            let columns = if columns.is_empty() {
                default_columns
            } else {
                columns.as_slice()
            };
            Projection::Table(project_table(records, columns))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{record, FeatureType};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_line_sorted_by_x() {
        let data = vec![
            record([("x", 1.0), ("y", 10.0)]),
            record([("x", 3.0), ("y", 5.0)]),
            record([("x", 2.0), ("y", 8.0)]),
        ];
        let spec = ChartSpec::Line { x: "x".to_string(), y: "y".to_string() };
        assert_eq!(
            project(&data, &spec, &[]),
            Projection::Points(vec![
                Point { x: 1.0, y: 10.0 },
                Point { x: 2.0, y: 8.0 },
                Point { x: 3.0, y: 5.0 },
            ])
        );
    }

    #[test]
    fn test_points_skip_non_numeric() {
        let data = vec![
            record([("x", Value::from(1.0)), ("y", Value::from("n/a"))]),
            record([("x", Value::from(2.0)), ("y", Value::from(4.0))]),
            record([("y", Value::from(4.0))]),
        ];
        assert_eq!(project_points(&data, "x", "y"), vec![Point { x: 2.0, y: 4.0 }]);
    }

    #[test]
    fn test_bars_in_dataset_order() {
        let data = vec![
            record([("name", Value::from("b")), ("v", Value::from(2.0))]),
            record([("name", Value::from("a")), ("v", Value::Null)]),
            record([("name", Value::from("c")), ("v", Value::from(1.0))]),
        ];
        assert_eq!(
            project_bars(&data, "v", Some("name")),
            vec![
                BarEntry { index: 0, label: "b".to_string(), value: 2.0 },
                BarEntry { index: 2, label: "c".to_string(), value: 1.0 },
            ]
        );
        assert_eq!(project_bars(&data, "v", None)[1].label, "2");
    }

    #[test]
    fn test_histogram_drops_non_numeric() {
        let data = vec![
            record([("v", Value::from(1.5))]),
            record([("v", Value::from("x"))]),
            record([("v", Value::Null)]),
            record([("v", Value::from(2.5))]),
        ];
        assert_eq!(project_histogram(&data, "v"), vec![1.5, 2.5]);
    }

    #[test]
    fn test_table_missing_placeholder() {
        let data = vec![
            record([("a", Value::from(1.0)), ("b", Value::from("x"))]),
            record([("a", Value::Null)]),
        ];
        let cols = vec!["a".to_string(), "b".to_string()];
        let table = project_table(&data, &cols);
        assert_eq!(table.headers, cols);
        assert_eq!(table.rows, vec![vec!["1", "x"], vec!["N/A", "N/A"]]);
    }

    #[test]
    fn test_table_defaults_to_given_columns() {
        let data = vec![record([("a", 1.0), ("b", 2.0)])];
        let spec = ChartSpec::Table { columns: vec![] };
        let Projection::Table(t) = project(&data, &spec, &["b".to_string()]) else {
            panic!("expected table");
        };
        assert_eq!(t.headers, vec!["b"]);
        assert_eq!(t.rows, vec![vec!["2"]]);
    }

    #[test]
    fn test_validate_unknown_column() {
        let ds = Dataset::new(
            vec![record([("a", 1.0)])],
            vec!["a".to_string()],
            vec![FeatureType::Number],
        );
        let ok = ChartSpec::Histogram { column: "a".to_string() };
        assert!(ok.validate(&ds).is_ok());
        let bad = ChartSpec::Scatter { x: "a".to_string(), y: "b".to_string() };
        assert!(matches!(bad.validate(&ds), Err(VizError::ColumnNotFound(c)) if c == "b"));
    }

    #[test]
    fn test_chart_spec_deserialize() {
        let spec: ChartSpec =
            serde_json::from_str(r#"{"type": "heatmap", "row": "r", "column": "c", "value": "v"}"#)
                .unwrap();
        assert_eq!(spec.chart_type(), ChartType::Heatmap);
        assert_eq!(spec.columns(), vec!["r", "c", "v"]);
    }

    #[test]
    fn test_projection_serializes_with_kind() {
        let json = serde_json::to_string(&Projection::Histogram(vec![1.0])).unwrap();
        assert_eq!(json, r#"{"kind":"histogram","data":[1.0]}"#);
    }
}
