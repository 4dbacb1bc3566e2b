//! Stage composition: filter → outliers → normalize → aggregate → sort.
//!
//! Every stage is optional and works on its own copy of the records, so the
//! caller's dataset is never modified.

use crate::aggregate::{aggregate, aggregate_records, AggregationMethod};
use crate::classify::numeric_features;
use crate::data::{Dataset, Record};
use crate::error::{Result, VizError};
use crate::filter::{apply_filters, Filter};
use crate::normalize::normalize;
use crate::outliers::remove_outliers;
use crate::sort::{sort_records, SortSpec};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationSpec {
    pub group_by: String,
    pub value: String,
    #[serde(default)]
    pub method: AggregationMethod,
}

/// User-chosen settings for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    pub filters: Vec<Filter>,
    /// IQR multiplier; `None` keeps outliers.
    pub outlier_threshold: Option<f64>,
    pub normalize: bool,
    pub aggregation: Option<AggregationSpec>,
    pub sort: Option<SortSpec>,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub records: Vec<Record>,
    /// Columns present in `records`, in display order.
    pub columns: Vec<String>,
    /// Features the classifier found numeric in the input dataset.
    pub numeric_columns: Vec<String>,
}

pub struct Pipeline {
    params: PipelineParams,
}

impl Pipeline {
    pub fn new(params: PipelineParams) -> Self {
        Self { params }
    }

    /// Run all enabled stages over a copy of `dataset`.
    pub fn run(&self, dataset: &Dataset) -> Result<PipelineOutput> {
        if dataset.is_empty() {
            return Err(VizError::EmptyDataset);
        }

        let numeric = numeric_features(&dataset.records, &dataset.features, &dataset.types)?;
        if numeric.is_empty() {
            return Err(VizError::NoNumericColumns);
        }
        self.validate(dataset)?;
        debug!("Numeric columns: {:?}", numeric);

        let mut records = apply_filters(&dataset.records, &self.params.filters);
        debug!(
            "Filter stage: {} -> {} records ({} filters)",
            dataset.records.len(),
            records.len(),
            self.params.filters.len()
        );

        if let Some(threshold) = self.params.outlier_threshold {
            let before = records.len();
            records = remove_outliers(&records, &numeric, threshold)?;
            debug!("Outlier stage: {} -> {} records", before, records.len());
        }

        if self.params.normalize {
            records = normalize(&records, &numeric);
            debug!("Normalized {} columns", numeric.len());
        }

        let mut columns = dataset.features.clone();
        if let Some(agg) = &self.params.aggregation {
            let rows = aggregate(&records, &agg.group_by, &agg.value, agg.method);
            records = aggregate_records(&rows, &agg.group_by, &agg.value);
            columns = vec![agg.group_by.clone(), agg.value.clone()];
            debug!("Aggregation stage ({}): {} groups", agg.method, records.len());
        }

        if let Some(sort) = &self.params.sort {
            records = sort_records(&records, &sort.column, sort.direction).into_owned();
        }

        info!("Pipeline produced {} records", records.len());
        Ok(PipelineOutput {
            records,
            columns,
            numeric_columns: numeric,
        })
    }

    /// Aggregation and sort columns must name declared features. A sort may
    /// also name one of the aggregation's output columns.
    fn validate(&self, dataset: &Dataset) -> Result<()> {
        if let Some(agg) = &self.params.aggregation {
            for column in [&agg.group_by, &agg.value] {
                if !dataset.has_feature(column) {
                    return Err(VizError::ColumnNotFound(column.clone()));
                }
            }
        }
        if let Some(sort) = &self.params.sort {
            let known = dataset.has_feature(&sort.column)
                || self
                    .params
                    .aggregation
                    .as_ref()
                    .is_some_and(|a| a.group_by == sort.column || a.value == sort.column);
            if !sort.column.is_empty() && !known {
                return Err(VizError::ColumnNotFound(sort.column.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{record, FeatureType, Value};
    use crate::filter::{FilterValue, Operator};
    use crate::sort::SortDirection;
    use pretty_assertions::assert_eq;

    fn sales() -> Dataset {
        let rows = [
            ("north", 10.0, 1.0),
            ("south", 20.0, 2.0),
            ("north", 30.0, 3.0),
            ("east", 40.0, 4.0),
            ("south", 50.0, 5.0),
        ];
        Dataset::new(
            rows.iter()
                .map(|(region, amount, month)| {
                    record([
                        ("region", Value::from(*region)),
                        ("amount", Value::from(*amount)),
                        ("month", Value::from(*month)),
                    ])
                })
                .collect(),
            vec!["region".to_string(), "amount".to_string(), "month".to_string()],
            vec![FeatureType::from("string"), FeatureType::Number, FeatureType::Enum],
        )
    }

    #[test]
    fn test_no_stages_returns_copy() {
        let ds = sales();
        let out = Pipeline::new(PipelineParams::default()).run(&ds).unwrap();
        assert_eq!(out.records, ds.records);
        assert_eq!(out.numeric_columns, vec!["amount", "month"]);
        assert_eq!(out.columns, ds.features);
    }

    #[test]
    fn test_filter_aggregate_sort() {
        let params = PipelineParams {
            filters: vec![Filter::new("amount", Operator::Gt, FilterValue::Number(15.0))],
            aggregation: Some(AggregationSpec {
                group_by: "region".to_string(),
                value: "amount".to_string(),
                method: AggregationMethod::Sum,
            }),
            sort: Some(SortSpec::new("amount", SortDirection::Desc)),
            ..Default::default()
        };
        let out = Pipeline::new(params).run(&sales()).unwrap();
        assert_eq!(
            out.records,
            vec![
                record([("region", Value::from("south")), ("amount", Value::from(70.0))]),
                record([("region", Value::from("east")), ("amount", Value::from(40.0))]),
                record([("region", Value::from("north")), ("amount", Value::from(30.0))]),
            ]
        );
        assert_eq!(out.columns, vec!["region", "amount"]);
    }

    #[test]
    fn test_normalize_uses_numeric_columns() {
        let params = PipelineParams {
            normalize: true,
            ..Default::default()
        };
        let out = Pipeline::new(params).run(&sales()).unwrap();
        assert_eq!(out.records[0]["amount"], Value::from(0.0));
        assert_eq!(out.records[4]["amount"], Value::from(1.0));
        assert_eq!(out.records[2]["month"], Value::from(0.5));
        assert_eq!(out.records[0]["region"], Value::from("north"));
    }

    #[test]
    fn test_outlier_stage() {
        let mut ds = sales();
        ds.records.push(record([
            ("region", Value::from("west")),
            ("amount", Value::from(10_000.0)),
            ("month", Value::from(6.0)),
        ]));
        let params = PipelineParams {
            outlier_threshold: Some(1.5),
            ..Default::default()
        };
        let out = Pipeline::new(params).run(&ds).unwrap();
        assert_eq!(out.records.len(), 5);
        assert!(out.records.iter().all(|r| r["region"] != Value::from("west")));
    }

    #[test]
    fn test_empty_dataset() {
        let ds = Dataset::new(vec![], vec!["a".to_string()], vec![FeatureType::Number]);
        let err = Pipeline::new(PipelineParams::default()).run(&ds).unwrap_err();
        assert!(matches!(err, VizError::EmptyDataset));
    }

    #[test]
    fn test_no_numeric_columns() {
        let ds = Dataset::new(
            vec![record([("name", "x")])],
            vec!["name".to_string()],
            vec![FeatureType::from("string")],
        );
        let err = Pipeline::new(PipelineParams::default()).run(&ds).unwrap_err();
        assert!(matches!(err, VizError::NoNumericColumns));
    }

    #[test]
    fn test_type_list_mismatch() {
        let mut ds = sales();
        ds.types.pop();
        let err = Pipeline::new(PipelineParams::default()).run(&ds).unwrap_err();
        assert!(matches!(err, VizError::TypeConfiguration { features: 3, types: 2 }));
    }

    #[test]
    fn test_unknown_aggregation_column() {
        let params = PipelineParams {
            aggregation: Some(AggregationSpec {
                group_by: "country".to_string(),
                value: "amount".to_string(),
                method: AggregationMethod::Sum,
            }),
            ..Default::default()
        };
        let err = Pipeline::new(params).run(&sales()).unwrap_err();
        assert!(matches!(err, VizError::ColumnNotFound(c) if c == "country"));
    }

    #[test]
    fn test_params_from_json() {
        let params: PipelineParams = serde_json::from_str(
            r#"{
                "filters": [{"column": "amount", "operator": "<=", "value": "30"}],
                "normalize": false,
                "sort": {"column": "month", "direction": "desc"}
            }"#,
        )
        .unwrap();
        let out = Pipeline::new(params).run(&sales()).unwrap();
        let months: Vec<Value> = out.records.iter().map(|r| r["month"].clone()).collect();
        assert_eq!(months, vec![Value::from(3.0), Value::from(2.0), Value::from(1.0)]);
    }
}
