use crate::data::{Record, Value};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// Statistic used to reduce each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AggregationMethod {
    Sum,
    #[default]
    Average,
    Median,
    Min,
    Max,
}

impl AggregationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationMethod::Sum => "sum",
            AggregationMethod::Average => "average",
            AggregationMethod::Median => "median",
            AggregationMethod::Min => "min",
            AggregationMethod::Max => "max",
        }
    }

    /// Parse a method name. Unrecognized names fall back to average.
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "sum" => AggregationMethod::Sum,
            "average" | "avg" | "mean" => AggregationMethod::Average,
            "median" => AggregationMethod::Median,
            "min" => AggregationMethod::Min,
            "max" => AggregationMethod::Max,
            other => {
                warn!("Unknown aggregation method '{}', using average", other);
                AggregationMethod::Average
            }
        }
    }

    /// Reduce a non-empty group of values.
    fn reduce(&self, values: &mut [f64]) -> f64 {
        let n = values.len() as f64;
        match self {
            AggregationMethod::Sum => values.iter().sum(),
            AggregationMethod::Average => values.iter().sum::<f64>() / n,
            AggregationMethod::Median => {
                values.sort_by(|a, b| a.total_cmp(b));
                let mid = values.len() / 2;
                if values.len() % 2 == 0 {
                    (values[mid - 1] + values[mid]) / 2.0
                } else {
                    values[mid]
                }
            }
            AggregationMethod::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            AggregationMethod::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

impl From<String> for AggregationMethod {
    fn from(s: String) -> Self {
        AggregationMethod::parse_lenient(&s)
    }
}

impl From<AggregationMethod> for String {
    fn from(m: AggregationMethod) -> Self {
        m.as_str().to_string()
    }
}

impl fmt::Display for AggregationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of an aggregation group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Number(f64),
    Text(String),
}

impl GroupKey {
    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Null => None,
            Value::Number(n) => Some(GroupKey::Number(*n)),
            Value::Text(s) => Some(GroupKey::Text(s.clone())),
            Value::Bool(b) => Some(GroupKey::Text(b.to_string())),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            GroupKey::Number(n) => Value::Number(*n),
            GroupKey::Text(s) => Value::Text(s.clone()),
        }
    }

    /// Numbers compare numerically and text lexically. Numeric keys sort
    /// before text keys.
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (GroupKey::Number(a), GroupKey::Number(b)) => a.total_cmp(b),
            (GroupKey::Text(a), GroupKey::Text(b)) => a.cmp(b),
            (GroupKey::Number(_), GroupKey::Text(_)) => Ordering::Less,
            (GroupKey::Text(_), GroupKey::Number(_)) => Ordering::Greater,
        }
    }
}

#[derive(Hash, PartialEq, Eq)]
enum GroupId {
    Number(u64),
    Text(String),
}

impl From<&GroupKey> for GroupId {
    fn from(key: &GroupKey) -> Self {
        match key {
            // fold -0.0 into 0.0
            GroupKey::Number(n) => GroupId::Number((n + 0.0).to_bits()),
            GroupKey::Text(s) => GroupId::Text(s.clone()),
        }
    }
}

/// One reduced group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub group: GroupKey,
    pub value: f64,
}

/// Group `records` by `group_by` and reduce `value` in each group.
///
/// Records missing either column, or whose value is not a finite number, are
/// skipped. Output is sorted ascending by group key.
pub fn aggregate(
    records: &[Record],
    group_by: &str,
    value: &str,
    method: AggregationMethod,
) -> Vec<AggregateRow> {
    let mut index: HashMap<GroupId, usize> = HashMap::new();
    let mut groups: Vec<(GroupKey, Vec<f64>)> = Vec::new();
    let mut skipped = 0usize;

    for record in records {
        let key = record.get(group_by).and_then(GroupKey::from_value);
        let v = record.get(value).and_then(|v| v.as_finite());
        let (Some(key), Some(v)) = (key, v) else {
            skipped += 1;
            continue;
        };
        let slot = *index.entry(GroupId::from(&key)).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(v);
    }

    debug!(
        "Aggregated {} by '{}': {} groups, {} records skipped",
        value,
        group_by,
        groups.len(),
        skipped
    );

    let mut rows: Vec<AggregateRow> = groups
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(group, mut values)| AggregateRow {
            value: method.reduce(&mut values),
            group,
        })
        .collect();
    rows.sort_by(|a, b| a.group.compare(&b.group));
    rows
}

/// Turn aggregate rows back into records `{group_by: group, value: value}`
/// so later stages can treat them like any other dataset.
pub fn aggregate_records(rows: &[AggregateRow], group_by: &str, value: &str) -> Vec<Record> {
    rows.iter()
        .map(|row| {
            let mut record = Record::new();
            record.insert(group_by.to_string(), row.group.to_value());
            record.insert(value.to_string(), Value::Number(row.value));
            record
        })
        .collect()
}
