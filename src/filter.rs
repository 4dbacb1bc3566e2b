use crate::data::{coerce_text, Record, Value};
use crate::error::{Result, VizError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Operator {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
        }
    }
}

impl FromStr for Operator {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "==" => Ok(Operator::Eq),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Le),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Ge),
            other => Err(VizError::UnknownOperator(other.to_string())),
        }
    }
}

impl TryFrom<String> for Operator {
    type Error = VizError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of a filter, as typed by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Number(f64),
    Text(String),
}

impl FilterValue {
    fn coerce_number(&self) -> f64 {
        match self {
            FilterValue::Number(n) => *n,
            FilterValue::Text(s) => coerce_text(s),
        }
    }
}

/// A single column predicate. A list of filters is applied as a conjunction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub operator: Operator,
    pub value: FilterValue,
}

impl Filter {
    pub fn new(column: impl Into<String>, operator: Operator, value: FilterValue) -> Self {
        Self {
            column: column.into(),
            operator,
            value,
        }
    }

    /// Does `record` satisfy this filter? Missing and null values never do.
    pub fn matches(&self, record: &Record) -> bool {
        let cell = match record.get(&self.column) {
            None | Some(Value::Null) => return false,
            Some(v) => v,
        };

        match self.operator {
            Operator::Eq => loose_eq(cell, &self.value),
            op => compare_numeric(op, cell.coerce_number(), self.value.coerce_number()),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            FilterValue::Number(n) => write!(f, "{} {} {}", self.column, self.operator, n),
            FilterValue::Text(s) => write!(f, "{} {} \"{}\"", self.column, self.operator, s),
        }
    }
}

/// Equality where text and numbers meet on numeric ground, so `"5"`
/// typed in a form matches a numeric cell holding 5.
fn loose_eq(cell: &Value, rhs: &FilterValue) -> bool {
    match (cell, rhs) {
        (Value::Text(a), FilterValue::Text(b)) => a == b,
        (Value::Number(a), FilterValue::Number(b)) => a == b,
        (cell, rhs) => {
            let a = cell.coerce_number();
            let b = rhs.coerce_number();
            !a.is_nan() && a == b
        }
    }
}

/// Ordering comparison after numeric coercion. NaN on either side fails.
fn compare_numeric(op: Operator, lhs: f64, rhs: f64) -> bool {
    if lhs.is_nan() || rhs.is_nan() {
        return false;
    }
    match op {
        Operator::Eq => lhs == rhs,
        Operator::Lt => lhs < rhs,
        Operator::Le => lhs <= rhs,
        Operator::Gt => lhs > rhs,
        Operator::Ge => lhs >= rhs,
    }
}

/// Keep the records that satisfy every filter. The input is not modified.
pub fn apply_filters(records: &[Record], filters: &[Filter]) -> Vec<Record> {
    records
        .iter()
        .filter(|r| filters.iter().all(|f| f.matches(r)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::record;

    fn people() -> Vec<Record> {
        vec![
            record([("age", Value::from(25.0)), ("city", Value::from("Oslo"))]),
            record([("age", Value::from(40.0)), ("city", Value::from("Rome"))]),
            record([("age", Value::Null), ("city", Value::from("Oslo"))]),
            record([("age", Value::from("31")), ("city", Value::from("Lima"))]),
        ]
    }

    #[test]
    fn test_operator_parse() {
        assert_eq!("<=".parse::<Operator>().unwrap(), Operator::Le);
        let err = "!=".parse::<Operator>().unwrap_err();
        assert!(matches!(err, VizError::UnknownOperator(ref op) if op == "!="));
    }

    #[test]
    fn test_operator_deserialize_rejects_unknown() {
        let ok: Filter =
            serde_json::from_str(r#"{"column": "age", "operator": ">", "value": 3}"#).unwrap();
        assert_eq!(ok.operator, Operator::Gt);
        let bad = serde_json::from_str::<Filter>(r#"{"column": "age", "operator": "~", "value": 3}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_greater_equal() {
        let f = Filter::new("age", Operator::Ge, FilterValue::Number(31.0));
        let kept = apply_filters(&people(), &[f]);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].get("city"), Some(&Value::from("Rome")));
        assert_eq!(kept[1].get("city"), Some(&Value::from("Lima")));
    }

    #[test]
    fn test_ordering_with_text_value() {
        let f = Filter::new("age", Operator::Lt, FilterValue::Text("30".to_string()));
        let kept = apply_filters(&people(), &[f]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].get("age"), Some(&Value::from(25.0)));
    }

    #[test]
    fn test_ordering_with_nan_value_excludes_all() {
        let f = Filter::new("age", Operator::Gt, FilterValue::Text("old".to_string()));
        assert!(apply_filters(&people(), &[f]).is_empty());
    }

    #[test]
    fn test_loose_equality_text_against_number() {
        let f = Filter::new("age", Operator::Eq, FilterValue::Text("40".to_string()));
        let kept = apply_filters(&people(), &[f]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].get("city"), Some(&Value::from("Rome")));
    }

    #[test]
    fn test_null_is_excluded() {
        let f = Filter::new("city", Operator::Eq, FilterValue::Text("Oslo".to_string()));
        assert_eq!(apply_filters(&people(), &[f.clone()]).len(), 2);
        let g = Filter::new("age", Operator::Lt, FilterValue::Number(1000.0));
        assert_eq!(apply_filters(&people(), &[f, g]).len(), 1);
    }

    #[test]
    fn test_missing_column_is_excluded() {
        let f = Filter::new("height", Operator::Gt, FilterValue::Number(0.0));
        assert!(apply_filters(&people(), &[f]).is_empty());
    }

    #[test]
    fn test_empty_filter_list_is_identity() {
        assert_eq!(apply_filters(&people(), &[]), people());
    }

    #[test]
    fn test_idempotent() {
        let filters = vec![
            Filter::new("age", Operator::Gt, FilterValue::Number(20.0)),
            Filter::new("city", Operator::Eq, FilterValue::Text("Oslo".to_string())),
        ];
        let once = apply_filters(&people(), &filters);
        let twice = apply_filters(&once, &filters);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 1);
    }

    #[test]
    fn test_display() {
        let f = Filter::new("city", Operator::Eq, FilterValue::Text("Oslo".to_string()));
        assert_eq!(f.to_string(), "city == \"Oslo\"");
    }
}
