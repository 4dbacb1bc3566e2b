use crate::data::{Record, Value};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Sort key and direction for the sort stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }
}

/// Type class of a cell: numbers first, then text, then everything else
/// (booleans, nulls, missing). Classes never interleave.
fn class(v: Option<&Value>) -> u8 {
    match v {
        Some(Value::Number(_)) => 0,
        Some(Value::Text(_)) => 1,
        _ => 2,
    }
}

/// Compare two cells in ascending order, with `direction` applied only
/// within a class. Numbers compare numerically and text lexically; cells in
/// the last class compare equal and keep their input order.
fn compare_cells(a: Option<&Value>, b: Option<&Value>, direction: SortDirection) -> Ordering {
    let ord = match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x.total_cmp(y),
        (Some(Value::Text(x)), Some(Value::Text(y))) => x.cmp(y),
        _ => return class(a).cmp(&class(b)),
    };
    match direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}

/// Order `records` by `column`.
///
/// An empty column name or an empty dataset is a no-op that borrows the
/// input instead of copying it.
pub fn sort_records<'a>(
    records: &'a [Record],
    column: &str,
    direction: SortDirection,
) -> Cow<'a, [Record]> {
    if column.is_empty() || records.is_empty() {
        return Cow::Borrowed(records);
    }

    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| compare_cells(a.get(column), b.get(column), direction));
    Cow::Owned(sorted)
}
