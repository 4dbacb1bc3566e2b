use crate::csv_reader::CsvData;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    /// The number held by this value, without coercion.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The number held by this value if it is finite.
    pub fn as_finite(&self) -> Option<f64> {
        self.as_number().filter(|n| n.is_finite())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric coercion used by comparisons: text is parsed after trimming
    /// (empty text is 0), booleans are 0/1, null is NaN.
    pub fn coerce_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Text(s) => coerce_text(s),
            Value::Null => f64::NAN,
        }
    }

    /// Text form used for labels and table cells.
    pub fn label(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Text(s) => s.clone(),
        }
    }

    /// Parse a raw CSV cell.
    pub fn from_cell(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return Value::Number(n);
            }
        }
        match trimmed {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::Text(trimmed.to_string()),
        }
    }
}

pub(crate) fn coerce_text(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// One row of the dataset. A missing key means the value is absent.
pub type Record = BTreeMap<String, Value>;

/// Declared type of a feature, as annotated by the upstream tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FeatureType {
    Number,
    Enum,
    Other(String),
}

impl FeatureType {
    pub fn as_str(&self) -> &str {
        match self {
            FeatureType::Number => "number",
            FeatureType::Enum => "enum",
            FeatureType::Other(s) => s,
        }
    }
}

impl From<String> for FeatureType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "number" => FeatureType::Number,
            "enum" => FeatureType::Enum,
            _ => FeatureType::Other(s),
        }
    }
}

impl From<&str> for FeatureType {
    fn from(s: &str) -> Self {
        FeatureType::from(s.to_string())
    }
}

impl From<FeatureType> for String {
    fn from(t: FeatureType) -> Self {
        t.as_str().to_string()
    }
}

/// A dataset as supplied by the host application: records plus the
/// feature list, the parallel type annotations, and optional enumerations.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dataset {
    pub records: Vec<Record>,
    pub features: Vec<String>,
    pub types: Vec<FeatureType>,
    pub enumerations: BTreeMap<String, Vec<Value>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DatasetDocument {
    Annotated {
        data: Vec<Record>,
        #[serde(default)]
        features: Vec<String>,
        #[serde(default)]
        types: Vec<FeatureType>,
        #[serde(default)]
        enumerations: BTreeMap<String, Vec<Value>>,
    },
    Rows(Vec<Record>),
}

impl Dataset {
    pub fn new(records: Vec<Record>, features: Vec<String>, types: Vec<FeatureType>) -> Self {
        Self {
            records,
            features,
            types,
            enumerations: BTreeMap::new(),
        }
    }

    /// Build a dataset from records alone, taking features from the keys in
    /// first-seen record order and inferring their types. Keys within one
    /// record come in sorted order.
    pub fn from_records(records: Vec<Record>) -> Self {
        let features = collect_features(&records);
        let types = infer_types(&records, &features);
        Self::new(records, features, types)
    }

    pub fn with_enumerations(mut self, enumerations: BTreeMap<String, Vec<Value>>) -> Self {
        self.enumerations = enumerations;
        self
    }

    /// Create a dataset from parsed CSV. Cells are typed with [`Value::from_cell`].
    pub fn from_csv(csv: CsvData) -> Self {
        let records: Vec<Record> = csv
            .rows
            .iter()
            .map(|row| {
                csv.headers
                    .iter()
                    .zip(row.iter())
                    .map(|(h, cell)| (h.clone(), Value::from_cell(cell)))
                    .collect()
            })
            .collect();
        let types = infer_types(&records, &csv.headers);
        Self::new(records, csv.headers, types)
    }

    /// Parse either an annotated document (`{"data": [...], "features": [...],
    /// "types": [...], "enumerations": {...}}`) or a bare array of objects.
    ///
    /// Without a `features` list, features are the row keys in the order the
    /// document first mentions them.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_str(input)?;
        let key_order = json_key_order(&raw);
        let doc: DatasetDocument = serde_json::from_value(raw)?;
        Ok(match doc {
            DatasetDocument::Rows(records) => {
                let types = infer_types(&records, &key_order);
                Self::new(records, key_order, types)
            }
            DatasetDocument::Annotated {
                data,
                features,
                types,
                enumerations,
            } => {
                let features = if features.is_empty() {
                    key_order
                } else {
                    features
                };
                let types = if types.is_empty() {
                    infer_types(&data, &features)
                } else {
                    types
                };
                Self::new(data, features, types).with_enumerations(enumerations)
            }
        })
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_feature(&self, name: &str) -> bool {
        self.features.iter().any(|f| f == name)
    }

    /// Values a form control for `feature` should offer: the declared
    /// enumeration when present, otherwise the distinct values in the data.
    pub fn allowed_values(&self, feature: &str) -> Vec<Value> {
        if let Some(values) = self.enumerations.get(feature) {
            return values.clone();
        }
        let mut seen: Vec<Value> = Vec::new();
        for record in &self.records {
            if let Some(v) = record.get(feature) {
                if !v.is_null() && !seen.contains(v) {
                    seen.push(v.clone());
                }
            }
        }
        seen
    }
}

/// Keys of the row objects in first-seen order. Relies on serde_json's
/// `preserve_order`; a `Record` has already lost the document order.
fn json_key_order(doc: &serde_json::Value) -> Vec<String> {
    let rows = match doc {
        serde_json::Value::Array(rows) => rows,
        serde_json::Value::Object(map) => match map.get("data") {
            Some(serde_json::Value::Array(rows)) => rows,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };
    let mut features: Vec<String> = Vec::new();
    for key in rows.iter().filter_map(|r| r.as_object()).flat_map(|o| o.keys()) {
        if !features.contains(key) {
            features.push(key.clone());
        }
    }
    features
}

fn collect_features(records: &[Record]) -> Vec<String> {
    let mut features: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !features.contains(key) {
                features.push(key.clone());
            }
        }
    }
    features
}

/// A feature is typed `number` when it has at least one value and every
/// non-null value is a number; everything else is `string`.
fn infer_types(records: &[Record], features: &[String]) -> Vec<FeatureType> {
    features
        .iter()
        .map(|f| {
            let mut values = records
                .iter()
                .filter_map(|r| r.get(f))
                .filter(|v| !v.is_null())
                .peekable();
            if values.peek().is_none() {
                return FeatureType::Other("string".to_string());
            }
            if values.all(|v| matches!(v, Value::Number(_))) {
                FeatureType::Number
            } else {
                FeatureType::Other("string".to_string())
            }
        })
        .collect()
}

/// Build a record from `(column, value)` pairs.
pub fn record<K, V, I>(pairs: I) -> Record
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
