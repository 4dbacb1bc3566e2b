//! Error types for the charting pipeline.
//!
//! Three kinds of failure exist: configuration/data errors that abort a
//! render before anything is drawn, the single opaque rendering failure, and
//! wrapped I/O or decoding errors from loading a dataset. Per-record problems
//! (a missing value, a non-numeric cell) are never errors; the stages drop
//! those records instead.

use serde::ser::SerializeStruct;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VizError {
    /// The dataset has no records.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// Classification found no numeric feature.
    #[error("No numeric columns detected in dataset")]
    NoNumericColumns,

    /// Feature list and type list have different lengths.
    #[error("Feature list has {features} entries but type list has {types}")]
    TypeConfiguration { features: usize, types: usize },

    /// A filter used an operator outside `==`, `<`, `<=`, `>`, `>=`.
    #[error("Unknown filter operator '{0}'")]
    UnknownOperator(String),

    /// A chart or stage referenced a column the dataset does not declare.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// A parameter value is out of range or missing.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A filter, sort, or aggregation expression could not be parsed.
    #[error("Invalid expression '{input}': {reason}")]
    InvalidExpression { input: String, reason: String },

    /// The rendering backend failed. The cause is logged, not carried.
    #[error("Visualization not possible")]
    VisualizationFailed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl VizError {
    /// Stable code for callers that branch on the error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyDataset => "EMPTY_DATASET",
            Self::NoNumericColumns => "NO_NUMERIC_COLUMNS",
            Self::TypeConfiguration { .. } => "TYPE_CONFIGURATION",
            Self::UnknownOperator(_) => "UNKNOWN_OPERATOR",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidParameter(_) => "INVALID_PARAMETER",
            Self::InvalidExpression { .. } => "INVALID_EXPRESSION",
            Self::VisualizationFailed => "VISUALIZATION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Csv(_) => "CSV_ERROR",
        }
    }

    /// Errors the user must fix in the data or the chart settings.
    ///
    /// These are shown as a blocking notification and abort the render.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyDataset
                | Self::NoNumericColumns
                | Self::TypeConfiguration { .. }
                | Self::UnknownOperator(_)
                | Self::ColumnNotFound(_)
                | Self::InvalidParameter(_)
                | Self::InvalidExpression { .. }
        )
    }
}

/// Serialized as `{code, message}` so a host UI can display it directly.
impl Serialize for VizError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("VizError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

pub type Result<T> = std::result::Result<T, VizError>;
