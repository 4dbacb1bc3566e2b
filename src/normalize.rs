use crate::data::{Record, Value};
use tracing::debug;

/// Min–max scale every numeric value in `columns` to `[0, 1]`.
///
/// A column whose minimum equals its maximum is left as is. Non-numeric cells
/// are copied through untouched. Works on a copy of `records`.
pub fn normalize(records: &[Record], columns: &[String]) -> Vec<Record> {
    let mut out = records.to_vec();

    for column in columns {
        let (min, max) = out
            .iter()
            .filter_map(|r| r.get(column).and_then(|v| v.as_finite()))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });

        if !min.is_finite() || min == max {
            debug!("Column '{}' left unscaled (constant or empty)", column);
            continue;
        }

        // halved so `max - min` stays finite for extreme values
        let half_range = max / 2.0 - min / 2.0;
        for record in out.iter_mut() {
            if let Some(Value::Number(v)) = record.get_mut(column) {
                if v.is_finite() {
                    *v = (*v / 2.0 - min / 2.0) / half_range;
                }
            }
        }
    }

    out
}
