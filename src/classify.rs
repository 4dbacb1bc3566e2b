use crate::data::{FeatureType, Record, Value};
use crate::error::{Result, VizError};

/// Return the features that hold numeric values, in declaration order.
///
/// A feature declared `number` is always numeric. A feature declared `enum`
/// is numeric only when every record carries a number for it. Other declared
/// types never are.
pub fn numeric_features(
    records: &[Record],
    features: &[String],
    types: &[FeatureType],
) -> Result<Vec<String>> {
    if features.len() != types.len() {
        return Err(VizError::TypeConfiguration {
            features: features.len(),
            types: types.len(),
        });
    }

    Ok(features
        .iter()
        .zip(types)
        .filter(|(name, ty)| match ty {
            FeatureType::Number => true,
            FeatureType::Enum => records
                .iter()
                .all(|r| matches!(r.get(name.as_str()), Some(Value::Number(_)))),
            FeatureType::Other(_) => false,
        })
        .map(|(name, _)| name.clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::record;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_number_and_numeric_enum() {
        let records = vec![
            record([("a", Value::from(1.0)), ("b", Value::from(2.0)), ("c", Value::from("x"))]),
            record([("a", Value::from(3.0)), ("b", Value::from(4.0)), ("c", Value::from("y"))]),
        ];
        let types = vec![FeatureType::Number, FeatureType::Enum, FeatureType::Enum];
        let numeric = numeric_features(&records, &names(&["a", "b", "c"]), &types).unwrap();
        assert_eq!(numeric, names(&["a", "b"]));
    }

    #[test]
    fn test_enum_with_one_text_value_is_not_numeric() {
        let records = vec![
            record([("level", Value::from(1.0))]),
            record([("level", Value::from("high"))]),
        ];
        let numeric =
            numeric_features(&records, &names(&["level"]), &[FeatureType::Enum]).unwrap();
        assert!(numeric.is_empty());
    }

    #[test]
    fn test_enum_with_missing_value_is_not_numeric() {
        let records = vec![record([("level", Value::from(1.0))]), record::<&str, Value, _>([])];
        let numeric =
            numeric_features(&records, &names(&["level"]), &[FeatureType::Enum]).unwrap();
        assert!(numeric.is_empty());
    }

    #[test]
    fn test_other_types_excluded() {
        let records = vec![record([("id", Value::from(1.0))])];
        let numeric =
            numeric_features(&records, &names(&["id"]), &[FeatureType::from("string")]).unwrap();
        assert!(numeric.is_empty());
    }

    #[test]
    fn test_length_mismatch() {
        let err = numeric_features(&[], &names(&["a", "b"]), &[FeatureType::Number]).unwrap_err();
        assert!(matches!(err, VizError::TypeConfiguration { features: 2, types: 1 }));
    }
}
