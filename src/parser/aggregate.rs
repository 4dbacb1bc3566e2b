// Aggregation expression parser
// Format: <method>(<value>) by <group>, e.g. sum(amount) by region

use super::lexer::{column_name, ws};
use nom::{
    bytes::complete::tag_no_case,
    character::complete::{alpha1, char, multispace1},
    combinator::map,
    sequence::{delimited, preceded, terminated, tuple},
    IResult,
};

#[derive(Debug, Clone, PartialEq)]
pub struct RawAggregation<'a> {
    pub method: &'a str,
    pub value: String,
    pub group_by: String,
}

pub fn parse_aggregation_expr(input: &str) -> IResult<&str, RawAggregation<'_>> {
    map(
        tuple((
            ws(alpha1),
            delimited(char('('), ws(column_name), char(')')),
            preceded(ws(terminated(tag_no_case("by"), multispace1)), ws(column_name)),
        )),
        |(method, value, group_by)| RawAggregation {
            method,
            value,
            group_by,
        },
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_by_region() {
        let (rest, agg) = parse_aggregation_expr("sum(amount) by region").unwrap();
        assert_eq!(rest, "");
        assert_eq!(agg.method, "sum");
        assert_eq!(agg.value, "amount");
        assert_eq!(agg.group_by, "region");
    }

    #[test]
    fn test_spacing_and_quotes() {
        let (_, agg) = parse_aggregation_expr(r#" median( "unit price" )  BY  'store id' "#).unwrap();
        assert_eq!(agg.method, "median");
        assert_eq!(agg.value, "unit price");
        assert_eq!(agg.group_by, "store id");
    }

    #[test]
    fn test_missing_group() {
        assert!(parse_aggregation_expr("sum(amount)").is_err());
    }

    #[test]
    fn test_by_needs_separator() {
        assert!(parse_aggregation_expr("sum(amount) byregion").is_err());
    }
}
