// Filter expression parser
// Format: <column> <op> <value>, e.g. age >= 30, city == "New York"

use super::lexer::{bare_token, column_name, string_literal, ws};
use crate::filter::FilterValue;
use nom::{
    branch::alt,
    bytes::complete::take_while1,
    combinator::map,
    sequence::tuple,
    IResult,
};

/// Raw filter parts; the operator is checked later so an unknown one can be
/// reported by name.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFilter<'a> {
    pub column: String,
    pub operator: &'a str,
    pub value: FilterValue,
}

fn operator(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| "=<>!~".contains(c))(input)
}

/// Quoted values are always text; bare values are numbers when they parse
/// as a finite number.
fn filter_value(input: &str) -> IResult<&str, FilterValue> {
    alt((
        map(string_literal, FilterValue::Text),
        map(bare_token, |token: &str| match token.parse::<f64>() {
            Ok(n) if n.is_finite() => FilterValue::Number(n),
            _ => FilterValue::Text(token.to_string()),
        }),
    ))(input)
}

pub fn parse_filter_expr(input: &str) -> IResult<&str, RawFilter<'_>> {
    map(
        tuple((ws(column_name), ws(operator), ws(filter_value))),
        |(column, operator, value)| RawFilter {
            column,
            operator,
            value,
        },
    )(input)
}
