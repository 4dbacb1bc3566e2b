// Expression parsers for the command line and config files

pub mod aggregate;
pub mod filter;
pub mod lexer;
pub mod sort;

use crate::aggregate::AggregationMethod;
use crate::error::{Result, VizError};
use crate::filter::{Filter, Operator};
use crate::pipeline::AggregationSpec;
use crate::sort::SortSpec;
use nom::{combinator::eof, sequence::terminated, IResult};

/// Run `parser` over the whole of `input`, trailing whitespace included.
fn parse_complete<'a, O>(
    input: &'a str,
    parser: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> Result<O> {
    match terminated(parser, lexer::ws(eof))(input) {
        Ok((_, output)) => Ok(output),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let reason = if e.input.trim().is_empty() {
                "unexpected end of input".to_string()
            } else {
                format!("unexpected input at '{}'", e.input.trim())
            };
            Err(VizError::InvalidExpression {
                input: input.to_string(),
                reason,
            })
        }
        Err(nom::Err::Incomplete(_)) => Err(VizError::InvalidExpression {
            input: input.to_string(),
            reason: "incomplete expression".to_string(),
        }),
    }
}

/// Parse `<column> <op> <value>`.
///
/// An operator outside `==`, `<`, `<=`, `>`, `>=` is rejected with
/// [`VizError::UnknownOperator`].
pub fn parse_filter(input: &str) -> Result<Filter> {
    let raw = parse_complete(input, filter::parse_filter_expr)?;
    let operator: Operator = raw.operator.parse()?;
    Ok(Filter::new(raw.column, operator, raw.value))
}

/// Parse `<column>[:asc|:desc]`.
pub fn parse_sort(input: &str) -> Result<SortSpec> {
    parse_complete(input, sort::parse_sort_expr)
}

/// Parse `<method>(<value>) by <group>`. Unknown methods become average.
pub fn parse_aggregation(input: &str) -> Result<AggregationSpec> {
    let raw = parse_complete(input, aggregate::parse_aggregation_expr)?;
    Ok(AggregationSpec {
        group_by: raw.group_by,
        value: raw.value,
        method: AggregationMethod::parse_lenient(raw.method),
    })
}
