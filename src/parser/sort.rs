// Sort expression parser
// Format: <column>, <column>:desc, or <column> asc

use super::lexer::{column_name, ws};
use crate::sort::{SortDirection, SortSpec};
use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::char,
    combinator::{map, opt, value},
    sequence::{pair, preceded},
    IResult,
};

fn direction(input: &str) -> IResult<&str, SortDirection> {
    alt((
        value(SortDirection::Desc, tag_no_case("desc")),
        value(SortDirection::Asc, tag_no_case("asc")),
    ))(input)
}

pub fn parse_sort_expr(input: &str) -> IResult<&str, SortSpec> {
    map(
        pair(
            ws(column_name),
            opt(preceded(opt(ws(char(':'))), ws(direction))),
        ),
        |(column, dir)| SortSpec::new(column, dir.unwrap_or_default()),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_only() {
        let (_, spec) = parse_sort_expr("price").unwrap();
        assert_eq!(spec, SortSpec::new("price", SortDirection::Asc));
    }

    #[test]
    fn test_colon_direction() {
        let (_, spec) = parse_sort_expr("price:desc").unwrap();
        assert_eq!(spec.direction, SortDirection::Desc);
    }

    #[test]
    fn test_space_direction() {
        let (rest, spec) = parse_sort_expr("price DESC").unwrap();
        assert_eq!(rest, "");
        assert_eq!(spec.direction, SortDirection::Desc);
    }

    #[test]
    fn test_bad_direction_left_over() {
        let (rest, _) = parse_sort_expr("price:sideways").unwrap();
        assert_eq!(rest, ":sideways");
    }
}
