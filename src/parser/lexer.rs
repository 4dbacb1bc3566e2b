// Shared tokens for the expression grammar

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::{map, recognize},
    multi::many0_count,
    sequence::{delimited, pair},
    IResult,
};

/// Wrap a parser so it skips surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Column identifier: letter or underscore, then letters, digits, `_` or `.`
pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0_count(alt((alphanumeric1, tag("_"), tag(".")))),
        )),
        |s: &str| s.to_string(),
    )(input)
}

/// Quoted string, double or single quotes, no escapes
pub fn string_literal(input: &str) -> IResult<&str, String> {
    alt((
        map(
            delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
            |s: &str| s.to_string(),
        ),
        map(
            delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
            |s: &str| s.to_string(),
        ),
    ))(input)
}

/// Column name, bare or quoted (for names with spaces)
pub fn column_name(input: &str) -> IResult<&str, String> {
    alt((string_literal, identifier))(input)
}

/// Run of non-whitespace characters
pub fn bare_token(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace())(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("sepal_length >"), Ok((" >", "sepal_length".to_string())));
        assert_eq!(identifier("x.y"), Ok(("", "x.y".to_string())));
        assert!(identifier("9lives").is_err());
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(string_literal(r#""New York" rest"#), Ok((" rest", "New York".to_string())));
        assert_eq!(string_literal("'a b'"), Ok(("", "a b".to_string())));
        assert!(string_literal("\"unclosed").is_err());
    }

    #[test]
    fn test_ws() {
        let mut p = ws(identifier);
        assert_eq!(p("   name  "), Ok(("", "name".to_string())));
    }
}
