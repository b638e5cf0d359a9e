//! This module contains the parser for the regex syntax.
//! The parser is used to parse a pattern into an abstract syntax tree (AST).
//! We use the `regex_syntax` crate to parse the pattern, although we only support a subset of
//! the regex syntax.

use crate::Result;
use log::trace;
use std::time::Instant;

/// Parse the pattern into an abstract syntax tree.
/// The function returns an error if the pattern syntax is invalid.
/// # Arguments
/// * `input` - A string slice that holds the pattern.
/// # Returns
/// An `Ast` that represents the abstract syntax tree of the pattern.
/// # Errors
/// An error is returned if the pattern syntax is invalid.
pub(crate) fn parse_regex_syntax(input: &str) -> Result<regex_syntax::ast::Ast> {
    let now = Instant::now();
    match regex_syntax::ast::parse::Parser::new().parse(input) {
        Ok(syntax_tree) => {
            let elapsed_time = now.elapsed();
            trace!("Parsing took {} milliseconds.", elapsed_time.as_millis());
            Ok(syntax_tree)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_regex_syntax_valid() {
        let input = r"(GET|POST)\d*";
        let ast = parse_regex_syntax(input).unwrap();
        assert!(matches!(ast, regex_syntax::ast::Ast::Concat(_)));
    }

    #[test]
    fn test_parse_regex_syntax_invalid() {
        let input = r"[a-z";
        let result = parse_regex_syntax(input);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_regex_syntax_empty() {
        let input = "";
        let result = parse_regex_syntax(input);
        assert!(result.is_ok());
    }
}
