//! The module with the chart based CFG parser.
//! The parser fills a bottom-up chart over the token sequence and keeps every
//! derivation, so ambiguous grammars yield all of their parse trees.

use log::trace;

use crate::internal::Chart;
use crate::{Grammar, ParseTree, Symbol, Token};

/// A best-effort description of why a parse failed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseDiagnostic {
    /// The token index where matching the start symbol's productions failed.
    pub position: usize,
    /// The grammar symbol that was expected at the failure position.
    pub expected: String,
    /// The token found at the failure position, if any.
    pub found: Option<String>,
    /// The length of the longest input prefix derivable from the start symbol.
    pub derivable_prefix: usize,
}

impl std::fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.found {
            Some(found) => write!(
                f,
                "expected {} at token {}, found {}",
                self.expected, self.position, found
            ),
            None => write!(
                f,
                "expected {} at token {}, found end of input",
                self.expected, self.position
            ),
        }
    }
}

/// The result of a chart parse.
/// A reject is not an error; it is an ordinary result with `accepted == false` and a
/// best-effort diagnostic.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CfgParse {
    /// True if the start symbol derives the whole input.
    pub accepted: bool,
    /// The parse trees of the input. Multiple trees signal an ambiguous parse.
    pub trees: Vec<ParseTree>,
    /// Set on rejection, best-effort.
    pub diagnostic: Option<ParseDiagnostic>,
}

/// A chart parser for a context-free grammar.
#[derive(Debug, Clone)]
pub struct ChartParser {
    grammar: Grammar,
}

impl ChartParser {
    /// Create a parser for the given grammar.
    pub fn new(grammar: &Grammar) -> Self {
        ChartParser {
            grammar: grammar.clone(),
        }
    }

    /// The grammar of the parser.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Parse a token sequence.
    ///
    /// The chart is filled by increasing span length; a cell holds every derivation of
    /// its span, so ambiguity survives the parse and all distinct trees are returned.
    pub fn parse(&self, tokens: &[Token]) -> CfgParse {
        let chart = Chart::fill(&self.grammar, tokens);
        let start_symbol = self.grammar.start_symbol();
        if chart.accepts(start_symbol) {
            let trees = chart.parse_trees(start_symbol, tokens);
            trace!(
                "Accepted {} token(s) with {} parse tree(s)",
                tokens.len(),
                trees.len()
            );
            CfgParse {
                accepted: true,
                trees,
                diagnostic: None,
            }
        } else {
            let diagnostic = self.diagnose(&chart, tokens);
            trace!("Rejected {} token(s): {}", tokens.len(), diagnostic);
            CfgParse {
                accepted: false,
                trees: Vec::new(),
                diagnostic: Some(diagnostic),
            }
        }
    }

    // Match the start symbol's productions against the input greedily and report the
    // rightmost failure. This is a heuristic; the chart itself is the authority on
    // acceptance.
    fn diagnose(&self, chart: &Chart, tokens: &[Token]) -> ParseDiagnostic {
        let start_symbol = self.grammar.start_symbol();
        let mut best: Option<ParseDiagnostic> = None;
        for (_, production) in self.grammar.productions_for(start_symbol) {
            let mut position = 0;
            let mut failure = None;
            for symbol in &production.rhs {
                match symbol {
                    Symbol::Terminal(kind) => {
                        if tokens.get(position).is_some_and(|t| t.kind == *kind) {
                            position += 1;
                        } else {
                            failure = Some((position, format!("'{}'", kind)));
                            break;
                        }
                    }
                    Symbol::NonTerminal(nt) => {
                        let matched = (1..=tokens.len().saturating_sub(position))
                            .rev()
                            .find(|len| chart.derives(nt, position, *len));
                        match matched {
                            Some(len) => position += len,
                            None => {
                                failure = Some((position, nt.clone()));
                                break;
                            }
                        }
                    }
                }
            }
            let (failure_position, expected) = match failure {
                Some(failure) => failure,
                None => {
                    // Every RHS symbol matched but the whole input was not covered.
                    (position, "end of input".to_string())
                }
            };
            let diagnostic = ParseDiagnostic {
                position: failure_position,
                expected,
                found: tokens.get(failure_position).map(|t| t.to_string()),
                derivable_prefix: chart.longest_prefix(start_symbol),
            };
            if best
                .as_ref()
                .is_none_or(|b| diagnostic.position > b.position)
            {
                best = Some(diagnostic);
            }
        }
        best.unwrap_or(ParseDiagnostic {
            position: 0,
            expected: start_symbol.to_string(),
            found: tokens.first().map(|t| t.to_string()),
            derivable_prefix: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Grammar, Production, Symbol};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn request_line_grammar() -> Grammar {
        Grammar::define(
            "RequestLine",
            vec![
                Production::new(
                    "RequestLine",
                    vec![
                        Symbol::nt("Method"),
                        Symbol::t("SP"),
                        Symbol::nt("Uri"),
                        Symbol::t("SP"),
                        Symbol::nt("Version"),
                    ],
                ),
                Production::new("Method", vec![Symbol::t("METHOD")]),
                Production::new("Uri", vec![Symbol::t("URI")]),
                Production::new("Version", vec![Symbol::t("HTTP_VERSION")]),
            ],
        )
        .unwrap()
    }

    fn request_line_tokens() -> Vec<Token> {
        vec![
            Token::new("METHOD", "GET", 0),
            Token::new("SP", " ", 3),
            Token::new("URI", "/index.html", 4),
            Token::new("SP", " ", 15),
            Token::new("HTTP_VERSION", "HTTP/1.1", 16),
        ]
    }

    #[test]
    fn test_parse_valid_request_line() {
        init();
        let parser = ChartParser::new(&request_line_grammar());
        let parse = parser.parse(&request_line_tokens());
        assert!(parse.accepted);
        assert_eq!(parse.trees.len(), 1);
        assert!(parse.diagnostic.is_none());
        assert_eq!(
            parse.trees[0].leaves().concat(),
            "GET /index.html HTTP/1.1"
        );
    }

    #[test]
    fn test_parse_rejects_truncated_input() {
        init();
        let parser = ChartParser::new(&request_line_grammar());
        let tokens = request_line_tokens()[..3].to_vec();
        let parse = parser.parse(&tokens);
        assert!(!parse.accepted);
        assert!(parse.trees.is_empty());
        let diagnostic = parse.diagnostic.unwrap();
        // METHOD, SP and URI match, then the second SP is missing.
        assert_eq!(diagnostic.position, 3);
        assert_eq!(diagnostic.expected, "'SP'");
        assert!(diagnostic.found.is_none());
    }

    #[test]
    fn test_parse_reports_wrong_token() {
        init();
        let parser = ChartParser::new(&request_line_grammar());
        let mut tokens = request_line_tokens();
        tokens[4] = Token::new("URI", "/again", 16);
        let parse = parser.parse(&tokens);
        assert!(!parse.accepted);
        let diagnostic = parse.diagnostic.unwrap();
        assert_eq!(diagnostic.position, 4);
        assert_eq!(diagnostic.expected, "Version");
        assert!(diagnostic.found.unwrap().contains("URI"));
    }

    #[test]
    fn test_parse_empty_input() {
        init();
        let parser = ChartParser::new(&request_line_grammar());
        let parse = parser.parse(&[]);
        assert!(!parse.accepted);
        assert!(parse.diagnostic.is_some());
    }

    #[test]
    fn test_ambiguous_parse_returns_all_trees() {
        init();
        let grammar = Grammar::define(
            "E",
            vec![
                Production::new(
                    "E",
                    vec![Symbol::nt("E"), Symbol::t("PLUS"), Symbol::nt("E")],
                ),
                Production::new("E", vec![Symbol::t("A")]),
            ],
        )
        .unwrap();
        let parser = ChartParser::new(&grammar);
        let tokens = vec![
            Token::new("A", "a", 0),
            Token::new("PLUS", "+", 1),
            Token::new("A", "a", 2),
            Token::new("PLUS", "+", 3),
            Token::new("A", "a", 4),
        ];
        let parse = parser.parse(&tokens);
        assert!(parse.accepted);
        assert_eq!(parse.trees.len(), 2);
    }
}
