//! This module contains the chart used by the bottom-up CFG parser.
//! The chart is filled by increasing span length; a cell holds every derivation of its
//! span. Ambiguity is kept in the chart and only unfolded into parse trees on demand.

use log::trace;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{Grammar, ParseTree, Symbol, Token};

/// The maximum number of parse trees that are unfolded from an ambiguous chart.
/// The chart itself always holds every derivation.
pub(crate) const MAX_PARSE_TREES: usize = 32;

/// One way to derive a span from a production.
/// The parts reference sub-spans by (non-terminal, start, length) instead of concrete
/// sub-derivations, so an ambiguous sub-span does not multiply the derivations of its
/// parents inside the chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Derivation {
    /// The derived non-terminal.
    pub(crate) nt: String,
    /// The index of the applied production in the grammar.
    pub(crate) production: usize,
    /// The matched right-hand side, one part per RHS symbol.
    pub(crate) parts: Vec<Part>,
}

/// A matched right-hand side symbol of a derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Part {
    /// A terminal that matched the token at the given input index.
    Token(usize),
    /// A non-terminal that derives the given sub-span.
    Span {
        nt: String,
        start: usize,
        len: usize,
    },
}

/// The chart of a single parse run.
#[derive(Debug, Default)]
pub(crate) struct Chart {
    // Cells keyed by (start, len).
    cells: FxHashMap<(usize, usize), Vec<Derivation>>,
    input_len: usize,
}

impl Chart {
    /// Fill the chart bottom-up for the given token sequence.
    pub(crate) fn fill(grammar: &Grammar, tokens: &[Token]) -> Self {
        let n = tokens.len();
        let mut chart = Chart {
            cells: FxHashMap::default(),
            input_len: n,
        };
        for len in 1..=n {
            for start in 0..=n - len {
                chart.fill_cell(grammar, tokens, start, len);
            }
        }
        trace!(
            "Chart for {} token(s): {} non-empty cell(s)",
            n,
            chart.cells.len()
        );
        chart
    }

    /// Fill a single cell to a fixed point.
    /// The loop is needed because unit productions can derive a span from another
    /// derivation of the very same cell.
    fn fill_cell(&mut self, grammar: &Grammar, tokens: &[Token], start: usize, len: usize) {
        let mut changed = true;
        while changed {
            changed = false;
            for (production_index, production) in grammar.productions().iter().enumerate() {
                for parts in self.match_sequence(&production.rhs, tokens, start, len) {
                    let derivation = Derivation {
                        nt: production.lhs.clone(),
                        production: production_index,
                        parts,
                    };
                    let cell = self.cells.entry((start, len)).or_default();
                    if !cell.contains(&derivation) {
                        trace!(
                            "Chart [{}, {}): add {} (production {})",
                            start,
                            start + len,
                            derivation.nt,
                            production_index
                        );
                        cell.push(derivation);
                        changed = true;
                    }
                }
            }
        }
    }

    /// Enumerate every way the symbol sequence can cover `tokens[start..start + len]`.
    /// Terminals consume exactly one token; non-terminals consume any sub-span already
    /// derived in the chart.
    fn match_sequence(
        &self,
        symbols: &[Symbol],
        tokens: &[Token],
        start: usize,
        len: usize,
    ) -> Vec<Vec<Part>> {
        let Some((first, rest)) = symbols.split_first() else {
            return if len == 0 { vec![Vec::new()] } else { Vec::new() };
        };
        let mut matches = Vec::new();
        match first {
            Symbol::Terminal(kind) => {
                if len >= 1 && tokens[start].kind == *kind {
                    for mut tail in self.match_sequence(rest, tokens, start + 1, len - 1) {
                        tail.insert(0, Part::Token(start));
                        matches.push(tail);
                    }
                }
            }
            Symbol::NonTerminal(nt) => {
                for sub_len in 1..=len {
                    if !self.derives(nt, start, sub_len) {
                        continue;
                    }
                    for mut tail in self.match_sequence(rest, tokens, start + sub_len, len - sub_len)
                    {
                        tail.insert(
                            0,
                            Part::Span {
                                nt: nt.clone(),
                                start,
                                len: sub_len,
                            },
                        );
                        matches.push(tail);
                    }
                }
            }
        }
        matches
    }

    /// True if the chart contains a derivation of the non-terminal for the span.
    pub(crate) fn derives(&self, nt: &str, start: usize, len: usize) -> bool {
        self.cells
            .get(&(start, len))
            .is_some_and(|cell| cell.iter().any(|d| d.nt == nt))
    }

    /// The derivations of the non-terminal covering the span.
    pub(crate) fn derivations(&self, nt: &str, start: usize, len: usize) -> Vec<&Derivation> {
        self.cells
            .get(&(start, len))
            .map(|cell| cell.iter().filter(|d| d.nt == nt).collect())
            .unwrap_or_default()
    }

    /// True if the start symbol derives the whole input.
    pub(crate) fn accepts(&self, start_symbol: &str) -> bool {
        self.input_len > 0 && self.derives(start_symbol, 0, self.input_len)
    }

    /// The length of the longest input prefix derivable from the start symbol.
    pub(crate) fn longest_prefix(&self, start_symbol: &str) -> usize {
        (1..=self.input_len)
            .rev()
            .find(|len| self.derives(start_symbol, 0, *len))
            .unwrap_or(0)
    }

    /// Unfold the parse trees of the start symbol covering the whole input.
    /// Ambiguity is unfolded by taking the cross product of the sub-span alternatives;
    /// the result is capped at [MAX_PARSE_TREES]. Cyclic unit derivations are cut off
    /// with a visiting set.
    pub(crate) fn parse_trees(&self, start_symbol: &str, tokens: &[Token]) -> Vec<ParseTree> {
        if self.input_len == 0 {
            return Vec::new();
        }
        let mut visiting = FxHashSet::default();
        let mut trees = Vec::new();
        for derivation in self.derivations(start_symbol, 0, self.input_len) {
            trees.extend(self.expand(derivation, tokens, &mut visiting));
            if trees.len() >= MAX_PARSE_TREES {
                trees.truncate(MAX_PARSE_TREES);
                break;
            }
        }
        trees
    }

    fn expand(
        &self,
        derivation: &Derivation,
        tokens: &[Token],
        visiting: &mut FxHashSet<(String, usize, usize)>,
    ) -> Vec<ParseTree> {
        // One list of alternatives per RHS part; the trees are their cross product.
        let mut part_alternatives: Vec<Vec<ParseTree>> = Vec::with_capacity(derivation.parts.len());
        for part in &derivation.parts {
            let alternatives = match part {
                Part::Token(index) => {
                    let token = &tokens[*index];
                    vec![ParseTree::leaf(token.kind.clone(), token.text.clone())]
                }
                Part::Span { nt, start, len } => {
                    let key = (nt.clone(), *start, *len);
                    if visiting.contains(&key) {
                        // A cyclic unit derivation, already being expanded further up.
                        return Vec::new();
                    }
                    visiting.insert(key.clone());
                    let mut span_trees = Vec::new();
                    for sub_derivation in self.derivations(nt, *start, *len) {
                        span_trees.extend(self.expand(sub_derivation, tokens, visiting));
                        if span_trees.len() >= MAX_PARSE_TREES {
                            span_trees.truncate(MAX_PARSE_TREES);
                            break;
                        }
                    }
                    visiting.remove(&key);
                    span_trees
                }
            };
            if alternatives.is_empty() {
                return Vec::new();
            }
            part_alternatives.push(alternatives);
        }

        let mut trees: Vec<Vec<ParseTree>> = vec![Vec::new()];
        for alternatives in part_alternatives {
            let mut next = Vec::new();
            for children in &trees {
                for alternative in &alternatives {
                    let mut extended = children.clone();
                    extended.push(alternative.clone());
                    next.push(extended);
                    if next.len() >= MAX_PARSE_TREES {
                        break;
                    }
                }
                if next.len() >= MAX_PARSE_TREES {
                    break;
                }
            }
            trees = next;
        }
        trees
            .into_iter()
            .map(|children| ParseTree::node(derivation.nt.clone(), derivation.production, children))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Grammar, Production, Symbol};

    fn token(kind: &str, text: &str, position: usize) -> Token {
        Token::new(kind, text, position)
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
            token("METHOD", "GET", 0),
            token("SP", " ", 3),
            token("URI", "/index.html", 4),
            token("SP", " ", 15),
            token("HTTP_VERSION", "HTTP/1.1", 16),
        ]
    }

    #[test]
    fn test_chart_accepts_request_line() {
        let grammar = request_line_grammar();
        let tokens = request_line_tokens();
        let chart = Chart::fill(&grammar, &tokens);
        assert!(chart.accepts("RequestLine"));
    }

    #[test]
    fn test_chart_rejects_missing_version() {
        let grammar = request_line_grammar();
        let tokens = request_line_tokens()[..3].to_vec();
        let chart = Chart::fill(&grammar, &tokens);
        assert!(!chart.accepts("RequestLine"));
        // "METHOD SP URI" has no derivable RequestLine prefix because the production
        // requires the full five symbols.
        assert_eq!(chart.longest_prefix("RequestLine"), 0);
    }

    #[test]
    fn test_parse_tree_leaves_reproduce_input() {
        let grammar = request_line_grammar();
        let tokens = request_line_tokens();
        let chart = Chart::fill(&grammar, &tokens);
        let trees = chart.parse_trees("RequestLine", &tokens);
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].leaves().concat(), "GET /index.html HTTP/1.1");
    }

    #[test]
    fn test_ambiguous_grammar_yields_multiple_trees() {
        // E → E '+' E | 'a' is ambiguous for "a + a + a".
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
        let tokens = vec![
            token("A", "a", 0),
            token("PLUS", "+", 1),
            token("A", "a", 2),
            token("PLUS", "+", 3),
            token("A", "a", 4),
        ];
        let chart = Chart::fill(&grammar, &tokens);
        assert!(chart.accepts("E"));
        let trees = chart.parse_trees("E", &tokens);
        assert_eq!(trees.len(), 2);
        for tree in &trees {
            assert_eq!(tree.leaves().concat(), "a+a+a");
        }
    }

    #[test]
    fn test_unit_production_chain() {
        // S → A, A → B, B → 'x'.
        let grammar = Grammar::define(
            "S",
            vec![
                Production::new("S", vec![Symbol::nt("A")]),
                Production::new("A", vec![Symbol::nt("B")]),
                Production::new("B", vec![Symbol::t("X")]),
            ],
        )
        .unwrap();
        let tokens = vec![token("X", "x", 0)];
        let chart = Chart::fill(&grammar, &tokens);
        assert!(chart.accepts("S"));
        let trees = chart.parse_trees("S", &tokens);
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].leaves(), vec!["x"]);
    }

    #[test]
    fn test_cyclic_unit_productions_terminate() {
        // S → A, A → S | 'x'. The cycle S ⇒ A ⇒ S must not loop forever.
        let grammar = Grammar::define(
            "S",
            vec![
                Production::new("S", vec![Symbol::nt("A")]),
                Production::new("A", vec![Symbol::nt("S")]),
                Production::new("A", vec![Symbol::t("X")]),
            ],
        )
        .unwrap();
        let tokens = vec![token("X", "x", 0)];
        let chart = Chart::fill(&grammar, &tokens);
        assert!(chart.accepts("S"));
        let trees = chart.parse_trees("S", &tokens);
        assert!(!trees.is_empty());
        assert!(trees.len() <= MAX_PARSE_TREES);
    }

    #[test]
    fn test_longest_prefix_of_partial_input() {
        // S → 'a' 'b', and input "a b c": the longest derivable prefix is "a b".
        let grammar = Grammar::define(
            "S",
            vec![Production::new("S", vec![Symbol::t("A"), Symbol::t("B")])],
        )
        .unwrap();
        let tokens = vec![token("A", "a", 0), token("B", "b", 1), token("C", "c", 2)];
        let chart = Chart::fill(&grammar, &tokens);
        assert!(!chart.accepts("S"));
        assert_eq!(chart.longest_prefix("S"), 2);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let grammar = request_line_grammar();
        let chart = Chart::fill(&grammar, &[]);
        assert!(!chart.accepts("RequestLine"));
        assert!(chart.parse_trees("RequestLine", &[]).is_empty());
    }
}
