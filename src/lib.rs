#![forbid(missing_docs)]
//! # `formalang`
//! The `formalang` crate is a library that provides a formal-language toolkit applied to the
//! grammar of HTTP requests.
//! It compiles regex patterns into NFAs with Thompson's construction, converts them to DFAs by
//! subset construction, minimizes the DFAs and analyzes their structure, parses token sequences
//! with a chart based CFG parser, and recognizes whole HTTP request messages with a pushdown
//! automaton.
//! Every simulation records the full trace of configurations it passes through, so callers can
//! show where and why an input was accepted or rejected.
//! To parse the given regular expressions, the crate uses the `regex-syntax` crate.
//!
//! # Example
//! ```rust
//! use formalang::{compile_pattern, CompiledDfa, ChartParser, http};
//!
//! fn main() -> formalang::Result<()> {
//!     // Recognize a request URI with a regex compiled to an NFA and a minimized DFA.
//!     let nfa = compile_pattern(http::URI_PATTERN)?;
//!     assert!(nfa.simulate("/index.html").accepted);
//!
//!     let dfa = CompiledDfa::from_nfa(&nfa)?.minimize()?;
//!     assert!(dfa.simulate("/index.html").accepted);
//!     assert!(!dfa.simulate("index.html").accepted);
//!
//!     // Parse a whole request line with the CFG chart parser.
//!     let parser = ChartParser::new(&http::request_line_grammar()?);
//!     let tokens = http::tokenize_request_line("GET /index.html HTTP/1.1");
//!     let parse = parser.parse(&tokens);
//!     assert!(parse.accepted);
//!     assert_eq!(parse.trees.len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! # Crate features
//! The crate has the following features:
//! - `default`: Enables `dot_writer` and `serde`.
//!
//! - `dot_writer`: Renders NFAs and DFAs to graphviz dot format in tests.
//!
//! - `serde`: Derives `Serialize`/`Deserialize` for tokens, runs, traces and parse trees, so an
//!   embedding layer can ship them as JSON.

/// The module with the chart based CFG parser.
mod chart;
pub use chart::{CfgParse, ChartParser, ParseDiagnostic};

/// The module with the compiled DFA, its simulation, minimization and analysis.
mod dfa;
pub use dfa::{CompiledDfa, DfaConfiguration, DfaProperties, DfaRun};

/// Module with error definitions
mod errors;
pub use errors::{FormalangError, FormalangErrorKind, Result};

/// The module with the grammar types.
mod grammar;
pub use grammar::{Grammar, Production, Symbol};

/// The module with the HTTP request grammar and tokenizers.
pub mod http;

/// The module with internal implementation details.
mod internal;

/// The module with the compiled NFA and its simulation.
mod nfa;
pub use nfa::{compile_pattern, CompiledNfa, NfaConfiguration, NfaProperties, NfaRun};

/// The module with the parse tree type.
mod parse_tree;
pub use parse_tree::ParseTree;

/// The module with the pushdown automaton for HTTP request recognition.
mod pda;
pub use pda::{
    PdaConfiguration, PdaDescription, PdaInput, PdaRun, PdaState, PdaTransition, RequestPda,
    StackAction, StackSymbol,
};

/// The module with the token type.
mod token;
pub use token::Token;
