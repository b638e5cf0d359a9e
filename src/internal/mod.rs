/// Module that provides functions and types related to character classes.
mod character_class;
pub(crate) use character_class::CharacterClass;

/// Module that provides the type CharacterClassRegistry.
mod character_class_registry;
pub(crate) use character_class_registry::CharacterClassRegistry;

/// Module that provides the chart of the CFG parser.
pub(crate) mod chart;
pub(crate) use chart::Chart;

/// Module that provides the epsilon closure cache.
mod closure_cache;
pub(crate) use closure_cache::ClosureCache;

/// Module that provides functions and types related to DFAs.
pub(crate) mod dfa;
pub(crate) use dfa::Dfa;

/// Module with conversion to graphviz dot format
#[cfg(all(test, feature = "dot_writer"))]
mod dot;

/// Module for several ID types.
mod ids;
pub(crate) use ids::{CharClassID, StateID, StateIDBase};

/// Module that provides functions and types related to match functions.
pub(crate) mod match_function;
pub(crate) use match_function::MatchFunction;

/// The nfa module contains the NFA implementation.
mod nfa;
pub(crate) use nfa::Nfa;

/// The parser module contains the regex syntax parser.
mod parser;
pub(crate) use parser::parse_regex_syntax;

/// Module that provides the class signatures the DFA transitions on.
mod signature;
pub(crate) use signature::{realizable_signatures, ClassSignature};
