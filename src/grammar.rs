//! The module with the context-free grammar types.
//! A grammar is defined once, validated during construction and afterwards immutable.

use crate::{FormalangError, FormalangErrorKind, Result};

/// A symbol on the right-hand side of a production.
/// Terminals match the `kind` of an input [crate::Token], non-terminals reference
/// the left-hand side of other productions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Symbol {
    /// A terminal symbol, matched against the token kind.
    Terminal(String),
    /// A non-terminal symbol.
    NonTerminal(String),
}

impl Symbol {
    /// Create a terminal symbol.
    pub fn t<S: Into<String>>(name: S) -> Self {
        Symbol::Terminal(name.into())
    }

    /// Create a non-terminal symbol.
    pub fn nt<S: Into<String>>(name: S) -> Self {
        Symbol::NonTerminal(name.into())
    }

    /// The name of the symbol.
    pub fn name(&self) -> &str {
        match self {
            Symbol::Terminal(name) | Symbol::NonTerminal(name) => name,
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Terminal(name) => write!(f, "'{}'", name),
            Symbol::NonTerminal(name) => write!(f, "{}", name),
        }
    }
}

/// A single production `lhs → rhs` of a grammar.
/// Alternatives are expressed as separate productions with the same left-hand side.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Production {
    /// The non-terminal on the left-hand side.
    pub lhs: String,
    /// The right-hand side symbols, in order.
    pub rhs: Vec<Symbol>,
}

impl Production {
    /// Create a new production.
    pub fn new<S: Into<String>>(lhs: S, rhs: Vec<Symbol>) -> Self {
        Production {
            lhs: lhs.into(),
            rhs,
        }
    }
}

impl std::fmt::Display for Production {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} →", self.lhs)?;
        for symbol in &self.rhs {
            write!(f, " {}", symbol)?;
        }
        Ok(())
    }
}

/// A validated context-free grammar.
///
/// Construction fails if the grammar has no productions, if the start symbol has no
/// production, if a right-hand side references a non-terminal without a production, or
/// if a production has an empty right-hand side.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grammar {
    start_symbol: String,
    productions: Vec<Production>,
}

impl Grammar {
    /// Define a grammar from a start symbol and its productions.
    pub fn define<S: Into<String>>(start_symbol: S, productions: Vec<Production>) -> Result<Self> {
        let start_symbol = start_symbol.into();
        if productions.is_empty() {
            return Err(FormalangError::new(FormalangErrorKind::EmptyGrammar));
        }
        if !productions.iter().any(|p| p.lhs == start_symbol) {
            return Err(FormalangError::new(
                FormalangErrorKind::UndefinedStartSymbol(start_symbol),
            ));
        }
        for production in &productions {
            if production.rhs.is_empty() {
                return Err(FormalangError::new(FormalangErrorKind::EmptyProduction(
                    production.lhs.clone(),
                )));
            }
            for symbol in &production.rhs {
                if let Symbol::NonTerminal(name) = symbol {
                    if !productions.iter().any(|p| p.lhs == *name) {
                        return Err(FormalangError::new(
                            FormalangErrorKind::UndefinedNonTerminal {
                                symbol: name.clone(),
                                referenced_in: production.lhs.clone(),
                            },
                        ));
                    }
                }
            }
        }
        Ok(Grammar {
            start_symbol,
            productions,
        })
    }

    /// The start symbol of the grammar.
    pub fn start_symbol(&self) -> &str {
        &self.start_symbol
    }

    /// All productions of the grammar.
    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    /// The productions with the given left-hand side, together with their indices.
    pub fn productions_for<'a>(
        &'a self,
        lhs: &'a str,
    ) -> impl Iterator<Item = (usize, &'a Production)> + 'a {
        self.productions
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.lhs == lhs)
    }

    /// The distinct non-terminals of the grammar, in order of first definition.
    pub fn non_terminals(&self) -> Vec<&str> {
        let mut non_terminals = Vec::new();
        for production in &self.productions {
            if !non_terminals.contains(&production.lhs.as_str()) {
                non_terminals.push(production.lhs.as_str());
            }
        }
        non_terminals
    }

    /// The distinct terminals of the grammar, in order of first use.
    pub fn terminals(&self) -> Vec<&str> {
        let mut terminals = Vec::new();
        for production in &self.productions {
            for symbol in &production.rhs {
                if let Symbol::Terminal(name) = symbol {
                    if !terminals.contains(&name.as_str()) {
                        terminals.push(name.as_str());
                    }
                }
            }
        }
        terminals
    }
}

impl std::fmt::Display for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Grammar (start: {})", self.start_symbol)?;
        for production in &self.productions {
            writeln!(f, "{}", production)?;
        }
        Ok(())
    }
}
