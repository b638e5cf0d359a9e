use thiserror::Error;

/// The result type for the `formalang` crate.
pub type Result<T> = std::result::Result<T, FormalangError>;

/// The error type for the `formalang` crate.
///
/// All variants are construction errors: a failing pattern compilation or
/// grammar definition never returns a partial automaton or grammar.
/// Recognition rejects are not errors; they are ordinary return values of
/// `simulate`/`parse` with `accepted == false`.
#[derive(Error, Debug)]
pub struct FormalangError {
    /// The source of the error.
    pub source: Box<FormalangErrorKind>,
}

impl FormalangError {
    /// Create a new `FormalangError`.
    pub fn new(kind: FormalangErrorKind) -> Self {
        FormalangError {
            source: Box::new(kind),
        }
    }
}

impl std::fmt::Display for FormalangError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// The error kind type.
#[derive(Error, Debug)]
pub enum FormalangErrorKind {
    /// An error occurred during the parsing of the regex syntax.
    #[error("'{1}' {0}")]
    RegexSyntaxError(regex_syntax::ast::Error, String),

    /// Used regex features that are not supported (yet).
    #[error("Unsupported regex feature: {0}")]
    UnsupportedFeature(String),

    /// A grammar rule references a non-terminal that has no production.
    #[error("undefined non-terminal '{symbol}' referenced in production of '{referenced_in}'")]
    UndefinedNonTerminal {
        /// The non-terminal without a production.
        symbol: String,
        /// The left-hand side of the production that references it.
        referenced_in: String,
    },

    /// The designated start symbol has no production.
    #[error("start symbol '{0}' has no production")]
    UndefinedStartSymbol(String),

    /// A grammar was defined without any production.
    #[error("grammar has no productions")]
    EmptyGrammar,

    /// A production alternative with an empty right-hand side.
    #[error("empty production for non-terminal '{0}'")]
    EmptyProduction(String),

    /// A std::io error occurred.
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

impl From<regex_syntax::ast::Error> for FormalangError {
    fn from(error: regex_syntax::ast::Error) -> Self {
        let pattern = error.pattern().to_string();
        FormalangError::new(FormalangErrorKind::RegexSyntaxError(error, pattern))
    }
}

impl From<std::io::Error> for FormalangError {
    fn from(error: std::io::Error) -> Self {
        FormalangError::new(FormalangErrorKind::IoError(error))
    }
}
