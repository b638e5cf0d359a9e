//! The module with the token type used as input for the grammar based recognizers.

/// A classified piece of input text.
/// Tokens are produced by a tokenizer, e.g. the ones in the [crate::http] module, and
/// consumed by the chart parser and the PDA.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    /// The kind of the token, e.g. "METHOD" or "SP". Grammar terminals match on this.
    pub kind: String,
    /// The matched text.
    pub text: String,
    /// The character position of the token in the input.
    pub position: usize,
}

impl Token {
    /// Create a new token.
    pub fn new<K, T>(kind: K, text: T, position: usize) -> Self
    where
        K: Into<String>,
        T: Into<String>,
    {
        Token {
            kind: kind.into(),
            text: text.into(),
            position,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}('{}')@{}",
            self.kind,
            self.text.escape_default(),
            self.position
        )
    }
}
