//! The module with the parse tree type produced by the chart parser and the PDA.

/// A node of a parse tree.
/// Inner nodes carry the non-terminal symbol and the index of the production that was
/// applied; leaves carry the terminal symbol and the matched token text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseTree {
    /// The symbol this node represents.
    pub symbol: String,
    /// The matched token text, only set on terminal leaves.
    pub token: Option<String>,
    /// The index of the applied production in the grammar, only set on inner nodes.
    pub production: Option<usize>,
    /// The ordered children of the node.
    pub children: Vec<ParseTree>,
}

impl ParseTree {
    /// Create an inner node.
    pub fn node<S: Into<String>>(
        symbol: S,
        production: usize,
        children: Vec<ParseTree>,
    ) -> Self {
        ParseTree {
            symbol: symbol.into(),
            token: None,
            production: Some(production),
            children,
        }
    }

    /// Create an inner node that is not tied to a grammar production.
    pub fn branch<S: Into<String>>(symbol: S, children: Vec<ParseTree>) -> Self {
        ParseTree {
            symbol: symbol.into(),
            token: None,
            production: None,
            children,
        }
    }

    /// Create a terminal leaf.
    pub fn leaf<S: Into<String>, T: Into<String>>(symbol: S, token: T) -> Self {
        ParseTree {
            symbol: symbol.into(),
            token: Some(token.into()),
            production: None,
            children: Vec::new(),
        }
    }

    /// Re-flatten the terminal token texts of the tree in order.
    /// For a sound parse this reproduces the text of the parsed input.
    pub fn leaves(&self) -> Vec<&str> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a str>) {
        if let Some(token) = &self.token {
            leaves.push(token.as_str());
        }
        for child in &self.children {
            child.collect_leaves(leaves);
        }
    }

    fn fmt_indented(&self, f: &mut std::fmt::Formatter<'_>, indent: usize) -> std::fmt::Result {
        match &self.token {
            Some(token) => writeln!(
                f,
                "{}{} '{}'",
                "  ".repeat(indent),
                self.symbol,
                token.escape_default()
            )?,
            None => writeln!(f, "{}{}", "  ".repeat(indent), self.symbol)?,
        }
        for child in &self.children {
            child.fmt_indented(f, indent + 1)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for ParseTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.fmt_indented(f, 0)
    }
}
