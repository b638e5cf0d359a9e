use regex_syntax::ast::Ast;

use super::CharClassID;

/// A character class used on NFA transitions.
/// Identity is decided by the `key`, the escaped string form of the class AST. The
/// AST's own equality also compares source spans, which is irrelevant here: two
/// occurrences of [ab] in a pattern are the same class.
#[derive(Clone)]
pub(crate) struct CharacterClass {
    pub(crate) id: CharClassID,
    pub(crate) ast: Ast,
    key: String,
}

impl CharacterClass {
    pub(crate) fn new(id: CharClassID, ast: Ast) -> Self {
        let key = Self::key_of(&ast);
        CharacterClass { id, ast, key }
    }

    /// The span-insensitive identity of a class AST.
    pub(crate) fn key_of(ast: &Ast) -> String {
        ast.to_string().escape_default().to_string()
    }

    #[inline]
    pub(crate) fn id(&self) -> CharClassID {
        self.id
    }

    #[inline]
    pub(crate) fn ast(&self) -> &Ast {
        &self.ast
    }

    #[inline]
    pub(crate) fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Debug for CharacterClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CharacterClass {{ id: {:?}, key: {} }}", self.id, self.key)
    }
}

impl std::fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key)
    }
}

impl std::hash::Hash for CharacterClass {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.key.hash(state);
    }
}

impl PartialEq for CharacterClass {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.key == other.key
    }
}

impl Eq for CharacterClass {}

impl PartialOrd for CharacterClass {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.id.cmp(&other.id))
    }
}

impl Ord for CharacterClass {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

#[cfg(test)]
mod tests {
    use crate::internal::parse_regex_syntax;

    use super::*;

    #[test]
    fn test_key_ignores_spans() {
        // The same class at different positions in a pattern yields the same key.
        let first = parse_regex_syntax("a").unwrap();
        let second = match parse_regex_syntax("ba").unwrap() {
            Ast::Concat(ref c) => c.asts[1].clone(),
            _ => panic!("expected a concatenation"),
        };
        assert_ne!(first, second);
        assert_eq!(CharacterClass::key_of(&first), CharacterClass::key_of(&second));
    }

    #[test]
    fn test_distinct_classes_have_distinct_keys() {
        let a = parse_regex_syntax("[ab]").unwrap();
        let b = parse_regex_syntax("[abc]").unwrap();
        assert_ne!(CharacterClass::key_of(&a), CharacterClass::key_of(&b));
    }
}
