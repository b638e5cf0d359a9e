use regex_syntax::ast::Ast;

use super::{ids::CharClassIDBase, CharClassID, CharacterClass};

/// CharacterClassRegistry is a registry of character classes.
/// One registry exists per pattern compilation and is shared by the NFA and every
/// DFA derived from it, so that `CharClassID`s stay comparable across the pipeline.
#[derive(Debug, Clone, Default)]
pub(crate) struct CharacterClassRegistry {
    character_classes: Vec<CharacterClass>,
}

impl CharacterClassRegistry {
    /// Creates a new CharacterClassRegistry.
    pub(crate) fn new() -> Self {
        Self {
            character_classes: Vec::new(),
        }
    }

    /// Returns an iterator over all character classes in the registry.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &CharacterClass> {
        self.character_classes.iter()
    }

    /// Adds a character class to the registry if it is not already present and returns its ID.
    /// Presence is decided by the span-insensitive class key.
    pub(crate) fn add_character_class(&mut self, ast: &Ast) -> CharClassID {
        let key = CharacterClass::key_of(ast);
        if let Some(class) = self.character_classes.iter().find(|cc| cc.key() == key) {
            class.id()
        } else {
            let id = CharClassID::new(self.character_classes.len() as CharClassIDBase);
            self.character_classes
                .push(CharacterClass::new(id, ast.clone()));
            id
        }
    }

    /// Returns the character class with the given ID.
    pub(crate) fn get_character_class(&self, id: CharClassID) -> Option<&CharacterClass> {
        self.character_classes.get(id.as_usize())
    }

    /// Returns the number of character classes in the registry.
    pub(crate) fn len(&self) -> usize {
        self.character_classes.len()
    }

    /// Returns true if the registry is empty.
    #[allow(unused)]
    pub(crate) fn is_empty(&self) -> bool {
        self.character_classes.is_empty()
    }
}
