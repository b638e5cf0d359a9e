//! The input symbols of the DFA.
//! Character classes of a pattern can overlap, e.g. 'a' and [ab]. A single character
//! then moves the NFA through several transitions at once. The DFA therefore does not
//! transition on single character classes but on class signatures, the exact set of
//! classes a character satisfies simultaneously. Signatures partition the input
//! alphabet into disjoint symbols, which keeps the subset construction equivalent to
//! the NFA.

use regex_syntax::ast::{Ast, ClassSet, ClassSetItem};

use super::{ids::CharClassIDBase, CharClassID, CharacterClassRegistry, MatchFunction};

/// The sorted set of character class ids a character satisfies at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct ClassSignature(Vec<CharClassID>);

impl ClassSignature {
    /// Create a signature from explicitly given class ids.
    pub(crate) fn new(mut classes: Vec<CharClassID>) -> Self {
        classes.sort_unstable();
        classes.dedup();
        ClassSignature(classes)
    }

    /// The signature of a character, i.e. the ids of all classes whose match function
    /// accepts it. The ids are in ascending order by construction.
    pub(crate) fn of(c: char, matchers: &[MatchFunction]) -> Self {
        ClassSignature(
            matchers
                .iter()
                .enumerate()
                .filter(|(_, matcher)| matcher.call(c))
                .map(|(id, _)| CharClassID::new(id as CharClassIDBase))
                .collect(),
        )
    }

    pub(crate) fn classes(&self) -> &[CharClassID] {
        &self.0
    }

    /// True if the character satisfies no class at all.
    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for ClassSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<String> = self.0.iter().map(|id| id.to_string()).collect();
        write!(f, "{{{}}}", ids.join("+"))
    }
}

/// Enumerate every signature an input character can produce for the given registry.
///
/// The supported class constructs are built from literals, ranges and `char`
/// predicates, so the distinct signatures can be found by probing a witness set: the
/// ASCII range, every literal and range endpoint mentioned in a class together with
/// its neighbors, and a few non-ASCII representatives for the predicate classes.
pub(crate) fn realizable_signatures(
    registry: &CharacterClassRegistry,
    matchers: &[MatchFunction],
) -> Vec<ClassSignature> {
    let mut witnesses: Vec<char> = (0u32..128).filter_map(char::from_u32).collect();
    witnesses.extend(['ä', 'α', 'Ω', '中', '٣', '\u{2028}']);
    for class in registry.iter() {
        collect_witnesses(class.ast(), &mut witnesses);
    }
    witnesses.sort_unstable();
    witnesses.dedup();
    let mut signatures: Vec<ClassSignature> = witnesses
        .into_iter()
        .map(|c| ClassSignature::of(c, matchers))
        .filter(|signature| !signature.is_empty())
        .collect();
    signatures.sort();
    signatures.dedup();
    signatures
}

// Collect the characters a class mentions syntactically, plus their direct neighbors.
// The neighbors catch the boundaries of ranges and negations.
fn collect_witnesses(ast: &Ast, out: &mut Vec<char>) {
    match ast {
        Ast::Literal(l) => push_with_neighbors(l.c, out),
        Ast::ClassBracketed(b) => collect_class_set(&b.kind, out),
        _ => {}
    }
}

fn collect_class_set(set: &ClassSet, out: &mut Vec<char>) {
    match set {
        ClassSet::Item(item) => collect_class_item(item, out),
        ClassSet::BinaryOp(op) => {
            collect_class_set(&op.lhs, out);
            collect_class_set(&op.rhs, out);
        }
    }
}

fn collect_class_item(item: &ClassSetItem, out: &mut Vec<char>) {
    match item {
        ClassSetItem::Literal(l) => push_with_neighbors(l.c, out),
        ClassSetItem::Range(r) => {
            push_with_neighbors(r.start.c, out);
            push_with_neighbors(r.end.c, out);
        }
        ClassSetItem::Bracketed(b) => collect_class_set(&b.kind, out),
        ClassSetItem::Union(u) => {
            for item in &u.items {
                collect_class_item(item, out);
            }
        }
        _ => {}
    }
}

fn push_with_neighbors(c: char, out: &mut Vec<char>) {
    let value = c as u32;
    out.extend((value.saturating_sub(1)..=value + 1).filter_map(char::from_u32));
}

#[cfg(test)]
mod tests {
    use crate::internal::parse_regex_syntax;
    use crate::internal::CharacterClassRegistry;
    use crate::nfa::compile_matchers;

    use super::*;

    fn registry_for(patterns: &[&str]) -> (CharacterClassRegistry, Vec<MatchFunction>) {
        let mut registry = CharacterClassRegistry::new();
        for pattern in patterns {
            registry.add_character_class(&parse_regex_syntax(pattern).unwrap());
        }
        let matchers = compile_matchers(&registry).unwrap();
        (registry, matchers)
    }

    #[test]
    fn test_signature_of_overlapping_classes() {
        let (_, matchers) = registry_for(&["a", "[ab]"]);
        assert_eq!(
            ClassSignature::of('a', &matchers),
            ClassSignature::new(vec![CharClassID::new(0), CharClassID::new(1)])
        );
        assert_eq!(
            ClassSignature::of('b', &matchers),
            ClassSignature::new(vec![CharClassID::new(1)])
        );
        assert!(ClassSignature::of('c', &matchers).is_empty());
    }

    #[test]
    fn test_realizable_signatures_partition_overlap() {
        let (registry, matchers) = registry_for(&["a", "[ab]", "c"]);
        let signatures = realizable_signatures(&registry, &matchers);
        // 'a' satisfies both of the first two classes, 'b' only the second.
        assert_eq!(
            signatures,
            vec![
                ClassSignature::new(vec![CharClassID::new(0), CharClassID::new(1)]),
                ClassSignature::new(vec![CharClassID::new(1)]),
                ClassSignature::new(vec![CharClassID::new(2)]),
            ]
        );
    }

    #[test]
    fn test_realizable_signatures_disjoint_classes_stay_singletons() {
        let (registry, matchers) = registry_for(&["a", "b"]);
        let signatures = realizable_signatures(&registry, &matchers);
        assert_eq!(signatures.len(), 2);
        assert!(signatures.iter().all(|s| s.classes().len() == 1));
    }

    #[test]
    fn test_range_boundaries_are_probed() {
        let (registry, matchers) = registry_for(&["[12]", "[0-9]"]);
        let signatures = realizable_signatures(&registry, &matchers);
        // '1' and '2' satisfy both classes, the other digits only the second.
        assert_eq!(signatures.len(), 2);
    }
}
