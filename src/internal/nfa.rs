//! This module contains the NFA (Non-deterministic Finite Automaton) implementation.
//! The NFA is built from the regex syntax tree by structural composition and is later
//! either simulated directly or converted to a DFA (Deterministic Finite Automaton).

use regex_syntax::ast::{Ast, RepetitionKind, RepetitionRange};

use crate::{FormalangError, Result};

use super::{ids::StateIDBase, CharClassID, CharacterClassRegistry, ClosureCache, StateID};

macro_rules! unsupported {
    ($feature:expr) => {
        FormalangError::new($crate::FormalangErrorKind::UnsupportedFeature(
            $feature.to_string(),
        ))
    };
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Nfa {
    pub(crate) pattern: String,
    pub(crate) states: Vec<NfaState>,
    // Used during NFA construction
    pub(crate) start_state: StateID,
    // Used during NFA construction
    pub(crate) end_state: StateID,
}

impl Nfa {
    pub(crate) fn new() -> Self {
        Self {
            pattern: String::new(),
            states: vec![NfaState::default()],
            start_state: StateID::default(),
            end_state: StateID::default(),
        }
    }

    // Returns true if the NFA is empty, i.e. no states and no transitions have been added.
    pub(crate) fn is_empty(&self) -> bool {
        self.start_state == StateID::default()
            && self.end_state == StateID::default()
            && self.states.len() == 1
            && self.states[0].is_empty()
    }

    pub(crate) fn start_state(&self) -> StateID {
        self.start_state
    }

    pub(crate) fn end_state(&self) -> StateID {
        self.end_state
    }

    pub(crate) fn states(&self) -> &[NfaState] {
        &self.states
    }

    pub(crate) fn pattern(&self) -> &str {
        &self.pattern
    }

    pub(crate) fn set_pattern(&mut self, pattern: &str) {
        self.pattern = pattern.to_string();
    }

    pub(crate) fn add_state(&mut self, state: NfaState) {
        self.states.push(state);
    }

    pub(crate) fn set_start_state(&mut self, state: StateID) {
        self.start_state = state;
    }

    pub(crate) fn set_end_state(&mut self, state: StateID) {
        self.end_state = state;
    }

    pub(crate) fn add_transition(
        &mut self,
        from: StateID,
        chars: &Ast,
        char_class_registry: &mut CharacterClassRegistry,
        target_state: StateID,
    ) {
        // The class AST itself lives in the registry; the transition only carries the id.
        let char_class = char_class_registry.add_character_class(chars);
        self.states[from].transitions.push(NfaTransition {
            char_class,
            target_state,
        });
    }

    pub(crate) fn add_epsilon_transition(&mut self, from: StateID, target_state: StateID) {
        self.states[from]
            .epsilon_transitions
            .push(EpsilonTransition { target_state });
    }

    pub(crate) fn new_state(&mut self) -> StateID {
        let state = StateID::new(self.states.len() as StateIDBase);
        self.add_state(NfaState::new(state));
        state
    }

    /// Apply an offset to every state number.
    pub(crate) fn shift_ids(&mut self, offset: usize) -> (StateID, StateID) {
        for state in self.states.iter_mut() {
            state.offset(offset);
        }
        self.start_state = StateID::new(self.start_state.id() + offset as StateIDBase);
        self.end_state = StateID::new(self.end_state.id() + offset as StateIDBase);
        (self.start_state, self.end_state)
    }

    /// Concatenates the current NFA with another NFA.
    /// The end state of self is connected by epsilon to the start state of `nfa`.
    pub(crate) fn concat(&mut self, mut nfa: Nfa) {
        if self.is_empty() {
            self.set_start_state(nfa.start_state);
            self.set_end_state(nfa.end_state);
            self.states = nfa.states;
            return;
        }

        let (nfa_start_state, nfa_end_state) = nfa.shift_ids(self.states.len());
        self.append(nfa);
        self.add_epsilon_transition(self.end_state, nfa_start_state);
        self.set_end_state(nfa_end_state);
    }

    /// Combines the current NFA with another NFA as alternatives.
    /// A fresh start state branches into both, a fresh end state joins them.
    pub(crate) fn alternation(&mut self, mut nfa: Nfa) {
        if self.is_empty() {
            self.set_start_state(nfa.start_state);
            self.set_end_state(nfa.end_state);
            self.states = nfa.states;
            return;
        }

        let (nfa_start_state, nfa_end_state) = nfa.shift_ids(self.states.len());
        self.append(nfa);

        let start_state = self.new_state();
        self.add_epsilon_transition(start_state, self.start_state);
        self.add_epsilon_transition(start_state, nfa_start_state);

        let end_state = self.new_state();
        self.add_epsilon_transition(self.end_state, end_state);
        self.add_epsilon_transition(nfa_end_state, end_state);

        self.set_start_state(start_state);
        self.set_end_state(end_state);
    }

    /// The `?` operator: a fresh start state bypasses the automaton by epsilon.
    pub(crate) fn zero_or_one(&mut self) {
        let start_state = self.new_state();
        self.add_epsilon_transition(start_state, self.start_state);
        self.add_epsilon_transition(start_state, self.end_state);
        self.set_start_state(start_state);
    }

    /// The `+` operator: the old end state loops back to the old start state.
    pub(crate) fn one_or_more(&mut self) {
        let start_state = self.new_state();
        self.add_epsilon_transition(start_state, self.start_state);

        let end_state = self.new_state();
        self.add_epsilon_transition(self.end_state, end_state);
        self.add_epsilon_transition(self.end_state, self.start_state);

        self.set_start_state(start_state);
        self.set_end_state(end_state);
    }

    /// The `*` operator: like `+` plus a bypass from the fresh start state.
    pub(crate) fn zero_or_more(&mut self) {
        let start_state = self.new_state();
        self.add_epsilon_transition(start_state, self.start_state);
        self.add_epsilon_transition(start_state, self.end_state);

        let end_state = self.new_state();
        self.add_epsilon_transition(self.end_state, end_state);
        self.add_epsilon_transition(self.end_state, self.start_state);

        self.set_start_state(start_state);
        self.set_end_state(end_state);
    }

    /// Move the states of the given NFA to the current NFA and thereby consume the NFA.
    pub(crate) fn append(&mut self, mut nfa: Nfa) {
        self.states.append(nfa.states.as_mut());
        // Check the index constraints
        debug_assert!(self
            .states
            .iter()
            .enumerate()
            .all(|(i, s)| s.id().as_usize() == i));
    }

    /// Calculate the epsilon closure of a set of states and return the unique sorted states.
    /// The cache is consulted first; a fresh fixed-point computation is stored on a miss.
    pub(crate) fn epsilon_closure_set(
        &self,
        states: &[StateID],
        cache: &mut ClosureCache,
    ) -> Vec<StateID> {
        let mut key: Vec<StateID> = states.to_vec();
        key.sort_unstable();
        key.dedup();
        if let Some(closure) = cache.get(&key) {
            return closure.clone();
        }
        // Every state is part of its own ε-closure
        let mut closure: Vec<StateID> = key.clone();
        let mut i = 0;
        while i < closure.len() {
            let current_state = closure[i];
            for epsilon_transition in self.states[current_state].epsilon_transitions() {
                if !closure.contains(&epsilon_transition.target_state()) {
                    closure.push(epsilon_transition.target_state());
                }
            }
            i += 1;
        }
        closure.sort_unstable();
        closure.dedup();
        cache.insert(key, closure.clone());
        closure
    }

    /// Calculate move(T, a) for a set of states T and a character class a.
    /// This is the set of states that can be reached from T by matching a.
    pub(crate) fn move_set(&self, states: &[StateID], char_class: CharClassID) -> Vec<StateID> {
        let mut move_set = Vec::new();
        for state in states {
            for transition in self.states()[*state].transitions() {
                if transition.char_class() == char_class {
                    move_set.push(transition.target_state());
                }
            }
        }
        move_set
    }

    /// The character classes that actually occur on transitions, in id order.
    pub(crate) fn used_char_classes(&self) -> Vec<CharClassID> {
        let mut classes: Vec<CharClassID> = self
            .states
            .iter()
            .flat_map(|s| s.transitions().iter().map(|t| t.char_class()))
            .collect();
        classes.sort_unstable();
        classes.dedup();
        classes
    }

    /// Builds the NFA from the regex syntax tree by structural composition.
    /// Character classes are interned in the given registry so that their ids are
    /// shared with every automaton derived from this NFA.
    pub(crate) fn try_from_ast(
        ast: Ast,
        char_class_registry: &mut CharacterClassRegistry,
    ) -> Result<Self> {
        let mut nfa = Nfa::new();
        nfa.set_pattern(&ast.to_string());
        match ast {
            Ast::Empty(_) => Ok(nfa),
            Ast::Flags(_) => Err(unsupported!(format!("{:?}", ast))),
            Ast::Assertion(ref a) => Err(unsupported!(format!("Assertion {:?}", a.kind))),
            // Everything a single character can match becomes one transition between
            // two fresh states.
            Ast::Literal(_)
            | Ast::Dot(_)
            | Ast::ClassUnicode(_)
            | Ast::ClassPerl(_)
            | Ast::ClassBracketed(_) => {
                let start_state = nfa.end_state();
                let end_state = nfa.new_state();
                nfa.set_end_state(end_state);
                nfa.add_transition(start_state, &ast, char_class_registry, end_state);
                Ok(nfa)
            }
            Ast::Repetition(ref r) => {
                let mut nfa2 = Nfa::try_from_ast(r.ast.as_ref().clone(), char_class_registry)?;
                match &r.op.kind {
                    RepetitionKind::ZeroOrOne => {
                        nfa2.zero_or_one();
                        nfa = nfa2;
                    }
                    RepetitionKind::ZeroOrMore => {
                        nfa2.zero_or_more();
                        nfa = nfa2;
                    }
                    RepetitionKind::OneOrMore => {
                        nfa2.one_or_more();
                        nfa = nfa2;
                    }
                    RepetitionKind::Range(r) => match r {
                        RepetitionRange::Exactly(c) => {
                            for _ in 0..*c {
                                nfa.concat(nfa2.clone());
                            }
                        }
                        RepetitionRange::AtLeast(c) => {
                            for _ in 0..*c {
                                nfa.concat(nfa2.clone());
                            }
                            let mut nfa_zero_or_more: Nfa = nfa2.clone();
                            nfa_zero_or_more.zero_or_more();
                            nfa.concat(nfa_zero_or_more);
                        }
                        RepetitionRange::Bounded(least, most) => {
                            for _ in 0..*least {
                                nfa.concat(nfa2.clone());
                            }
                            let mut nfa_zero_or_one: Nfa = nfa2.clone();
                            nfa_zero_or_one.zero_or_one();
                            for _ in *least..*most {
                                nfa.concat(nfa_zero_or_one.clone());
                            }
                        }
                    },
                }
                Ok(nfa)
            }
            Ast::Group(ref g) => {
                nfa = Nfa::try_from_ast(g.ast.as_ref().clone(), char_class_registry)?;
                Ok(nfa)
            }
            Ast::Alternation(ref a) => {
                for ast in a.asts.iter() {
                    let nfa2 = Nfa::try_from_ast(ast.clone(), char_class_registry)?;
                    nfa.alternation(nfa2);
                }
                Ok(nfa)
            }
            Ast::Concat(ref c) => {
                for ast in c.asts.iter() {
                    let nfa2 = Nfa::try_from_ast(ast.clone(), char_class_registry)?;
                    nfa.concat(nfa2);
                }
                Ok(nfa)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct NfaState {
    state: StateID,
    epsilon_transitions: Vec<EpsilonTransition>,
    transitions: Vec<NfaTransition>,
}

impl NfaState {
    pub(crate) fn new(state: StateID) -> Self {
        Self {
            state,
            epsilon_transitions: Vec::new(),
            transitions: Vec::new(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.transitions.is_empty() && self.epsilon_transitions.is_empty()
    }

    pub(crate) fn id(&self) -> StateID {
        self.state
    }

    pub(crate) fn transitions(&self) -> &[NfaTransition] {
        &self.transitions
    }

    pub(crate) fn epsilon_transitions(&self) -> &[EpsilonTransition] {
        &self.epsilon_transitions
    }

    /// Apply an offset to every state number.
    pub(crate) fn offset(&mut self, offset: usize) {
        self.state = StateID::new(self.state.id() + offset as StateIDBase);
        for transition in self.transitions.iter_mut() {
            transition.target_state =
                StateID::new(transition.target_state.id() + offset as StateIDBase);
        }
        for epsilon_transition in self.epsilon_transitions.iter_mut() {
            epsilon_transition.target_state =
                StateID::new(epsilon_transition.target_state.id() + offset as StateIDBase);
        }
    }
}

/// A character consuming transition in the NFA.
#[derive(Debug, Clone)]
pub(crate) struct NfaTransition {
    /// The next state to transition to
    target_state: StateID,
    /// The id of the character class in the registry of the compilation
    char_class: CharClassID,
}

impl NfaTransition {
    pub(crate) fn target_state(&self) -> StateID {
        self.target_state
    }

    pub(crate) fn char_class(&self) -> CharClassID {
        self.char_class
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct EpsilonTransition {
    pub(crate) target_state: StateID,
}

impl EpsilonTransition {
    pub(crate) fn target_state(&self) -> StateID {
        self.target_state
    }
}

impl From<StateID> for EpsilonTransition {
    fn from(state: StateID) -> Self {
        Self {
            target_state: state,
        }
    }
}
