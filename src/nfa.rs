//! The module with the compiled NFA and its simulation.
//! An NFA is compiled from a regex pattern with Thompson's construction and can be
//! simulated directly, recording every configuration it passes through.

use log::trace;

use crate::internal::{
    parse_regex_syntax, CharacterClassRegistry, ClosureCache, MatchFunction, Nfa, StateID,
};
use crate::Result;

/// Compile a regex pattern into an NFA.
///
/// The pattern is parsed with the `regex-syntax` crate and converted to an NFA by
/// structural composition. A malformed pattern or an unsupported construct fails the
/// compilation; no partial automaton is ever returned.
pub fn compile_pattern(pattern: &str) -> Result<CompiledNfa> {
    let ast = parse_regex_syntax(pattern)?;
    let mut registry = CharacterClassRegistry::new();
    let nfa = Nfa::try_from_ast(ast, &mut registry)?;
    let matchers = compile_matchers(&registry)?;
    trace!(
        "Compiled pattern '{}': {} states, {} character classes",
        pattern.escape_default(),
        nfa.states().len(),
        registry.len()
    );
    Ok(CompiledNfa {
        nfa,
        registry,
        matchers,
    })
}

pub(crate) fn compile_matchers(registry: &CharacterClassRegistry) -> Result<Vec<MatchFunction>> {
    registry
        .iter()
        .map(|character_class| MatchFunction::try_from(character_class.ast()))
        .collect()
}

/// A single configuration of an NFA simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NfaConfiguration {
    /// The active state set after the step.
    pub states: Vec<usize>,
    /// The number of characters consumed so far.
    pub position: usize,
    /// The consumed part of the input.
    pub consumed: String,
    /// The remaining part of the input.
    pub remaining: String,
    /// The step index, 0 is the initial configuration.
    pub step: usize,
}

/// The result of an NFA simulation.
/// A reject is not an error; it is an ordinary result with `accepted == false`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NfaRun {
    /// True if the automaton accepts the input.
    pub accepted: bool,
    /// The configurations passed through, including the initial one.
    pub configurations: Vec<NfaConfiguration>,
    /// The number of characters consumed before acceptance or rejection.
    pub steps: usize,
    /// The number of epsilon closures that had to be computed during the run.
    pub closures_computed: usize,
}

/// A summary of the structural properties of an NFA.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NfaProperties {
    /// The number of states.
    pub state_count: usize,
    /// The number of character consuming transitions.
    pub transition_count: usize,
    /// The number of epsilon transitions.
    pub epsilon_transition_count: usize,
    /// The alphabet, i.e. the character classes used on transitions.
    pub alphabet: Vec<String>,
    /// True if the automaton is in fact deterministic: no epsilon transitions and at
    /// most one target per (state, character class) pair.
    pub is_deterministic: bool,
}

/// An NFA compiled from a single regex pattern.
/// The value is immutable after compilation; simulations keep their working state in
/// per-call locals, so a `CompiledNfa` can be shared between threads.
#[derive(Debug)]
pub struct CompiledNfa {
    pub(crate) nfa: Nfa,
    pub(crate) registry: CharacterClassRegistry,
    pub(crate) matchers: Vec<MatchFunction>,
}

impl CompiledNfa {
    /// The pattern the NFA was compiled from.
    pub fn pattern(&self) -> &str {
        self.nfa.pattern()
    }

    /// The number of states.
    pub fn state_count(&self) -> usize {
        self.nfa.states().len()
    }

    /// The alphabet of the automaton, i.e. the string representation of every character
    /// class that occurs on a transition.
    pub fn alphabet(&self) -> Vec<String> {
        self.nfa
            .used_char_classes()
            .iter()
            .filter_map(|id| self.registry.get_character_class(*id))
            .map(|cc| cc.to_string())
            .collect()
    }

    /// True if the automaton is in fact deterministic.
    pub fn is_deterministic(&self) -> bool {
        for state in self.nfa.states() {
            if !state.epsilon_transitions().is_empty() {
                return false;
            }
            let mut seen = Vec::new();
            for transition in state.transitions() {
                if seen.contains(&transition.char_class()) {
                    return false;
                }
                seen.push(transition.char_class());
            }
        }
        true
    }

    /// Summarize the structural properties of the automaton.
    pub fn analyze(&self) -> NfaProperties {
        let transition_count = self
            .nfa
            .states()
            .iter()
            .map(|s| s.transitions().len())
            .sum();
        let epsilon_transition_count = self
            .nfa
            .states()
            .iter()
            .map(|s| s.epsilon_transitions().len())
            .sum();
        NfaProperties {
            state_count: self.state_count(),
            transition_count,
            epsilon_transition_count,
            alphabet: self.alphabet(),
            is_deterministic: self.is_deterministic(),
        }
    }

    /// Simulate the NFA on the input.
    ///
    /// The active state set starts as the epsilon closure of the start state. For every
    /// character the set is moved along matching transitions and closed again. An empty
    /// set rejects early; acceptance requires the input to be exhausted with the
    /// accepting state in the final set.
    pub fn simulate(&self, input: &str) -> NfaRun {
        let mut closure_cache = ClosureCache::new();
        let mut current =
            self.nfa
                .epsilon_closure_set(&[self.nfa.start_state()], &mut closure_cache);
        let mut configurations = vec![NfaConfiguration {
            states: to_indices(&current),
            position: 0,
            consumed: String::new(),
            remaining: input.to_string(),
            step: 0,
        }];
        let mut steps = 0;
        let chars: Vec<char> = input.chars().collect();
        for (i, c) in chars.iter().enumerate() {
            let mut moved: Vec<StateID> = Vec::new();
            for state in &current {
                for transition in self.nfa.states()[*state].transitions() {
                    if self.matchers[transition.char_class().as_usize()].call(*c) {
                        moved.push(transition.target_state());
                    }
                }
            }
            steps += 1;
            if moved.is_empty() {
                trace!("Reject '{}' at position {}: no transition", c, i);
                configurations.push(NfaConfiguration {
                    states: Vec::new(),
                    position: i + 1,
                    consumed: chars[..=i].iter().collect(),
                    remaining: chars[i + 1..].iter().collect(),
                    step: steps,
                });
                return NfaRun {
                    accepted: false,
                    configurations,
                    steps,
                    closures_computed: closure_cache.computed(),
                };
            }
            current = self.nfa.epsilon_closure_set(&moved, &mut closure_cache);
            configurations.push(NfaConfiguration {
                states: to_indices(&current),
                position: i + 1,
                consumed: chars[..=i].iter().collect(),
                remaining: chars[i + 1..].iter().collect(),
                step: steps,
            });
        }
        let accepted = current.contains(&self.nfa.end_state());
        NfaRun {
            accepted,
            configurations,
            steps,
            closures_computed: closure_cache.computed(),
        }
    }
}

fn to_indices(states: &[StateID]) -> Vec<usize> {
    states.iter().map(|s| s.as_usize()).collect()
}
