//! The module with the compiled DFA, its simulation, minimization and analysis.
//! A DFA is derived from a [CompiledNfa](crate::nfa::CompiledNfa) with the subset
//! construction algorithm and shares the character class ids of its source NFA.

use log::trace;

use crate::internal::{
    realizable_signatures, CharacterClassRegistry, ClassSignature, Dfa, MatchFunction, StateID,
};
use crate::nfa::{compile_matchers, CompiledNfa};
use crate::Result;

/// A single configuration of a DFA simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DfaConfiguration {
    /// The current state after the step.
    pub state: usize,
    /// The number of characters consumed so far.
    pub position: usize,
    /// The consumed part of the input.
    pub consumed: String,
    /// The remaining part of the input.
    pub remaining: String,
    /// The step index, 0 is the initial configuration.
    pub step: usize,
}

/// The result of a DFA simulation.
/// A reject is not an error; it is an ordinary result with `accepted == false`. On a
/// missing transition the partial trace up to the failure is preserved.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DfaRun {
    /// True if the automaton accepts the input.
    pub accepted: bool,
    /// The states visited, in order, starting with the start state.
    pub path: Vec<usize>,
    /// The configurations passed through, including the initial one.
    pub configurations: Vec<DfaConfiguration>,
    /// The number of characters consumed before acceptance or rejection.
    pub steps: usize,
}

/// A summary of the structural properties of a DFA.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DfaProperties {
    /// The number of states.
    pub state_count: usize,
    /// The number of transitions.
    pub transition_count: usize,
    /// The number of accepting states.
    pub accepting_state_count: usize,
    /// True if every state has a transition for every input symbol of the alphabet.
    /// An input symbol is the set of character classes a character satisfies at once.
    pub is_complete: bool,
    /// States not reachable from the start state.
    pub unreachable_states: Vec<usize>,
    /// States from which no accepting state is reachable.
    pub dead_states: Vec<usize>,
}

/// A DFA compiled from an NFA via subset construction.
/// Like the NFA it is immutable after construction and can be shared between threads.
///
/// The transition function is partial: a missing transition rejects the input, it is
/// not an error.
#[derive(Debug)]
pub struct CompiledDfa {
    pub(crate) dfa: Dfa,
    pub(crate) registry: CharacterClassRegistry,
    pub(crate) matchers: Vec<MatchFunction>,
}

impl CompiledDfa {
    /// Convert an NFA into an equivalent DFA using the subset construction algorithm.
    /// The character class registry of the NFA is carried over, so the class ids of both
    /// automata stay comparable.
    pub fn from_nfa(nfa: &CompiledNfa) -> Result<Self> {
        let registry = nfa.registry.clone();
        let matchers = compile_matchers(&registry)?;
        // The input alphabet of the DFA: the signatures a character can produce. With
        // overlapping classes a character moves the NFA over several transitions at
        // once, so the DFA transitions on full signatures, never on single classes.
        let alphabet = realizable_signatures(&registry, &matchers);
        let dfa = Dfa::try_from_nfa(&nfa.nfa, &alphabet)?;
        trace!(
            "Subset construction for '{}': {} DFA states",
            dfa.pattern().escape_default(),
            dfa.states().len()
        );
        Ok(CompiledDfa {
            dfa,
            registry,
            matchers,
        })
    }

    /// The pattern the automaton was compiled from.
    pub fn pattern(&self) -> &str {
        self.dfa.pattern()
    }

    /// The number of states.
    pub fn state_count(&self) -> usize {
        self.dfa.states().len()
    }

    /// The sorted NFA state ids a DFA state was built from during subset construction.
    /// Empty for states of a minimized DFA.
    pub fn nfa_states_of(&self, state: usize) -> Option<Vec<usize>> {
        self.dfa
            .states()
            .get(state)
            .map(|s| s.nfa_states().iter().map(|id| id.as_usize()).collect())
    }

    /// True if the given state is an accepting state.
    pub fn is_accepting(&self, state: usize) -> bool {
        self.dfa.is_accepting(StateID::new(state as u32))
    }

    /// Simulate the DFA on the input, one transition per character.
    /// A character without a defined transition rejects immediately; the partial trace
    /// is preserved in the returned run.
    pub fn simulate(&self, input: &str) -> DfaRun {
        let mut current = StateID::new(0);
        let mut path = vec![current.as_usize()];
        let mut configurations = vec![DfaConfiguration {
            state: current.as_usize(),
            position: 0,
            consumed: String::new(),
            remaining: input.to_string(),
            step: 0,
        }];
        let mut steps = 0;
        let chars: Vec<char> = input.chars().collect();
        for (i, c) in chars.iter().enumerate() {
            let target = self.transition_for(current, *c);
            steps += 1;
            match target {
                Some(target) => {
                    current = target;
                    path.push(current.as_usize());
                    configurations.push(DfaConfiguration {
                        state: current.as_usize(),
                        position: i + 1,
                        consumed: chars[..=i].iter().collect(),
                        remaining: chars[i + 1..].iter().collect(),
                        step: steps,
                    });
                }
                None => {
                    trace!(
                        "Reject '{}' at position {}: no transition from state {}",
                        c,
                        i,
                        current.as_usize()
                    );
                    return DfaRun {
                        accepted: false,
                        path,
                        configurations,
                        steps,
                    };
                }
            }
        }
        DfaRun {
            accepted: self.dfa.is_accepting(current),
            path,
            configurations,
            steps,
        }
    }

    // Find the transition of a state for the character. The lookup key is the exact
    // set of character classes the character satisfies.
    fn transition_for(&self, state: StateID, c: char) -> Option<StateID> {
        let signature = ClassSignature::of(c, &self.matchers);
        if signature.is_empty() {
            return None;
        }
        self.dfa.target_state(state, &signature)
    }

    /// Minimize the DFA with Moore's partition refinement.
    ///
    /// Unreachable states are dropped before refinement, so they never survive
    /// minimization. The start state of the minimized DFA is again state 0. The
    /// recognized language is unchanged.
    pub fn minimize(&self) -> Result<CompiledDfa> {
        let dfa = self.dfa.minimize()?;
        let registry = self.registry.clone();
        let matchers = compile_matchers(&registry)?;
        trace!(
            "Minimized '{}': {} -> {} states",
            self.dfa.pattern().escape_default(),
            self.dfa.states().len(),
            dfa.states().len()
        );
        Ok(CompiledDfa {
            dfa,
            registry,
            matchers,
        })
    }

    /// Analyze the structural properties of the DFA: completeness of the transition
    /// function, unreachable states and dead states.
    pub fn analyze(&self) -> DfaProperties {
        let transition_count = self.dfa.transitions().values().map(|t| t.len()).sum();
        let alphabet_size = self.dfa.alphabet().len();
        let is_complete = !self.dfa.states().is_empty()
            && self.dfa.states().iter().all(|state| {
                self.dfa
                    .transitions()
                    .get(&state.id())
                    .is_some_and(|t| t.len() == alphabet_size)
            });
        let reachable = self.dfa.reachable_states();
        let productive = self.dfa.productive_states();
        let unreachable_states = self
            .dfa
            .states()
            .iter()
            .map(|s| s.id())
            .filter(|id| !reachable.contains(id))
            .map(|id| id.as_usize())
            .collect();
        let dead_states = self
            .dfa
            .states()
            .iter()
            .map(|s| s.id())
            .filter(|id| !productive.contains(id))
            .map(|id| id.as_usize())
            .collect();
        DfaProperties {
            state_count: self.state_count(),
            transition_count,
            accepting_state_count: self.dfa.accepting_states.len(),
            is_complete,
            unreachable_states,
            dead_states,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfa::compile_pattern;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    struct TestData {
        pattern: &'static str,
        accepted: &'static [&'static str],
        rejected: &'static [&'static str],
    }

    const TEST_DATA: &[TestData] = &[
        TestData {
            pattern: "(a|b)*abb",
            accepted: &["abb", "aabb", "babb", "ababb"],
            rejected: &["", "ab", "abba", "c"],
        },
        TestData {
            pattern: "GET|POST|PUT|DELETE|HEAD|OPTIONS",
            accepted: &["GET", "POST", "OPTIONS"],
            rejected: &["GE", "GETS", "PATCH", ""],
        },
        TestData {
            pattern: r"HTTP/[12]\.[0-9]",
            accepted: &["HTTP/1.1", "HTTP/2.0"],
            rejected: &["HTTP/3.0", "HTTP/1", "HTTP/1.1 "],
        },
        TestData {
            pattern: r"/[a-zA-Z0-9_.\-/]*",
            accepted: &["/", "/index.html", "/api/v1/users.json"],
            rejected: &["index.html", "/index html"],
        },
        TestData {
            pattern: "ab|[ab]c",
            accepted: &["ab", "ac", "bc"],
            rejected: &["a", "b", "c", "abc", "bb", ""],
        },
    ];

    #[test]
    fn test_nfa_dfa_equivalence() {
        init();
        for data in TEST_DATA {
            let nfa = compile_pattern(data.pattern).unwrap();
            let dfa = CompiledDfa::from_nfa(&nfa).unwrap();
            for input in data.accepted.iter().chain(data.rejected.iter()) {
                assert_eq!(
                    nfa.simulate(input).accepted,
                    dfa.simulate(input).accepted,
                    "NFA and DFA disagree for pattern '{}' on '{}'",
                    data.pattern,
                    input
                );
            }
        }
    }

    #[test]
    fn test_minimization_preserves_language() {
        init();
        for data in TEST_DATA {
            let nfa = compile_pattern(data.pattern).unwrap();
            let dfa = CompiledDfa::from_nfa(&nfa).unwrap();
            let minimized = dfa.minimize().unwrap();
            assert!(minimized.state_count() <= dfa.state_count());
            for input in data.accepted.iter().chain(data.rejected.iter()) {
                assert_eq!(
                    dfa.simulate(input).accepted,
                    minimized.simulate(input).accepted,
                    "minimization changed the language of '{}' on '{}'",
                    data.pattern,
                    input
                );
            }
        }
    }

    #[test]
    fn test_minimization_idempotent() {
        init();
        let nfa = compile_pattern("(a|b)*abb").unwrap();
        let dfa = CompiledDfa::from_nfa(&nfa).unwrap();
        let once = dfa.minimize().unwrap();
        let twice = once.minimize().unwrap();
        assert_eq!(once.state_count(), twice.state_count());
    }

    #[test]
    fn test_simulate_records_path() {
        init();
        let nfa = compile_pattern("(a|b)*abb").unwrap();
        let dfa = CompiledDfa::from_nfa(&nfa).unwrap().minimize().unwrap();
        let run = dfa.simulate("abb");
        assert!(run.accepted);
        assert_eq!(run.steps, 3);
        assert_eq!(run.path.len(), 4);
        assert_eq!(run.path[0], 0);
        assert_eq!(run.configurations.len(), 4);
        assert!(dfa.is_accepting(*run.path.last().unwrap()));
    }

    #[test]
    fn test_simulate_missing_transition_keeps_partial_trace() {
        init();
        let nfa = compile_pattern("ab").unwrap();
        let dfa = CompiledDfa::from_nfa(&nfa).unwrap();
        let run = dfa.simulate("ax");
        assert!(!run.accepted);
        assert_eq!(run.steps, 2);
        // Only the successful first step appears in the path.
        assert_eq!(run.path.len(), 2);
        assert_eq!(run.configurations.last().unwrap().consumed, "a");
    }

    #[test]
    fn test_dfa_states_carry_nfa_origin() {
        init();
        let nfa = compile_pattern("ab").unwrap();
        let dfa = CompiledDfa::from_nfa(&nfa).unwrap();
        // Every subset construction state records its originating NFA state set.
        for state in 0..dfa.state_count() {
            assert!(!dfa.nfa_states_of(state).unwrap().is_empty());
        }
    }

    #[test]
    fn test_analyze_incomplete_dfa() {
        init();
        let nfa = compile_pattern("ab").unwrap();
        let dfa = CompiledDfa::from_nfa(&nfa).unwrap();
        let properties = dfa.analyze();
        assert_eq!(properties.state_count, 3);
        // State 1 has no transition for 'a' and the accepting state has none at all.
        assert!(!properties.is_complete);
        assert!(properties.unreachable_states.is_empty());
        assert!(properties.dead_states.is_empty());
    }

    #[test]
    fn test_nfa_dfa_equivalence_with_overlapping_classes() {
        init();
        // 'a' satisfies both the literal class and [ab]. The DFA must follow every
        // matching NFA transition at once, not just the first matching class.
        let nfa = compile_pattern("ab|[ab]c").unwrap();
        let dfa = CompiledDfa::from_nfa(&nfa).unwrap();
        let minimized = dfa.minimize().unwrap();
        assert!(dfa.simulate("ac").accepted);
        for input in ["ab", "ac", "bc", "a", "b", "c", "abc", "bb", ""] {
            let expected = nfa.simulate(input).accepted;
            assert_eq!(
                expected,
                dfa.simulate(input).accepted,
                "NFA and DFA disagree on '{}'",
                input
            );
            assert_eq!(
                expected,
                minimized.simulate(input).accepted,
                "NFA and minimized DFA disagree on '{}'",
                input
            );
        }
    }

    #[test]
    fn test_analyze_reports_unreachable_and_dead_states() {
        init();
        use crate::internal::dfa::DfaState;
        use crate::internal::{CharClassID, CharacterClassRegistry};
        use std::collections::{BTreeMap, BTreeSet};

        let a = ClassSignature::new(vec![CharClassID::new(0)]);
        let b = ClassSignature::new(vec![CharClassID::new(1)]);
        // State 2 is unreachable, state 3 is reachable but can never reach the
        // accepting state. Subset construction never produces such states.
        let dfa = Dfa {
            pattern: "handmade".to_string(),
            states: (0..4)
                .map(|i| DfaState::new(StateID::new(i), Vec::new()))
                .collect(),
            accepting_states: BTreeSet::from([StateID::new(1)]),
            alphabet: vec![a.clone(), b.clone()],
            transitions: BTreeMap::from([
                (
                    StateID::new(0),
                    BTreeMap::from([(a.clone(), StateID::new(1)), (b, StateID::new(3))]),
                ),
                (StateID::new(2), BTreeMap::from([(a, StateID::new(1))])),
            ]),
        };
        let compiled = CompiledDfa {
            dfa,
            registry: CharacterClassRegistry::new(),
            matchers: Vec::new(),
        };
        let properties = compiled.analyze();
        assert_eq!(properties.unreachable_states, vec![2]);
        assert_eq!(properties.dead_states, vec![3]);
        assert!(!properties.is_complete);
    }

    #[test]
    fn test_analyze_complete_single_class_dfa() {
        init();
        let nfa = compile_pattern("a*").unwrap();
        let dfa = CompiledDfa::from_nfa(&nfa).unwrap().minimize().unwrap();
        let properties = dfa.analyze();
        assert_eq!(properties.state_count, 1);
        assert!(properties.is_complete);
        assert_eq!(properties.accepting_state_count, 1);
    }
}
