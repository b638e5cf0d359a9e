use rustc_hash::FxHashMap;

use super::StateID;

/// A cache for epsilon closures keyed by the sorted state-id set they were
/// computed from. One cache exists per simulation run or per subset
/// construction session; caches are never shared between sessions.
#[derive(Debug, Default)]
pub(crate) struct ClosureCache {
    closures: FxHashMap<Vec<StateID>, Vec<StateID>>,
    computed: usize,
}

impl ClosureCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Looks up the closure for the given sorted state set.
    pub(crate) fn get(&self, states: &[StateID]) -> Option<&Vec<StateID>> {
        self.closures.get(states)
    }

    /// Stores a freshly computed closure and counts it.
    pub(crate) fn insert(&mut self, states: Vec<StateID>, closure: Vec<StateID>) {
        self.computed += 1;
        self.closures.insert(states, closure);
    }

    /// The number of closures that had to be computed, i.e. cache misses.
    pub(crate) fn computed(&self) -> usize {
        self.computed
    }
}
