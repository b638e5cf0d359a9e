//! This module contains the DFA implementation.
//! The DFA is generated from the NFA using the subset construction algorithm and can be
//! minimized with Moore's partition refinement afterwards.
//! Transitions are keyed by class signatures, not by single character classes, so the
//! DFA stays equivalent to the NFA when character classes overlap.

use log::trace;
use std::collections::{BTreeMap, BTreeSet};

use crate::Result;

use super::{ClassSignature, ClosureCache, Nfa, StateID, StateIDBase};

// The type definitions for the subset construction algorithm.
pub(crate) type StateGroup = BTreeSet<StateID>;
pub(crate) type Partition = Vec<StateGroup>;
pub(crate) type TransitionMap = BTreeMap<StateID, BTreeMap<ClassSignature, StateID>>;

// The transitions of one DFA state projected onto partition groups. Two states with the
// same projection are indistinguishable in the current partition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct TransitionsToPartitionGroups(pub(crate) Vec<(ClassSignature, usize)>);

impl TransitionsToPartitionGroups {
    pub(crate) fn new() -> Self {
        TransitionsToPartitionGroups(Vec::new())
    }

    pub(crate) fn insert(&mut self, signature: ClassSignature, partition_group: usize) {
        self.0.push((signature, partition_group));
    }
}

/// The DFA implementation.
/// The DFA is created from an NFA using the subset construction algorithm.
/// It recognizes exactly one pattern.
#[derive(Debug, Default, Clone)]
pub(crate) struct Dfa {
    // The pattern the DFA recognizes.
    pub(crate) pattern: String,
    // The states of the DFA. The start state is always the first state in the vector, i.e. state 0.
    pub(crate) states: Vec<DfaState>,
    // The accepting states of the DFA.
    pub(crate) accepting_states: BTreeSet<StateID>,
    // The input alphabet: every realizable class signature of the compilation.
    pub(crate) alphabet: Vec<ClassSignature>,
    // The transitions of the DFA.
    pub(crate) transitions: TransitionMap,
}

impl Dfa {
    pub(crate) fn states(&self) -> &[DfaState] {
        &self.states
    }

    pub(crate) fn pattern(&self) -> &str {
        &self.pattern
    }

    pub(crate) fn alphabet(&self) -> &[ClassSignature] {
        &self.alphabet
    }

    #[inline]
    pub(crate) fn is_accepting(&self, state_id: StateID) -> bool {
        self.accepting_states.contains(&state_id)
    }

    pub(crate) fn transitions(&self) -> &TransitionMap {
        &self.transitions
    }

    /// Looks up the target state for a (state, signature) pair.
    /// A missing entry means the transition function is undefined here.
    #[inline]
    pub(crate) fn target_state(
        &self,
        state: StateID,
        signature: &ClassSignature,
    ) -> Option<StateID> {
        self.transitions
            .get(&state)
            .and_then(|t| t.get(signature))
            .copied()
    }

    /// Create a DFA from an NFA.
    /// For each signature of the alphabet the move set is the union of the moves over
    /// every class the signature contains, which is exactly the set of NFA transitions a
    /// matching character would take. The epsilon closures computed during the
    /// construction are cached per construction session.
    pub(crate) fn try_from_nfa(nfa: &Nfa, alphabet: &[ClassSignature]) -> Result<Self> {
        let mut closure_cache = ClosureCache::new();
        let mut dfa = Dfa {
            pattern: nfa.pattern().to_string(),
            alphabet: alphabet.to_vec(),
            ..Default::default()
        };
        let accepting_nfa_state = nfa.end_state();
        // The start state of the DFA is the epsilon closure of the start state of the NFA.
        let start_set = nfa.epsilon_closure_set(&[nfa.start_state()], &mut closure_cache);
        let initial_state = dfa.add_state_if_new(start_set, accepting_nfa_state);
        let mut work_list = vec![initial_state];
        dfa.states[initial_state].marked = true;

        while let Some(state_id) = work_list.pop() {
            let nfa_states = dfa.states[state_id].nfa_states.clone();
            for signature in alphabet {
                let mut move_set = Vec::new();
                for char_class in signature.classes() {
                    move_set.extend(nfa.move_set(&nfa_states, *char_class));
                }
                if move_set.is_empty() {
                    continue;
                }
                let target_set = nfa.epsilon_closure_set(&move_set, &mut closure_cache);
                let target_state = dfa.add_state_if_new(target_set, accepting_nfa_state);
                dfa.transitions
                    .entry(state_id)
                    .or_default()
                    .insert(signature.clone(), target_state);
                if !dfa.states[target_state].marked {
                    dfa.states[target_state].marked = true;
                    work_list.push(target_state);
                }
            }
        }

        trace!(
            "Subset construction: {} DFA states, {} closures computed",
            dfa.states.len(),
            closure_cache.computed()
        );

        Ok(dfa)
    }

    /// Add a state to the DFA if it does not already exist.
    /// The state is identified by the NFA states that constitute the DFA state.
    /// The NFA only has one accepting state, it is the end state of the NFA.
    pub(crate) fn add_state_if_new<I>(
        &mut self,
        nfa_states: I,
        accepting_nfa_state: StateID,
    ) -> StateID
    where
        I: IntoIterator<Item = StateID>,
    {
        let mut nfa_states: Vec<StateID> = nfa_states.into_iter().collect();
        nfa_states.sort_unstable();
        nfa_states.dedup();
        if let Some(state_id) = self
            .states
            .iter()
            .position(|state| state.nfa_states == nfa_states)
        {
            return StateID::new(state_id as StateIDBase);
        }

        let state_id = StateID::new(self.states.len() as StateIDBase);
        let state = DfaState::new(state_id, nfa_states);

        if state.nfa_states.contains(&accepting_nfa_state) {
            trace!("* State {} is an accepting state.", state_id.id());
            self.accepting_states.insert(state_id);
        }

        trace!("Add state: {}: {:?}", state.id.as_usize(), state.nfa_states);

        self.states.push(state);
        state_id
    }

    /// Add a representative state for a partition group.
    /// It is accepting if any state of its group is accepting.
    fn add_representative_state(
        &mut self,
        group: &BTreeSet<StateID>,
        accepting_states: &BTreeSet<StateID>,
    ) -> StateID {
        let state_id = StateID::new(self.states.len() as StateIDBase);
        let state = DfaState::new(state_id, Vec::new());

        for state_in_group in group.iter() {
            if accepting_states.contains(state_in_group) {
                trace!(
                    "* State {} is accepting state (from state {}).",
                    state_id.as_usize(),
                    state_in_group.as_usize()
                );
                self.accepting_states.insert(state_id);
            }
        }

        self.states.push(state);
        state_id
    }

    fn trace_partition(context: &str, partition: &[StateGroup]) {
        trace!("Partition {}:", context);
        for (i, group) in partition.iter().enumerate() {
            trace!("Group {}: {:?}", i, group);
        }
    }

    /// The set of states reachable from the start state by forward traversal of the
    /// transition function.
    pub(crate) fn reachable_states(&self) -> BTreeSet<StateID> {
        let mut reachable = BTreeSet::new();
        if self.states.is_empty() {
            return reachable;
        }
        let mut work_list = vec![StateID::new(0)];
        reachable.insert(StateID::new(0));
        while let Some(state_id) = work_list.pop() {
            if let Some(targets) = self.transitions.get(&state_id) {
                for target in targets.values() {
                    if reachable.insert(*target) {
                        work_list.push(*target);
                    }
                }
            }
        }
        reachable
    }

    /// The set of states from which some accepting state is reachable.
    /// States outside this set can never contribute to an accepted input.
    pub(crate) fn productive_states(&self) -> BTreeSet<StateID> {
        // Backward reachability from the accepting states to a fixed point.
        let mut productive: BTreeSet<StateID> = self.accepting_states.clone();
        let mut changed = true;
        while changed {
            changed = false;
            for (source, targets) in &self.transitions {
                if productive.contains(source) {
                    continue;
                }
                if targets.values().any(|t| productive.contains(t)) {
                    productive.insert(*source);
                    changed = true;
                }
            }
        }
        productive
    }

    /// Remove all states that are not reachable from the start state and renumber the
    /// remaining states. Transitions out of removed states are dropped with them.
    pub(crate) fn drop_unreachable_states(&self) -> Dfa {
        let reachable = self.reachable_states();
        if reachable.len() == self.states.len() {
            return self.clone();
        }
        trace!(
            "Dropping {} unreachable state(s)",
            self.states.len() - reachable.len()
        );
        let renumber: BTreeMap<StateID, StateID> = reachable
            .iter()
            .enumerate()
            .map(|(new_id, old_id)| (*old_id, StateID::new(new_id as StateIDBase)))
            .collect();
        let mut dfa = Dfa {
            pattern: self.pattern.clone(),
            alphabet: self.alphabet.clone(),
            ..Default::default()
        };
        for old_id in &reachable {
            let new_id = renumber[old_id];
            let mut state = DfaState::new(new_id, self.states[*old_id].nfa_states.clone());
            state.marked = true;
            dfa.states.push(state);
            if self.accepting_states.contains(old_id) {
                dfa.accepting_states.insert(new_id);
            }
            if let Some(targets) = self.transitions.get(old_id) {
                let renumbered = targets
                    .iter()
                    .map(|(signature, target)| (signature.clone(), renumber[target]))
                    .collect::<BTreeMap<_, _>>();
                dfa.transitions.insert(new_id, renumbered);
            }
        }
        dfa
    }

    /// Minimize the DFA.
    /// Unreachable states are dropped first so that the partition refinement only works
    /// on states that matter for the recognized language. The NFA states are not carried
    /// over into the minimized DFA states, they are not needed anymore.
    pub(crate) fn minimize(&self) -> Result<Self> {
        // Check in DEBUG mode that the DFA states have increasing ids.
        debug_assert!(self
            .states
            .iter()
            .enumerate()
            .all(|(i, state)| state.id.as_usize() == i));

        trace!("Minimize DFA ----------------------------");
        let dfa = self.drop_unreachable_states();
        let mut partition_old = dfa.calculate_initial_partition();
        Self::trace_partition("initial", &partition_old);
        let mut partition_new = Partition::new();
        let mut changed = true;

        while changed {
            partition_new = dfa.calculate_new_partition(&partition_old);
            Self::trace_partition("new", &partition_new);
            changed = partition_new != partition_old;
            partition_old.clone_from(&partition_new);
        }

        dfa.create_from_partition(&partition_new)
    }

    /// The start partition is created as follows:
    /// 1. The non-accepting states are put together in one group.
    /// 2. The accepting states are put together in a second group.
    ///
    /// Empty groups are not kept, e.g. when every state is accepting.
    fn calculate_initial_partition(&self) -> Partition {
        let mut group_non_accepting_states = StateGroup::new();
        let mut group_accepting_states = StateGroup::new();

        for state in &self.states {
            if self.is_accepting(state.id) {
                group_accepting_states.insert(state.id);
            } else {
                group_non_accepting_states.insert(state.id);
            }
        }
        let mut initial_partition = Partition::new();
        if !group_non_accepting_states.is_empty() {
            initial_partition.push(group_non_accepting_states);
        }
        if !group_accepting_states.is_empty() {
            initial_partition.push(group_accepting_states);
        }
        initial_partition
    }

    /// Calculate the new partition based on the old partition.
    /// We try to split the groups of the partition based on the transitions of the DFA.
    /// For each state in a group we check if the transitions to the groups of the old
    /// partition are the same. States with the same transitions stay together, states with
    /// different transitions are put into separate groups.
    fn calculate_new_partition(&self, partition: &[StateGroup]) -> Partition {
        let mut new_partition = Partition::new();
        for (index, group) in partition.iter().enumerate() {
            // The new group receives the states from the old group which are distinguishable from
            // the other states in group.
            self.split_group(index, group, partition)
                .into_iter()
                .for_each(|new_group| {
                    new_partition.push(new_group);
                });
        }
        new_partition
    }

    fn split_group(
        &self,
        group_index: usize,
        group: &StateGroup,
        partition: &[StateGroup],
    ) -> Partition {
        // If the group contains only one state, the group can't be split further.
        if group.len() == 1 {
            return vec![group.clone()];
        }
        trace!("Split group {}: {:?}", group_index, group);
        let mut transition_map_to_states: BTreeMap<TransitionsToPartitionGroups, StateGroup> =
            BTreeMap::new();
        for state_id in group {
            let transitions_to_partition =
                self.build_transitions_to_partition_group(*state_id, partition);
            transition_map_to_states
                .entry(transitions_to_partition)
                .or_default()
                .insert(*state_id);
        }
        transition_map_to_states
            .into_values()
            .collect::<Partition>()
    }

    /// Project the transitions of one state onto the partition groups of its targets.
    /// Used to decide distinguishability during refinement.
    fn build_transitions_to_partition_group(
        &self,
        state_id: StateID,
        partition: &[StateGroup],
    ) -> TransitionsToPartitionGroups {
        if let Some(transitions_of_state) = self.transitions.get(&state_id) {
            let mut transitions_to_partition_groups = TransitionsToPartitionGroups::new();
            for (signature, target) in transitions_of_state {
                if let Some(partition_group) = self.find_group(*target, partition) {
                    transitions_to_partition_groups.insert(signature.clone(), partition_group);
                }
            }
            transitions_to_partition_groups
        } else {
            trace!("** State {} has no transitions.", state_id.as_usize());
            TransitionsToPartitionGroups::new()
        }
    }

    fn find_group(&self, state_id: StateID, partition: &[StateGroup]) -> Option<usize> {
        partition.iter().position(|group| group.contains(&state_id))
    }

    /// Create a DFA from a partition.
    /// If a StateGroup contains more than one state, the states are merged into one state.
    /// The transitions and the accepting states are updated accordingly.
    fn create_from_partition(&self, partition: &[StateGroup]) -> Result<Dfa> {
        trace!("Create DFA ------------------------------");
        trace!("from partition {:?}", partition);
        let mut dfa = Dfa {
            pattern: self.pattern.clone(),
            alphabet: self.alphabet.clone(),
            transitions: self.transitions.clone(),
            ..Default::default()
        };

        // Reorder the groups so that the start state is in the first group (0).
        // The representative state of the first group must be the start state of the minimized DFA,
        // even after minimization.
        let mut partition = partition.to_vec();
        partition.sort_by(|a, b| {
            if a.contains(&StateID::new(0)) {
                return std::cmp::Ordering::Less;
            }
            if b.contains(&StateID::new(0)) {
                return std::cmp::Ordering::Greater;
            }
            std::cmp::Ordering::Equal
        });

        // Then add the representative states to the DFA from the groups.
        for group in &partition {
            // For each group we add a representative state to the DFA.
            // Its id is the index of the group in the partition.
            // This function also updates the accepting states of the DFA.
            dfa.add_representative_state(group, &self.accepting_states);
        }

        // Then renumber the states in the transitions.
        dfa.update_transitions(&partition);

        trace!("Minimized DFA:\n{}", dfa);

        Ok(dfa)
    }

    fn update_transitions(&mut self, partition: &[StateGroup]) {
        // Create a vector because we don't want to mess the transitions map while renumbering.
        let mut transitions = self
            .transitions
            .iter()
            .map(|(s, t)| (*s, t.clone()))
            .collect::<Vec<_>>();

        Self::merge_transitions(partition, &mut transitions);
        Self::renumber_states_in_transitions(partition, &mut transitions);

        self.transitions = transitions.into_iter().collect();
    }

    fn merge_transitions(
        partition: &[StateGroup],
        transitions: &mut Vec<(StateID, BTreeMap<ClassSignature, StateID>)>,
    ) {
        // Remove all transitions that do not belong to the representative states of a group.
        // The representative states are the first states in the groups.
        for group in partition {
            debug_assert!(!group.is_empty());
            if group.len() == 1 {
                continue;
            }
            let Some(representative_state_id) = group.first() else {
                continue;
            };
            for state_id in group.iter().skip(1) {
                Self::merge_transitions_of_state(*state_id, *representative_state_id, transitions);
            }
        }
    }

    fn merge_transitions_of_state(
        state_id: StateID,
        representative_state_id: StateID,
        transitions: &mut Vec<(StateID, BTreeMap<ClassSignature, StateID>)>,
    ) {
        if let Some(rep_pos) = transitions
            .iter()
            .position(|(s, _)| *s == representative_state_id)
        {
            let mut rep_trans = transitions[rep_pos].1.clone();
            if let Some(pos) = transitions.iter().position(|(s, _)| *s == state_id) {
                let (_, transitions_of_state) = &transitions[pos];
                for (signature, target_state) in transitions_of_state.iter() {
                    rep_trans.insert(signature.clone(), *target_state);
                }
                // Remove the transitions of the state that is merged into the representative state.
                transitions.remove(pos);
            }
            let rep_pos = transitions
                .iter()
                .position(|(s, _)| *s == representative_state_id)
                .unwrap_or(rep_pos);
            transitions[rep_pos].1 = rep_trans;
        } else if let Some(pos) = transitions.iter().position(|(s, _)| *s == state_id) {
            // The representative has no transitions of its own, adopt the merged ones.
            let (_, transitions_of_state) = &transitions[pos];
            let adopted = transitions_of_state.clone();
            transitions.remove(pos);
            transitions.push((representative_state_id, adopted));
        }
    }

    fn renumber_states_in_transitions(
        partition: &[StateGroup],
        transitions: &mut [(StateID, BTreeMap<ClassSignature, StateID>)],
    ) {
        let find_group_of_state = |state_id: StateID| -> StateID {
            for (group_id, group) in partition.iter().enumerate() {
                if group.contains(&state_id) {
                    return StateID::new(group_id as StateIDBase);
                }
            }
            debug_assert!(false, "state {} not found in partition", state_id);
            StateID::default()
        };

        for transition in transitions.iter_mut() {
            transition.0 = find_group_of_state(transition.0);
            for target_state in transition.1.values_mut() {
                *target_state = find_group_of_state(*target_state);
            }
        }
    }
}

impl std::fmt::Display for Dfa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "DFA")?;
        writeln!(f, "Pattern: {}", self.pattern)?;
        writeln!(f, "States:")?;
        for state in &self.states {
            writeln!(f, "{:?}", state)?;
        }
        writeln!(f, "Accepting states:")?;
        for state_id in &self.accepting_states {
            writeln!(f, "{}", state_id.id())?;
        }
        writeln!(f, "Transitions:")?;
        for (source_id, targets) in &self.transitions {
            write!(f, "{} -> ", source_id.as_usize())?;
            for (signature, target_id) in targets {
                write!(f, "{}:{}, ", signature, target_id.as_usize())?;
            }
            writeln!(f)?
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct DfaState {
    id: StateID,
    // The ids of the NFA states that constitute this DFA state. The ids can only be used as
    // indices into the NFA states.
    nfa_states: Vec<StateID>,
    // The marked flag is used to mark a state as visited during the subset construction algorithm.
    marked: bool,
}

impl DfaState {
    /// Create a new DFA state solely from the NFA states that constitute the DFA state.
    pub(crate) fn new(id: StateID, nfa_states: Vec<StateID>) -> Self {
        DfaState {
            id,
            nfa_states,
            ..Default::default()
        }
    }

    /// Get the id of the DFA state.
    pub(crate) fn id(&self) -> StateID {
        self.id
    }

    /// Get the NFA states that constitute the DFA state.
    pub(crate) fn nfa_states(&self) -> &[StateID] {
        &self.nfa_states
    }
}
