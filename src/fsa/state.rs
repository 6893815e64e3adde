//! Automaton states and the state arena
//!
//! An [`Fsa`] owns every state it contains in a flat arena. States refer to
//! each other through [`StateId`] handles, so cyclic graphs (as produced by
//! `+`, `*` and bounded repetition) need no shared ownership.

use hashbrown::{HashMap, HashSet};
use std::collections::VecDeque;
use std::hash::{BuildHasher, Hash, Hasher};

/// Identifier of a token accepted by an automaton
///
/// Positive values are user tokens; lower values win ties at equal match
/// length. See [`NO_MATCH`], [`END_OF_INPUT`] and [`DISCARD_TOKEN`].
pub type TokenId = i32;

/// Token id returned when no accepting state was reached
pub const NO_MATCH: TokenId = 0;

/// Token id reported by token streams at the end of the source text
pub const END_OF_INPUT: TokenId = -1;

/// Conventional token id for discardable tokens such as whitespace
pub const DISCARD_TOKEN: TokenId = 9999;

/// Handle of a state inside an [`Fsa`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub u32);

impl StateId {
    /// Position of the state in its arena
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for StateId {
    #[inline]
    fn from(index: usize) -> Self {
        StateId(index as u32)
    }
}

/// A single automaton state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    /// Character consumed to arrive at this state (diagnostic only)
    pub letter: Option<char>,
    /// Deterministic edges, one target per character
    pub transitions: HashMap<char, StateId>,
    /// States reachable without consuming input
    pub epsilon: Vec<StateId>,
    /// Tokens accepted when this state is reached
    pub accepts: Vec<TokenId>,
}

impl State {
    /// Create an empty state
    pub fn new(letter: Option<char>) -> Self {
        Self {
            letter,
            ..Self::default()
        }
    }

    /// Whether reaching this state accepts at least one token
    #[inline]
    pub fn is_accepting(&self) -> bool {
        !self.accepts.is_empty()
    }

    /// Lowest accepted token id, the one that wins an ambiguous match
    #[inline]
    pub fn best_accept(&self) -> Option<TokenId> {
        self.accepts.iter().copied().min()
    }

    /// Outgoing transitions ordered by character
    pub fn sorted_transitions(&self) -> Vec<(char, StateId)> {
        let mut edges: Vec<(char, StateId)> =
            self.transitions.iter().map(|(c, t)| (*c, *t)).collect();
        edges.sort_unstable_by_key(|(c, _)| *c);
        edges
    }

    /// Accepted ids, sorted and deduplicated
    pub fn accept_set(&self) -> Vec<TokenId> {
        let mut accepts = self.accepts.clone();
        accepts.sort_unstable();
        accepts.dedup();
        accepts
    }
}

/// Lifecycle phase of an automaton
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Patterns may still be added with [`Fsa::build`]
    Building,
    /// The graph is final; it can be searched, converted and serialized
    Frozen,
}

/// A finite state automaton, deterministic or not
///
/// A fresh automaton has a single, empty root state and is in the
/// [`Phase::Building`] phase. Patterns are compiled into it with
/// [`Fsa::build`]; the result can be searched directly or converted with
/// [`Fsa::to_deterministic`] and [`Fsa::minimize`], which return frozen
/// automata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fsa {
    pub(crate) states: Vec<State>,
    pub(crate) root: StateId,
    pub(crate) phase: Phase,
}

impl Default for Fsa {
    fn default() -> Self {
        Self::new()
    }
}

impl Fsa {
    /// Create an automaton with an empty root state
    pub fn new() -> Self {
        Self {
            states: vec![State::new(None)],
            root: StateId(0),
            phase: Phase::Building,
        }
    }

    /// Assemble a frozen automaton from already connected states
    pub(crate) fn from_states(states: Vec<State>, root: StateId) -> Self {
        Self {
            states,
            root,
            phase: Phase::Frozen,
        }
    }

    /// The start state
    #[inline]
    pub fn root(&self) -> StateId {
        self.root
    }

    /// Look up a state by handle
    ///
    /// # Panics
    ///
    /// Panics if the handle does not belong to this automaton.
    #[inline]
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    /// Look up a state by handle, returning `None` for foreign handles
    #[inline]
    pub fn get(&self, id: StateId) -> Option<&State> {
        self.states.get(id.index())
    }

    /// Number of states in the arena, including unreachable ones
    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// An automaton always has a root, so this is never true
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Iterate over `(handle, state)` pairs in arena order
    pub fn states(&self) -> impl Iterator<Item = (StateId, &State)> {
        self.states
            .iter()
            .enumerate()
            .map(|(i, s)| (StateId::from(i), s))
    }

    /// Current lifecycle phase
    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the automaton can no longer be extended
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.phase == Phase::Frozen
    }

    /// Stop accepting new patterns
    pub fn freeze(&mut self) {
        self.phase = Phase::Frozen;
    }

    /// Whether no state has epsilon edges
    pub fn is_deterministic(&self) -> bool {
        self.states.iter().all(|s| s.epsilon.is_empty())
    }

    /// Every token id accepted anywhere in the automaton, sorted
    pub fn token_ids(&self) -> Vec<TokenId> {
        let mut ids: Vec<TokenId> = self
            .states
            .iter()
            .flat_map(|s| s.accepts.iter().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    // ========================================================================
    // Graph mutation (used by the pattern compiler)
    // ========================================================================

    pub(crate) fn add_state(&mut self, letter: Option<char>) -> StateId {
        let id = StateId::from(self.states.len());
        self.states.push(State::new(letter));
        id
    }

    pub(crate) fn add_epsilon(&mut self, from: StateId, to: StateId) {
        let epsilon = &mut self.states[from.index()].epsilon;
        if !epsilon.contains(&to) {
            epsilon.push(to);
        }
    }

    pub(crate) fn add_accept(&mut self, id: StateId, token: TokenId) {
        let accepts = &mut self.states[id.index()].accepts;
        if !accepts.contains(&token) {
            accepts.push(token);
        }
    }

    /// Connect `from` to `target` on `c`
    ///
    /// An existing edge on the same character is kept; the new edge is placed
    /// on a fresh state joined to `from` by an epsilon edge instead.
    pub(crate) fn connect(&mut self, from: StateId, c: char, target: StateId) {
        if self.states[from.index()].transitions.contains_key(&c) {
            let branch = self.add_state(None);
            self.states[branch.index()].transitions.insert(c, target);
            self.add_epsilon(from, branch);
        } else {
            self.states[from.index()].transitions.insert(c, target);
        }
    }

    /// Add a transition on `c` to a new state and return that state
    pub(crate) fn add_transition(&mut self, from: StateId, c: char) -> StateId {
        let target = self.add_state(Some(c));
        self.connect(from, c, target);
        target
    }

    /// Join several states into one through epsilon edges
    pub(crate) fn merge(&mut self, frontier: &[StateId]) -> StateId {
        let merged = self.add_state(None);
        for &state in frontier {
            self.add_epsilon(state, merged);
        }
        merged
    }

    /// Move the outgoing edges of `source` onto `target`
    pub(crate) fn splice(&mut self, source: StateId, target: StateId) {
        let moved = std::mem::take(&mut self.states[source.index()]);
        let mut edges: Vec<(char, StateId)> = moved.transitions.into_iter().collect();
        edges.sort_unstable_by_key(|(c, _)| *c);
        for (c, next) in edges {
            self.connect(target, c, next);
        }
        for next in moved.epsilon {
            self.add_epsilon(target, next);
        }
        for token in moved.accepts {
            self.add_accept(target, token);
        }
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// States reachable from `seeds` without consuming input, seeds included
    ///
    /// The result is deduplicated and keeps discovery order.
    pub fn epsilon_closure(&self, seeds: &[StateId]) -> Vec<StateId> {
        let mut seen: HashSet<StateId> = HashSet::with_capacity(seeds.len() * 2);
        let mut closure = Vec::with_capacity(seeds.len());
        let mut stack: Vec<StateId> = seeds.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            closure.push(id);
            for &next in self.states[id.index()].epsilon.iter().rev() {
                if !seen.contains(&next) {
                    stack.push(next);
                }
            }
        }
        closure
    }

    /// States reachable from the root, in breadth-first order
    ///
    /// Edges are followed in character order, then epsilon order, so the
    /// listing is stable across runs.
    pub fn reachable(&self) -> Vec<StateId> {
        let mut seen: HashSet<StateId> = HashSet::with_capacity(self.states.len());
        let mut order = Vec::with_capacity(self.states.len());
        let mut queue = VecDeque::new();

        seen.insert(self.root);
        queue.push_back(self.root);
        while let Some(id) = queue.pop_front() {
            order.push(id);
            let state = &self.states[id.index()];
            let next = state
                .sorted_transitions()
                .into_iter()
                .map(|(_, t)| t)
                .chain(state.epsilon.iter().copied());
            for target in next {
                if seen.insert(target) {
                    queue.push_back(target);
                }
            }
        }
        order
    }

    /// Copy of the automaton without unreachable states
    ///
    /// States are renumbered breadth-first from the root, which becomes
    /// state 0. The phase is preserved.
    pub fn compact(&self) -> Fsa {
        let order = self.reachable();
        let renumber: HashMap<StateId, StateId> = order
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, StateId::from(i)))
            .collect();

        let states = order
            .iter()
            .map(|id| {
                let old = &self.states[id.index()];
                State {
                    letter: old.letter,
                    transitions: old
                        .transitions
                        .iter()
                        .map(|(c, t)| (*c, renumber[t]))
                        .collect(),
                    epsilon: old.epsilon.iter().map(|t| renumber[t]).collect(),
                    accepts: old.accepts.clone(),
                }
            })
            .collect();

        Fsa {
            states,
            root: StateId(0),
            phase: self.phase,
        }
    }

    /// Stable structural hash of the reachable graph
    ///
    /// Two automata with the same shape (up to state numbering) and the same
    /// accept sets hash equal. Letters are not part of the fingerprint.
    pub fn fingerprint(&self) -> u64 {
        let hasher_state = ahash::RandomState::with_seeds(
            0x243f_6a88_85a3_08d3,
            0x1319_8a2e_0370_7344,
            0xa409_3822_299f_31d0,
            0x082e_fa98_ec4e_6c89,
        );
        let mut hasher = hasher_state.build_hasher();

        let order = self.reachable();
        let position: HashMap<StateId, usize> =
            order.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        order.len().hash(&mut hasher);
        for id in &order {
            let state = &self.states[id.index()];
            state.accept_set().hash(&mut hasher);
            for (c, target) in state.sorted_transitions() {
                c.hash(&mut hasher);
                position[&target].hash(&mut hasher);
            }
            0xffu8.hash(&mut hasher);
            for target in &state.epsilon {
                position[target].hash(&mut hasher);
            }
            0xfeu8.hash(&mut hasher);
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_fsa_has_root() {
        let fsa = Fsa::new();
        assert_eq!(fsa.len(), 1);
        assert_eq!(fsa.root(), StateId(0));
        assert_eq!(fsa.phase(), Phase::Building);
        assert!(fsa.is_deterministic());
    }

    #[test]
    fn test_add_transition_conflict_branches() {
        let mut fsa = Fsa::new();
        let root = fsa.root();
        let first = fsa.add_transition(root, 'a');
        let second = fsa.add_transition(root, 'a');

        assert_eq!(fsa.state(root).transitions[&'a'], first);
        assert_eq!(fsa.state(root).epsilon.len(), 1);
        let branch = fsa.state(root).epsilon[0];
        assert_eq!(fsa.state(branch).transitions[&'a'], second);
        assert!(!fsa.is_deterministic());
    }

    #[test]
    fn test_epsilon_closure_handles_cycles() {
        let mut fsa = Fsa::new();
        let root = fsa.root();
        let a = fsa.add_state(None);
        let b = fsa.add_state(None);
        fsa.add_epsilon(root, a);
        fsa.add_epsilon(a, b);
        fsa.add_epsilon(b, root);

        let closure = fsa.epsilon_closure(&[root]);
        assert_eq!(closure, vec![root, a, b]);
    }

    #[test]
    fn test_reachable_skips_orphans() {
        let mut fsa = Fsa::new();
        let root = fsa.root();
        let x = fsa.add_transition(root, 'x');
        let orphan = fsa.add_state(None);
        fsa.add_accept(x, 1);

        let reachable = fsa.reachable();
        assert_eq!(reachable, vec![root, x]);
        assert!(!reachable.contains(&orphan));

        let compacted = fsa.compact();
        assert_eq!(compacted.len(), 2);
        assert_eq!(compacted.state(StateId(1)).accepts, vec![1]);
    }

    #[test]
    fn test_fingerprint_ignores_numbering() {
        let mut a = Fsa::new();
        let ra = a.root();
        a.add_state(None);
        let xa = a.add_transition(ra, 'x');
        a.add_accept(xa, 3);

        let mut b = Fsa::new();
        let rb = b.root();
        let xb = b.add_transition(rb, 'x');
        b.add_accept(xb, 3);

        assert_eq!(a.fingerprint(), b.fingerprint());

        b.add_accept(xb, 4);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_accept_set_sorted() {
        let mut state = State::new(None);
        state.accepts = vec![5, 2, 5, 1];
        assert_eq!(state.accept_set(), vec![1, 2, 5]);
        assert_eq!(state.best_accept(), Some(1));
    }
}
