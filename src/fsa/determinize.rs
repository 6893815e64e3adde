//! Subset construction (NFA to DFA)

use super::state::{Fsa, State, StateId, TokenId};
use hashbrown::HashMap;
use std::collections::VecDeque;

/// Work state of one conversion
struct SubsetBuilder<'a> {
    nfa: &'a Fsa,
    states: Vec<State>,
    index: HashMap<Vec<StateId>, StateId>,
    queue: VecDeque<(StateId, Vec<StateId>)>,
    /// Closure reached from one NFA state on one character
    reach: HashMap<(StateId, char), Vec<StateId>>,
}

impl<'a> SubsetBuilder<'a> {
    fn new(nfa: &'a Fsa) -> Self {
        Self {
            nfa,
            states: Vec::new(),
            index: HashMap::new(),
            queue: VecDeque::new(),
            reach: HashMap::new(),
        }
    }

    /// Return the deterministic state for a sorted set of NFA states, creating it if new
    fn intern(&mut self, set: Vec<StateId>, letter: Option<char>) -> StateId {
        if let Some(&id) = self.index.get(&set) {
            return id;
        }

        let mut accepts: Vec<TokenId> = set
            .iter()
            .flat_map(|s| self.nfa.state(*s).accepts.iter().copied())
            .collect();
        accepts.sort_unstable();
        accepts.dedup();

        let id = StateId::from(self.states.len());
        self.states.push(State {
            letter,
            accepts,
            ..State::default()
        });
        self.index.insert(set.clone(), id);
        self.queue.push_back((id, set));
        id
    }

    fn step(&mut self, set: &[StateId], c: char) -> Vec<StateId> {
        let nfa = self.nfa;
        let mut target = Vec::new();
        for &state in set {
            let reached = self.reach.entry((state, c)).or_insert_with(|| {
                nfa.state(state)
                    .transitions
                    .get(&c)
                    .map(|next| nfa.epsilon_closure(&[*next]))
                    .unwrap_or_default()
            });
            target.extend_from_slice(reached.as_slice());
        }
        target.sort_unstable();
        target.dedup();
        target
    }

    fn run(mut self) -> Fsa {
        let mut initial = self.nfa.epsilon_closure(&[self.nfa.root]);
        initial.sort_unstable();
        self.intern(initial, None);

        while let Some((id, set)) = self.queue.pop_front() {
            let mut alphabet: Vec<char> = set
                .iter()
                .flat_map(|s| self.nfa.state(*s).transitions.keys().copied())
                .collect();
            alphabet.sort_unstable();
            alphabet.dedup();

            for c in alphabet {
                let target = self.step(&set, c);
                let next = self.intern(target, Some(c));
                self.states[id.index()].transitions.insert(c, next);
            }
        }

        Fsa::from_states(self.states, StateId(0))
    }
}

impl Fsa {
    /// Convert to an equivalent deterministic automaton
    ///
    /// Breadth-first subset construction from the epsilon closure of the
    /// root. Each distinct set of reachable states becomes one state whose
    /// accept set is the union of its members'. The result has no epsilon
    /// edges, matches exactly what `self` matches, and is frozen. `self` is
    /// not modified.
    pub fn to_deterministic(&self) -> Fsa {
        let dfa = SubsetBuilder::new(self).run();
        log_debug!(
            "Determinized automaton: {} states -> {} states",
            self.len(),
            dfa.len()
        );
        dfa
    }
}
