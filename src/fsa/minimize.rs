//! DFA minimization by partition refinement

use super::state::{Fsa, State, StateId, TokenId};
use hashbrown::{HashMap, HashSet};

/// Partition index of every kept state
type Partitioning = HashMap<StateId, usize>;

impl Fsa {
    /// Build the minimal deterministic automaton matching the same tokens
    ///
    /// States from which no token can be accepted are dropped first, along
    /// with the transitions into them. The remaining states start out
    /// grouped by their accept sets and are split whenever members of a
    /// group lead to different groups on some character, until the number
    /// of groups stops changing. Each group then becomes one state. An
    /// automaton that still has epsilon edges is determinized first.
    ///
    /// The result is frozen and numbered breadth-first from the root, so
    /// minimizing it again yields an identical automaton.
    pub fn minimize(&self) -> Fsa {
        if !self.is_deterministic() {
            return self.to_deterministic().minimize();
        }

        let order = self.live_states();
        let (partitions, count) = self.refine(&order);
        let minimal = self.rebuild(&order, &partitions, count);

        log_debug!(
            "Minimized automaton: {} states -> {} states",
            order.len(),
            minimal.len()
        );
        minimal
    }

    /// Reachable states that lead to an accepting state, in reachable order
    ///
    /// The root is always kept.
    fn live_states(&self) -> Vec<StateId> {
        let order = self.reachable();
        let mut incoming: HashMap<StateId, Vec<StateId>> = HashMap::new();
        let mut pending = Vec::new();
        for &id in &order {
            let state = self.state(id);
            if state.accepts.iter().any(|&token| token > 0) {
                pending.push(id);
            }
            for &target in state.transitions.values() {
                incoming.entry(target).or_default().push(id);
            }
        }

        let mut live: HashSet<StateId> = pending.iter().copied().collect();
        while let Some(id) = pending.pop() {
            for &source in incoming.get(&id).into_iter().flatten() {
                if live.insert(source) {
                    pending.push(source);
                }
            }
        }

        order
            .into_iter()
            .filter(|id| *id == self.root || live.contains(id))
            .collect()
    }

    /// Transitions of `id` into kept states, with targets replaced by their group
    fn grouped_transitions(&self, id: StateId, partitions: &Partitioning) -> Vec<(char, usize)> {
        self.state(id)
            .sorted_transitions()
            .into_iter()
            .filter_map(|(c, target)| partitions.get(&target).map(|&group| (c, group)))
            .collect()
    }

    fn refine(&self, order: &[StateId]) -> (Partitioning, usize) {
        let mut by_accepts: HashMap<Vec<TokenId>, usize> = HashMap::new();
        let mut partitions: Partitioning = HashMap::with_capacity(order.len());
        for id in order {
            let next = by_accepts.len();
            let group = *by_accepts
                .entry(self.state(*id).accept_set())
                .or_insert(next);
            partitions.insert(*id, group);
        }
        let mut count = by_accepts.len();

        loop {
            let mut signatures: HashMap<(usize, Vec<(char, usize)>), usize> = HashMap::new();
            let mut refined: Partitioning = HashMap::with_capacity(order.len());
            for id in order {
                let edges = self.grouped_transitions(*id, &partitions);
                let next = signatures.len();
                let group = *signatures
                    .entry((partitions[id], edges))
                    .or_insert(next);
                refined.insert(*id, group);
            }

            partitions = refined;
            if signatures.len() == count {
                return (partitions, count);
            }
            count = signatures.len();
        }
    }

    fn rebuild(&self, order: &[StateId], partitions: &Partitioning, count: usize) -> Fsa {
        let mut states = vec![State::default(); count];
        let mut remapped = vec![false; self.len()];

        for id in order {
            if std::mem::replace(&mut remapped[id.index()], true) {
                continue;
            }
            let original = self.state(*id);
            let replacement = &mut states[partitions[id]];

            if replacement.letter.is_none() {
                replacement.letter = original.letter;
            }
            for token in &original.accepts {
                if !replacement.accepts.contains(token) {
                    replacement.accepts.push(*token);
                }
            }
            for (c, group) in self.grouped_transitions(*id, partitions) {
                let mapped = StateId::from(group);
                let previous = replacement.transitions.insert(c, mapped);
                debug_assert!(
                    previous.map_or(true, |p| p == mapped),
                    "partitions disagree on the target for '{}'",
                    c
                );
            }
        }

        for state in &mut states {
            state.accepts.sort_unstable();
        }

        let root = StateId::from(partitions[&self.root]);
        Fsa::from_states(states, root).compact()
    }
}
