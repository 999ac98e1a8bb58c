use std::collections::VecDeque;

use fixedbitset::FixedBitSet;
use itertools::Itertools;

use crate::alphabet::{Alphabet, CharAlphabet, SymbolOf};
use crate::math;
use crate::show::Show;
use crate::word::{self, Word};

/// Index of a state in a [`Dfa`]. States are numbered contiguously from 0.
pub type StateId = usize;

/// A deterministic finite automaton with complete transition function.
///
/// The transition graph may be cyclic, so it is stored as an index-based
/// adjacency table: entry `(q, i)` holds the successor of state `q` under the
/// `i`-th symbol of the alphabet. Every state carries the access string it was
/// constructed from, which makes the automaton self-describing for renderers
/// and diagnostics.
///
/// A [`Dfa`] is a value: it has no interior mutability and
/// [`accepts`](Dfa::accepts) is a pure function of the word and the automaton.
#[derive(Clone, PartialEq, Eq)]
pub struct Dfa<A: Alphabet = CharAlphabet> {
    alphabet: A,
    initial: StateId,
    accepting: FixedBitSet,
    transitions: Vec<Vec<StateId>>,
    access: Vec<Word<SymbolOf<A>>>,
}

impl<A: Alphabet> Dfa<A> {
    /// Assembles a [`Dfa`] from its parts, verifying that the transition
    /// table is total and well-formed.
    pub fn from_parts(
        alphabet: A,
        initial: StateId,
        accepting: FixedBitSet,
        transitions: Vec<Vec<StateId>>,
        access: Vec<Word<SymbolOf<A>>>,
    ) -> Self {
        let states = transitions.len();
        assert!(states > 0, "automaton must have at least one state");
        assert!(initial < states, "initial state out of range");
        assert_eq!(access.len(), states, "every state needs an access string");
        assert!(accepting.len() <= states, "accepting set out of range");
        for row in &transitions {
            assert_eq!(
                row.len(),
                alphabet.size(),
                "transition function must be total"
            );
            assert!(row.iter().all(|q| *q < states), "transition out of range");
        }
        let mut accepting = accepting;
        accepting.grow(states);
        Self {
            alphabet,
            initial,
            accepting,
            transitions,
            access,
        }
    }

    pub fn alphabet(&self) -> &A {
        &self.alphabet
    }

    /// Returns the number of states.
    pub fn size(&self) -> usize {
        self.transitions.len()
    }

    pub fn initial(&self) -> StateId {
        self.initial
    }

    pub fn is_accepting(&self, state: StateId) -> bool {
        self.accepting.contains(state)
    }

    /// Returns an iterator over all state indices.
    pub fn states(&self) -> std::ops::Range<StateId> {
        0..self.size()
    }

    /// Returns an iterator over the indices of all accepting states.
    pub fn accepting_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.accepting.ones()
    }

    /// The access string a state was constructed from; the shortest, then
    /// lexicographically least word reaching the state.
    pub fn access_string(&self, state: StateId) -> &[SymbolOf<A>] {
        &self.access[state]
    }

    /// The successor of `state` under `symbol`. Panics if the symbol does not
    /// belong to the alphabet.
    pub fn successor(&self, state: StateId, symbol: SymbolOf<A>) -> StateId {
        let position = self
            .alphabet
            .position(symbol)
            .expect("symbol does not exist");
        self.transitions[state][position]
    }

    pub(crate) fn successor_by_position(&self, state: StateId, position: usize) -> StateId {
        self.transitions[state][position]
    }

    /// Runs the automaton on `word` starting in `source` and returns the state
    /// it ends up in. Time is linear in the length of the word.
    pub fn reached_from(&self, source: StateId, word: &[SymbolOf<A>]) -> StateId {
        word.iter().fold(source, |q, &a| self.successor(q, a))
    }

    /// Runs the automaton on `word` from the initial state.
    pub fn reached(&self, word: &[SymbolOf<A>]) -> StateId {
        self.reached_from(self.initial, word)
    }

    /// Returns true iff the automaton accepts the given word.
    pub fn accepts(&self, word: &[SymbolOf<A>]) -> bool {
        self.is_accepting(self.reached(word))
    }

    /// Iterates over all transitions as `(source, symbol, target)` triples, in
    /// state and then alphabet order. This is the shape a renderer consumes.
    pub fn transitions(&self) -> impl Iterator<Item = (StateId, SymbolOf<A>, StateId)> + '_ {
        self.states().flat_map(move |q| {
            self.alphabet
                .universe()
                .enumerate()
                .map(move |(i, a)| (q, a, self.transitions[q][i]))
        })
    }

    /// Checks whether `self` and `other` accept the same language, by a
    /// breadth-first traversal of the synchronous product of the two
    /// automata. Both must be over the same alphabet.
    pub fn equivalent(&self, other: &Dfa<A>) -> bool {
        assert_eq!(
            self.alphabet.size(),
            other.alphabet.size(),
            "cannot compare automata over different alphabets"
        );
        let mut seen = math::Set::default();
        let mut queue = VecDeque::from([(self.initial, other.initial)]);
        seen.insert((self.initial, other.initial));
        while let Some((q, p)) = queue.pop_front() {
            if self.is_accepting(q) != other.is_accepting(p) {
                return false;
            }
            for i in 0..self.alphabet.size() {
                let successor = (self.transitions[q][i], other.transitions[p][i]);
                if seen.insert(successor) {
                    queue.push_back(successor);
                }
            }
        }
        true
    }

    fn state_label(&self, state: StateId) -> String {
        let mut label = format!("q{state}");
        if state == self.initial {
            label = format!("→{label}");
        }
        if self.is_accepting(state) {
            label.push('*');
        }
        label
    }
}

impl<A: Alphabet> std::fmt::Display for Dfa<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DFA with {} states, initial q{}, accepting {{{}}}",
            self.size(),
            self.initial,
            self.accepting_states().map(|q| format!("q{q}")).join(", ")
        )
    }
}

impl<A: Alphabet> std::fmt::Debug for Dfa<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut builder = tabled::builder::Builder::default();
        let mut header = vec!["state".to_string(), "access".to_string()];
        header.extend(self.alphabet.universe().map(|a| a.show()));
        builder.push_record(header);
        for q in self.states() {
            let mut record = vec![self.state_label(q), word::as_string(&self.access[q])];
            record.extend(self.transitions[q].iter().map(|t| format!("q{t}")));
            builder.push_record(record);
        }
        write!(f, "{}", builder.build())
    }
}

#[cfg(test)]
mod tests {
    use fixedbitset::FixedBitSet;
    use itertools::Itertools;

    use super::Dfa;
    use crate::alphabet::CharAlphabet;

    /// DFA accepting words with an even number of 'a' and an even number
    /// of 'b'. State encoding: 0 = (even, even), 1 = (odd, even),
    /// 2 = (even, odd), 3 = (odd, odd).
    fn even_even() -> Dfa {
        let mut accepting = FixedBitSet::with_capacity(4);
        accepting.set(0, true);
        Dfa::from_parts(
            CharAlphabet::from("ab"),
            0,
            accepting,
            vec![vec![1, 2], vec![0, 3], vec![3, 0], vec![2, 1]],
            vec![vec![], vec!['a'], vec!['b'], vec!['a', 'b']],
        )
    }

    #[test]
    fn running_words() {
        let dfa = even_even();
        assert_eq!(dfa.size(), 4);
        assert!(dfa.accepts(&[]));
        assert!(dfa.accepts(&['a', 'a', 'b', 'b']));
        assert!(dfa.accepts(&['a', 'b', 'b', 'a']));
        assert!(!dfa.accepts(&['a']));
        assert!(!dfa.accepts(&['a', 'b', 'b']));
        assert_eq!(dfa.reached(&['a', 'b']), 3);
        assert_eq!(dfa.reached_from(3, &['b']), 1);
    }

    #[test]
    fn describing_transitions() {
        let dfa = even_even();
        let triples = dfa.transitions().collect_vec();
        assert_eq!(triples.len(), 8);
        assert_eq!(triples[0], (0, 'a', 1));
        assert_eq!(triples[7], (3, 'b', 1));
        assert_eq!(dfa.accepting_states().collect_vec(), vec![0]);
        assert_eq!(dfa.access_string(3), &['a', 'b']);
    }

    #[test]
    fn product_equivalence() {
        let dfa = even_even();
        assert!(dfa.equivalent(&dfa.clone()));

        // same language, redundantly many states: an extra bit that never flips
        let mut accepting = FixedBitSet::with_capacity(8);
        accepting.set(0, true);
        let doubled = Dfa::from_parts(
            CharAlphabet::from("ab"),
            0,
            accepting,
            (0..8).map(|s| vec![s ^ 1, s ^ 2]).collect(),
            (0..8).map(|_| vec![]).collect(),
        );
        assert!(dfa.equivalent(&doubled));

        let mut rejecting_everything = even_even();
        rejecting_everything.accepting.set(0, false);
        assert!(!dfa.equivalent(&rejecting_everything));
    }
}
