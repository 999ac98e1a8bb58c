use std::cmp::Ordering;

use fixedbitset::FixedBitSet;
use tracing::trace;

use crate::alphabet::{Alphabet, SymbolOf};
use crate::dfa::{Dfa, StateId};
use crate::math;
use crate::oracle::Oracle;
use crate::show::Show;
use crate::word::{self, Word};

/// The observation table of the learner.
///
/// The table tracks a finite, prefix-closed set S of *access strings* (the
/// base), a finite, suffix-closed set E of *experiments*, and one observation
/// row for every word in S ∪ S·Σ. The row of a word `u` is a bitset whose
/// j-th bit records whether the target language contains `u·e_j`; two words
/// with equal rows are indistinguishable under the experiments collected so
/// far, which makes the rows an approximation of the Nerode congruence of the
/// target language.
///
/// Both S and E only ever grow. Every mutating operation immediately fills
/// the missing observations through the supplied oracle, so after any public
/// operation returns the table is completely filled.
pub struct ObservationTable<A: Alphabet> {
    alphabet: A,
    /// E, in insertion order. The first experiment is always ε.
    experiments: Vec<Word<SymbolOf<A>>>,
    /// S, in insertion order. Always contains ε and is prefix-closed.
    base: math::Set<Word<SymbolOf<A>>>,
    /// Observations for all of S ∪ S·Σ. Each row holds one bit per experiment.
    rows: math::Map<Word<SymbolOf<A>>, FixedBitSet>,
}

impl<A: Alphabet> ObservationTable<A> {
    /// Creates the initial table with S = E = {ε} and fills it.
    pub fn new<O: Oracle<Alphabet = A>>(alphabet: A, oracle: &O) -> Self {
        let mut table = Self {
            alphabet,
            experiments: vec![Word::new()],
            base: std::iter::once(Word::new()).collect(),
            rows: math::Map::default(),
        };
        table.fill(oracle);
        table.debug_verify();
        table
    }

    pub fn alphabet(&self) -> &A {
        &self.alphabet
    }

    /// The experiments E, in the order they were added.
    pub fn experiments(&self) -> &[Word<SymbolOf<A>>] {
        &self.experiments
    }

    /// Iterates over the access strings S, in the order they were added.
    pub fn base(&self) -> impl Iterator<Item = &Word<SymbolOf<A>>> {
        self.base.iter()
    }

    pub fn base_size(&self) -> usize {
        self.base.len()
    }

    /// The number of filled cells, i.e. |S ∪ S·Σ| · |E|.
    pub fn size(&self) -> usize {
        self.rows.len() * self.experiments.len()
    }

    fn row(&self, word: &[SymbolOf<A>]) -> &FixedBitSet {
        self.rows
            .get(word)
            .expect("all access strings and their extensions must have a row")
    }

    /// Materializes missing rows for S ∪ S·Σ and queries the oracle for every
    /// unfilled cell. Existing observations are never re-queried.
    fn fill<O: Oracle<Alphabet = A>>(&mut self, oracle: &O) {
        let base: Vec<_> = self.base.iter().cloned().collect();
        for s in &base {
            self.rows
                .entry(s.clone())
                .or_insert_with(|| FixedBitSet::with_capacity(0));
            for a in self.alphabet.universe() {
                self.rows
                    .entry(word::extended(s, a))
                    .or_insert_with(|| FixedBitSet::with_capacity(0));
            }
        }

        let columns = self.experiments.len();
        let experiments = &self.experiments;
        for (u, row) in self.rows.iter_mut() {
            let filled = row.len();
            if filled >= columns {
                continue;
            }
            row.grow(columns);
            for j in filled..columns {
                row.set(j, oracle.output(&word::concat(u, &experiments[j])));
            }
        }
    }

    /// Returns the length-lexicographically least one-symbol extension whose
    /// row matches no access string, or `None` if the table is closed.
    pub fn closing_witness(&self) -> Option<Word<SymbolOf<A>>> {
        let base_rows: math::Set<&FixedBitSet> = self.base.iter().map(|s| self.row(s)).collect();
        self.rows
            .iter()
            .filter(|(u, row)| !self.base.contains(*u) && !base_rows.contains(*row))
            .map(|(u, _)| u)
            .min_by(|u, v| word::cmp_length_lex(&self.alphabet, u, v))
            .cloned()
    }

    pub fn is_closed(&self) -> bool {
        self.closing_witness().is_none()
    }

    /// Promotes a border word to an access string and fills the rows of its
    /// one-symbol extensions.
    pub fn promote<O: Oracle<Alphabet = A>>(&mut self, witness: Word<SymbolOf<A>>, oracle: &O) {
        trace!("promoting {} to access string", word::as_string(&witness));
        debug_assert!(
            self.rows.contains_key(&witness),
            "only border words can be promoted"
        );
        let inserted = self.base.insert(witness);
        assert!(inserted, "word is already an access string");
        self.fill(oracle);
        self.debug_verify();
    }

    /// Searches for a pair of access strings with equal rows whose one-symbol
    /// extensions disagree. Returns the length-lexicographically least
    /// experiment `a·e` witnessing the disagreement, or `None` if the table
    /// is consistent.
    pub fn inconsistency(&self) -> Option<Word<SymbolOf<A>>> {
        let mut groups: math::Map<&FixedBitSet, Vec<&Word<SymbolOf<A>>>> = math::Map::default();
        for s in &self.base {
            groups.entry(self.row(s)).or_default().push(s);
        }

        let mut least: Option<Word<SymbolOf<A>>> = None;
        for members in groups.values().filter(|members| members.len() > 1) {
            let first = members[0];
            for other in &members[1..] {
                for a in self.alphabet.universe() {
                    let left = self.row(&word::extended(first, a));
                    let right = self.row(&word::extended(other, a));
                    if left == right {
                        continue;
                    }
                    for (j, experiment) in self.experiments.iter().enumerate() {
                        if left.contains(j) == right.contains(j) {
                            continue;
                        }
                        let candidate = word::concat(&[a], experiment);
                        let smaller = least.as_ref().map_or(true, |current| {
                            word::cmp_length_lex(&self.alphabet, &candidate, current)
                                == Ordering::Less
                        });
                        if smaller {
                            least = Some(candidate);
                        }
                    }
                }
            }
        }
        least
    }

    pub fn is_consistent(&self) -> bool {
        self.inconsistency().is_none()
    }

    /// Appends a distinguishing experiment to E and fills the new column.
    pub fn add_experiment<O: Oracle<Alphabet = A>>(
        &mut self,
        experiment: Word<SymbolOf<A>>,
        oracle: &O,
    ) {
        trace!("adding experiment {}", word::as_string(&experiment));
        debug_assert!(
            !self.experiments.contains(&experiment),
            "experiment is already present"
        );
        self.experiments.push(experiment);
        self.fill(oracle);
        self.debug_verify();
    }

    /// Adds every non-empty prefix of `counterexample` that is not yet an
    /// access string to S, shortest first, and fills the new rows. Absorbing
    /// all prefixes keeps S prefix-closed and carries every distinction the
    /// counterexample reveals into the table.
    pub fn absorb_counterexample<O: Oracle<Alphabet = A>>(
        &mut self,
        counterexample: &[SymbolOf<A>],
        oracle: &O,
    ) {
        trace!(
            "absorbing counterexample {}",
            word::as_string(counterexample)
        );
        for prefix in word::prefixes(counterexample) {
            if !self.base.contains(&prefix) {
                self.base.insert(prefix);
            }
        }
        self.fill(oracle);
        self.debug_verify();
    }

    /// Extracts the hypothesis automaton from a closed and consistent table.
    ///
    /// The states are the distinct rows of S; each is represented by its
    /// length-lexicographically least access string and the states are
    /// numbered in length-lexicographic order of those representatives, which
    /// puts ε (and with it the initial state) at index 0. Closedness makes
    /// the transition function total, consistency makes it independent of the
    /// chosen representative.
    pub fn extract_dfa(&self) -> Dfa<A> {
        if cfg!(debug_assertions) {
            assert!(self.is_closed(), "cannot extract from a non-closed table");
            assert!(
                self.is_consistent(),
                "cannot extract from an inconsistent table"
            );
        }

        let mut representatives: math::Map<&FixedBitSet, &Word<SymbolOf<A>>> =
            math::Map::default();
        for s in &self.base {
            match representatives.entry(self.row(s)) {
                indexmap::map::Entry::Occupied(mut entry) => {
                    if word::cmp_length_lex(&self.alphabet, s, entry.get()) == Ordering::Less {
                        entry.insert(s);
                    }
                }
                indexmap::map::Entry::Vacant(entry) => {
                    entry.insert(s);
                }
            }
        }

        let mut states: Vec<(&FixedBitSet, &Word<SymbolOf<A>>)> =
            representatives.into_iter().collect();
        states.sort_by(|(_, u), (_, v)| word::cmp_length_lex(&self.alphabet, u, v));
        let index: math::Map<&FixedBitSet, StateId> = states
            .iter()
            .enumerate()
            .map(|(i, (row, _))| (*row, i))
            .collect();

        let mut accepting = FixedBitSet::with_capacity(states.len());
        let mut transitions = Vec::with_capacity(states.len());
        for (i, (row, representative)) in states.iter().enumerate() {
            // the first experiment is ε, so bit 0 is membership of the
            // representative itself
            accepting.set(i, row.contains(0));
            let targets = self
                .alphabet
                .universe()
                .map(|a| {
                    let target = self.row(&word::extended(representative, a));
                    *index
                        .get(&target)
                        .expect("closedness guarantees a matching access string")
                })
                .collect();
            transitions.push(targets);
        }

        let empty: &[SymbolOf<A>] = &[];
        let initial = *index
            .get(&self.row(empty))
            .expect("ε is always an access string");
        debug_assert_eq!(initial, 0, "ε must be the least representative");

        let access = states
            .iter()
            .map(|(_, representative)| (*representative).clone())
            .collect();
        Dfa::from_parts(
            self.alphabet.clone(),
            initial,
            accepting,
            transitions,
            access,
        )
    }

    /// Structural integrity checks, compiled away outside of debug builds:
    /// S is prefix-closed, E is suffix-closed, every row of S ∪ S·Σ is
    /// present and completely filled.
    fn debug_verify(&self) {
        if !cfg!(debug_assertions) {
            return;
        }
        assert!(self.base.contains(&Word::new()), "ε must be in S");
        for s in &self.base {
            if !s.is_empty() {
                assert!(
                    self.base.contains(&s[..s.len() - 1]),
                    "S must be prefix-closed"
                );
            }
        }
        assert_eq!(self.experiments[0], Word::new(), "ε must be the first experiment");
        for e in &self.experiments {
            if !e.is_empty() {
                assert!(
                    self.experiments.contains(&e[1..].to_vec()),
                    "E must be suffix-closed"
                );
            }
        }
        for s in &self.base {
            for a in self.alphabet.universe() {
                assert!(
                    self.rows.contains_key(&word::extended(s, a)),
                    "all one-symbol extensions must have rows"
                );
            }
        }
        for row in self.rows.values() {
            assert_eq!(
                row.len(),
                self.experiments.len(),
                "all rows must be completely filled"
            );
        }
    }
}

impl<A: Alphabet> std::fmt::Debug for ObservationTable<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut builder = tabled::builder::Builder::default();
        let mut header = vec![String::new()];
        header.extend(self.experiments.iter().map(|e| word::as_string(e)));
        builder.push_record(header);
        for (u, row) in &self.rows {
            let label = if self.base.contains(u) {
                owo_colors::OwoColorize::blue(&word::as_string(u)).to_string()
            } else {
                word::as_string(u)
            };
            let mut record = vec![label];
            record.extend((0..self.experiments.len()).map(|j| row.contains(j).show()));
            builder.push_record(record);
        }
        write!(f, "{}", builder.build())
    }
}

#[cfg(test)]
mod tests {
    use crate::alphabet::CharAlphabet;
    use crate::oracle::{FnOracle, Oracle};

    use super::ObservationTable;

    fn ends_with_ab() -> FnOracle<CharAlphabet, impl Fn(&[char]) -> bool> {
        FnOracle::new(CharAlphabet::from("ab"), |word: &[char]| {
            word.ends_with(&['a', 'b'])
        })
    }

    #[test]
    fn initial_table() {
        let oracle = ends_with_ab();
        let table = ObservationTable::new(oracle.alphabet().clone(), &oracle);
        // rows for ε, a and b with the single experiment ε
        assert_eq!(table.size(), 3);
        assert_eq!(table.base_size(), 1);
        assert!(table.is_closed());
        assert!(table.is_consistent());

        let dfa = table.extract_dfa();
        assert_eq!(dfa.size(), 1);
        assert!(!dfa.accepts(&[]));
        assert!(!dfa.accepts(&['a', 'b']));
    }

    #[test]
    fn closing_promotes_novel_rows() {
        // contains at least one 'a'
        let oracle = FnOracle::new(CharAlphabet::from("ab"), |word: &[char]| {
            word.contains(&'a')
        });
        let mut table = ObservationTable::new(oracle.alphabet().clone(), &oracle);
        let witness = table.closing_witness().expect("row of 'a' is novel");
        assert_eq!(witness, vec!['a']);
        table.promote(witness, &oracle);
        assert!(table.is_closed());
        assert!(table.is_consistent());

        let dfa = table.extract_dfa();
        assert_eq!(dfa.size(), 2);
        assert!(dfa.accepts(&['b', 'a', 'b']));
        assert!(!dfa.accepts(&['b', 'b']));
    }

    #[test]
    fn consistency_appends_distinguishing_experiment() {
        let oracle = ends_with_ab();
        let mut table = ObservationTable::new(oracle.alphabet().clone(), &oracle);
        table.absorb_counterexample(&['a', 'b'], &oracle);
        assert_eq!(table.base_size(), 3);
        assert!(table.is_closed());

        // ε and 'a' share a row but differ after 'b': the experiment is b·ε
        let experiment = table.inconsistency().expect("ε and a are conflated");
        assert_eq!(experiment, vec!['b']);
        table.add_experiment(experiment, &oracle);
        assert!(table.is_closed());
        assert!(table.is_consistent());
    }

    #[test]
    fn extraction_uses_least_representatives() {
        let oracle = ends_with_ab();
        let mut table = ObservationTable::new(oracle.alphabet().clone(), &oracle);
        table.absorb_counterexample(&['a', 'b'], &oracle);
        table.add_experiment(vec!['b'], &oracle);

        let dfa = table.extract_dfa();
        assert_eq!(dfa.size(), 3);
        assert_eq!(dfa.initial(), 0);
        assert_eq!(dfa.access_string(0), &[] as &[char]);
        assert_eq!(dfa.access_string(1), &['a']);
        assert_eq!(dfa.access_string(2), &['a', 'b']);
        assert_eq!(dfa.successor(0, 'a'), 1);
        assert_eq!(dfa.successor(0, 'b'), 0);
        assert_eq!(dfa.successor(1, 'a'), 1);
        assert_eq!(dfa.successor(1, 'b'), 2);
        assert_eq!(dfa.successor(2, 'a'), 1);
        assert_eq!(dfa.successor(2, 'b'), 0);
        assert_eq!(dfa.accepting_states().collect::<Vec<_>>(), vec![2]);
        assert!(dfa.accepts(&['b', 'a', 'b']));
        assert!(!dfa.accepts(&['b', 'a']));
    }
}
