use thiserror::Error;
use tracing::{debug, info, trace};

use crate::alphabet::Alphabet;
use crate::dfa::Dfa;
use crate::oracle::{Cached, Oracle};
use crate::search;
use crate::show::Show;
use crate::table::ObservationTable;
use crate::word;

/// Default number of membership queries the simulated equivalence check may
/// spend per hypothesis.
pub const DEFAULT_MAX_CE_SEARCHES: usize = 100_000;

/// Hard cap on refinement rounds. Termination is guaranteed by the search
/// budget for any deterministic oracle, so hitting this indicates an oracle
/// that changes its answers.
const ITERATION_THRESHOLD: usize = 100_000;

/// The ways learning can be rejected before it starts. All of these are
/// detected before the oracle is queried even once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LStarError {
    #[error("alphabet must contain at least one symbol")]
    EmptyAlphabet,
    #[error("alphabet contains duplicate symbol {0}")]
    DuplicateSymbol(String),
    #[error("maximum counterexample length must be at least 2, got {0}")]
    InvalidCounterexampleLength(usize),
    #[error("counterexample search budget must be positive")]
    InvalidSearchBudget,
}

/// An implementation of the L* algorithm for learning a minimal DFA from
/// membership queries alone.
///
/// The learner drives an [`ObservationTable`] until it is closed and
/// consistent, extracts a hypothesis [`Dfa`] and then plays its own
/// equivalence teacher: it exhaustively compares the hypothesis against the
/// oracle on all words up to a budget-derived length. A disagreement is
/// absorbed into the table and the refinement starts over; if the bounded
/// search finds none, the hypothesis is the result.
///
/// Every membership query goes through a [`Cached`] adapter, so the
/// underlying oracle sees each distinct word at most once. All tie-breaks are
/// resolved in length-then-lexicographic order with respect to the alphabet,
/// which makes the produced automaton a pure function of the oracle, the
/// alphabet and the budgets.
pub struct LStar<A: Alphabet, O: Oracle<Alphabet = A>> {
    alphabet: A,
    oracle: Cached<O>,
    max_ce_len: Option<usize>,
    max_ce_searches: usize,
}

impl<A: Alphabet, O: Oracle<Alphabet = A>> LStar<A, O> {
    /// Sets up a learner over the given alphabet and oracle, with default
    /// budgets. Fails if the alphabet is empty or contains a duplicate.
    pub fn new(alphabet: A, oracle: O) -> Result<Self, LStarError> {
        if alphabet.is_empty() {
            return Err(LStarError::EmptyAlphabet);
        }
        if let Some(duplicate) = alphabet.find_duplicate() {
            return Err(LStarError::DuplicateSymbol(duplicate.show()));
        }
        Ok(Self {
            alphabet,
            oracle: Cached::new(oracle),
            max_ce_len: None,
            max_ce_searches: DEFAULT_MAX_CE_SEARCHES,
        })
    }

    /// Bounds the length of counterexamples the simulated equivalence check
    /// may try. Must be at least 2; words of length 0 and 1 are always
    /// covered by the observation table itself.
    pub fn with_max_ce_len(mut self, max_ce_len: usize) -> Result<Self, LStarError> {
        if max_ce_len < 2 {
            return Err(LStarError::InvalidCounterexampleLength(max_ce_len));
        }
        self.max_ce_len = Some(max_ce_len);
        Ok(self)
    }

    /// Bounds the number of membership queries the simulated equivalence
    /// check may spend per hypothesis. Must be positive.
    pub fn with_max_ce_searches(mut self, max_ce_searches: usize) -> Result<Self, LStarError> {
        if max_ce_searches == 0 {
            return Err(LStarError::InvalidSearchBudget);
        }
        self.max_ce_searches = max_ce_searches;
        Ok(self)
    }

    /// The counterexample length the search will actually use: the length up
    /// to which the query budget affords exhaustive coverage, further capped
    /// by an explicit `max_ce_len` if one was given.
    fn effective_max_len(&self) -> usize {
        let derived = search::derived_max_len(self.alphabet.size(), self.max_ce_searches);
        match self.max_ce_len {
            Some(given) => given.min(derived),
            None => derived,
        }
    }

    /// Runs the learner to completion and returns the final hypothesis.
    pub fn infer(self) -> Dfa<A> {
        self.infer_with_table().0
    }

    /// Like [`infer`](LStar::infer), but additionally hands back the final
    /// observation table for diagnostic purposes.
    pub fn infer_with_table(self) -> (Dfa<A>, ObservationTable<A>) {
        let max_len = self.effective_max_len();
        info!(
            "learning over alphabet of {} symbols, counterexamples up to length {max_len}, \
             {} queries per equivalence check",
            self.alphabet.size(),
            self.max_ce_searches
        );

        let mut table = ObservationTable::new(self.alphabet.clone(), &self.oracle);
        for iteration in 1.. {
            assert!(
                iteration <= ITERATION_THRESHOLD,
                "refinement does not converge, the oracle answers nondeterministically"
            );

            // restore closedness and consistency; adding an experiment can
            // re-open closedness, so loop until both hold at once
            loop {
                while let Some(witness) = table.closing_witness() {
                    table.promote(witness, &self.oracle);
                }
                match table.inconsistency() {
                    Some(experiment) => table.add_experiment(experiment, &self.oracle),
                    None => break,
                }
            }
            trace!("table is closed and consistent\n{table:?}");

            let hypothesis = table.extract_dfa();
            debug!(
                "iteration {iteration}: hypothesis has {} states",
                hypothesis.size()
            );

            match search::find_counterexample(
                &hypothesis,
                &self.oracle,
                max_len,
                self.max_ce_searches,
            ) {
                Some(counterexample) => {
                    debug!(
                        "absorbing counterexample {}",
                        word::as_string(&counterexample)
                    );
                    table.absorb_counterexample(&counterexample, &self.oracle);
                }
                None => {
                    info!(
                        "done after {iteration} hypotheses and {} distinct membership queries",
                        self.oracle.distinct_queries()
                    );
                    return (hypothesis, table);
                }
            }
        }
        unreachable!("the refinement loop only exits by returning")
    }
}

/// Learns a minimal DFA for the language decided by `oracle`.
///
/// Convenience entry point around [`LStar`]: `max_ce_len` bounds the length
/// of candidate counterexamples and `max_ce_searches` the number of
/// membership queries per simulated equivalence check, both falling back to
/// the defaults described on [`LStar`] when absent. When both are given, the
/// shorter of the explicit length and the length the budget affords wins.
pub fn learn<A: Alphabet, O: Oracle<Alphabet = A>>(
    alphabet: A,
    oracle: O,
    max_ce_len: Option<usize>,
    max_ce_searches: Option<usize>,
) -> Result<Dfa<A>, LStarError> {
    let mut learner = LStar::new(alphabet, oracle)?;
    if let Some(len) = max_ce_len {
        learner = learner.with_max_ce_len(len)?;
    }
    if let Some(budget) = max_ce_searches {
        learner = learner.with_max_ce_searches(budget)?;
    }
    Ok(learner.infer())
}
