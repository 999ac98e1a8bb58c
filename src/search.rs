use tracing::{debug, trace};

use crate::alphabet::{Alphabet, SymbolOf};
use crate::dfa::Dfa;
use crate::oracle::Oracle;
use crate::word::{self, Word};

/// Ceiling on the counterexample length derived from a query budget. For
/// alphabets with at least two symbols the geometric growth of Σ^ℓ keeps the
/// derived length tiny, but over a unary alphabet every additional query buys
/// one more length and the candidate words themselves grow without bound.
/// The ceiling keeps the memory spent on candidates proportional to the
/// budget; callers who really want longer unary counterexamples can pass an
/// explicit `max_ce_len`.
pub(crate) const DERIVED_LENGTH_CEILING: usize = 1024;

/// Computes the largest length `L` such that enumerating all words of length
/// 2 up to `L` stays within `budget` membership queries, i.e. the largest `L`
/// with Σ_{ℓ=2..L} |Σ|^ℓ ≤ budget. The sum is accumulated in exact integer
/// arithmetic. Returns at least 1, in which case the search space is empty.
pub fn derived_max_len(alphabet_size: usize, budget: usize) -> usize {
    assert!(alphabet_size >= 1, "alphabet must not be empty");
    let mut len = 1usize;
    let mut spent = 0u128;
    while len < DERIVED_LENGTH_CEILING {
        let Some(cost) = (alphabet_size as u128).checked_pow(len as u32 + 1) else {
            break;
        };
        if spent + cost > budget as u128 {
            break;
        }
        spent += cost;
        len += 1;
    }
    len
}

/// Searches for a word on which `hypothesis` and the oracle disagree, by
/// exhaustively enumerating candidates of length 2 up to `max_len` in
/// length-then-lexicographic order. Words of length 0 and 1 are never
/// candidates: they are covered by the observation table itself, which always
/// holds rows for ε and every single symbol.
///
/// Every membership lookup counts against `max_queries`; when the budget runs
/// out the search reports no disagreement. The hypothesis side is evaluated
/// incrementally: the enumeration keeps the run of the current word and only
/// re-traverses the suffix that changed.
pub fn find_counterexample<A: Alphabet, O: Oracle<Alphabet = A>>(
    hypothesis: &Dfa<A>,
    oracle: &O,
    max_len: usize,
    max_queries: usize,
) -> Option<Word<SymbolOf<A>>> {
    let alphabet = hypothesis.alphabet();
    let size = alphabet.size();
    let mut queries = 0usize;

    for len in 2..=max_len {
        trace!("scanning all {size}^{len} candidates of length {len}");
        // odometer over symbol positions together with the states that the
        // hypothesis reaches after each position
        let mut digits = vec![0usize; len];
        let mut states = Vec::with_capacity(len);
        for i in 0..len {
            let source = if i == 0 {
                hypothesis.initial()
            } else {
                states[i - 1]
            };
            states.push(hypothesis.successor_by_position(source, 0));
        }

        loop {
            if queries >= max_queries {
                debug!("query budget of {max_queries} exhausted at length {len}");
                return None;
            }
            queries += 1;

            let candidate: Word<SymbolOf<A>> = digits
                .iter()
                .map(|&i| alphabet.symbol(i).expect("position is within bounds"))
                .collect();
            let predicted = hypothesis.is_accepting(states[len - 1]);
            if oracle.output(&candidate) != predicted {
                debug!(
                    "hypothesis disagrees with oracle on {}",
                    word::as_string(&candidate)
                );
                return Some(candidate);
            }

            // advance the odometer and re-run the changed suffix
            let Some(position) = (0..len).rev().find(|&i| digits[i] + 1 < size) else {
                break;
            };
            digits[position] += 1;
            for i in position + 1..len {
                digits[i] = 0;
            }
            for i in position..len {
                let source = if i == 0 {
                    hypothesis.initial()
                } else {
                    states[i - 1]
                };
                states[i] = hypothesis.successor_by_position(source, digits[i]);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use fixedbitset::FixedBitSet;

    use super::{derived_max_len, find_counterexample, DERIVED_LENGTH_CEILING};
    use crate::alphabet::CharAlphabet;
    use crate::dfa::Dfa;
    use crate::oracle::FnOracle;

    #[test]
    fn deriving_the_length_bound() {
        // 4 + 8 + ... + 2^15 = 2^16 - 4 fits into 100000, 2^16 more does not
        assert_eq!(derived_max_len(2, 100_000), 15);
        // 3^2 + ... + 3^10 = 88569 fits into 100000, 3^11 more does not
        assert_eq!(derived_max_len(3, 100_000), 10);
        // not even the four words of length 2 fit
        assert_eq!(derived_max_len(2, 3), 1);
        assert_eq!(derived_max_len(2, 4), 2);
        // over a unary alphabet every length costs one query
        assert_eq!(derived_max_len(1, 100_000), DERIVED_LENGTH_CEILING);
        assert_eq!(derived_max_len(1, 10), 11);
    }

    fn reject_everything() -> Dfa {
        Dfa::from_parts(
            CharAlphabet::from("ab"),
            0,
            FixedBitSet::with_capacity(1),
            vec![vec![0, 0]],
            vec![vec![]],
        )
    }

    #[test]
    fn first_disagreement_in_enumeration_order() {
        // the oracle accepts only "ba"; candidates are visited in the order
        // aa, ab, ba, ...
        let oracle = FnOracle::new(CharAlphabet::from("ab"), |word: &[char]| {
            word == ['b', 'a']
        });
        let found = find_counterexample(&reject_everything(), &oracle, 5, 1_000);
        assert_eq!(found, Some(vec!['b', 'a']));
    }

    #[test]
    fn budget_cuts_the_search_short() {
        let oracle = FnOracle::new(CharAlphabet::from("ab"), |word: &[char]| {
            word == ['b', 'a']
        });
        // two queries cover aa and ab only
        assert_eq!(
            find_counterexample(&reject_everything(), &oracle, 5, 2),
            None
        );
        assert_eq!(
            find_counterexample(&reject_everything(), &oracle, 5, 3),
            Some(vec!['b', 'a'])
        );
    }

    #[test]
    fn agreement_exhausts_the_space() {
        let oracle = FnOracle::new(CharAlphabet::from("ab"), |_: &[char]| false);
        assert_eq!(
            find_counterexample(&reject_everything(), &oracle, 4, 1_000),
            None
        );

        // length bound below 2 means there is nothing to search
        let accepts_some = FnOracle::new(CharAlphabet::from("ab"), |word: &[char]| {
            word.len() == 3
        });
        assert_eq!(
            find_counterexample(&reject_everything(), &accepts_some, 1, 1_000),
            None
        );
    }
}
