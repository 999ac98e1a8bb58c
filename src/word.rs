use std::cmp::Ordering;

use itertools::Itertools;

use crate::alphabet::{Alphabet, Symbol, SymbolOf};

/// A finite word is an ordered sequence of symbols; the empty word ε is the
/// empty sequence. Words are compared in length-then-lexicographic order,
/// where "lexicographic" refers to the position of symbols in their
/// [`Alphabet`], see [`cmp_length_lex`].
pub type Word<S> = Vec<S>;

/// Concatenation `u·v`.
pub fn concat<S: Symbol>(u: &[S], v: &[S]) -> Word<S> {
    let mut out = Vec::with_capacity(u.len() + v.len());
    out.extend_from_slice(u);
    out.extend_from_slice(v);
    out
}

/// One-symbol extension `u·a`.
pub fn extended<S: Symbol>(u: &[S], a: S) -> Word<S> {
    let mut out = Vec::with_capacity(u.len() + 1);
    out.extend_from_slice(u);
    out.push(a);
    out
}

/// Iterates over all non-empty prefixes of `w`, shortest first. The word
/// itself is the last element.
pub fn prefixes<S: Symbol>(w: &[S]) -> impl Iterator<Item = Word<S>> + '_ {
    (1..=w.len()).map(move |i| w[..i].to_vec())
}

/// Compares two words by length first and then symbol-wise by the position of
/// the symbols in `alphabet`. Both words must be built from symbols of the
/// given alphabet.
pub fn cmp_length_lex<A: Alphabet>(
    alphabet: &A,
    u: &[SymbolOf<A>],
    v: &[SymbolOf<A>],
) -> Ordering {
    u.len().cmp(&v.len()).then_with(|| {
        for (x, y) in u.iter().zip(v.iter()) {
            let px = alphabet.position(*x).expect("symbol does not exist");
            let py = alphabet.position(*y).expect("symbol does not exist");
            match px.cmp(&py) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    })
}

/// Renders a word for humans, `ε` for the empty word.
pub fn as_string<S: Symbol>(w: &[S]) -> String {
    if w.is_empty() {
        return "ε".to_string();
    }
    w.iter().map(|sym| sym.show()).join("")
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use itertools::Itertools;

    use super::{as_string, cmp_length_lex, concat, extended, prefixes};
    use crate::alphabet::CharAlphabet;

    #[test]
    fn building_words() {
        assert_eq!(concat(&['a', 'b'], &['c']), vec!['a', 'b', 'c']);
        assert_eq!(concat::<char>(&[], &[]), Vec::<char>::new());
        assert_eq!(extended(&['a'], 'b'), vec!['a', 'b']);
        assert_eq!(
            prefixes(&['a', 'b', 'a']).collect_vec(),
            vec![vec!['a'], vec!['a', 'b'], vec!['a', 'b', 'a']]
        );
        assert_eq!(prefixes::<char>(&[]).count(), 0);
    }

    #[test]
    fn length_lex_follows_alphabet_order() {
        // 'b' precedes 'a' here, so "b" < "a" and "ba" < "ab"
        let alphabet = CharAlphabet::from("ba");
        assert_eq!(cmp_length_lex(&alphabet, &[], &['b']), Ordering::Less);
        assert_eq!(cmp_length_lex(&alphabet, &['b'], &['a']), Ordering::Less);
        assert_eq!(
            cmp_length_lex(&alphabet, &['b', 'a'], &['a', 'b']),
            Ordering::Less
        );
        assert_eq!(
            cmp_length_lex(&alphabet, &['a'], &['b', 'b']),
            Ordering::Less
        );
        assert_eq!(
            cmp_length_lex(&alphabet, &['a', 'b'], &['a', 'b']),
            Ordering::Equal
        );
    }

    #[test]
    fn showing_words() {
        assert_eq!(as_string::<char>(&[]), "ε");
        assert_eq!(as_string(&['a', 'b']), "ab");
    }
}
