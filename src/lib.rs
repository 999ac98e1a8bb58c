#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]

/// An alphabet is an ordered, finite collection of symbols. The ordering is
/// semantically significant: it fixes the enumeration order of candidate
/// counterexamples and the choice of canonical access strings.
#[macro_use]
pub mod alphabet;

/// Finite words over the symbols of an alphabet, together with the orderings
/// and decompositions the learner needs.
pub mod word;

/// Defines some mathematical objects that are used, such as sets and mappings.
pub mod math;
mod show;
pub use show::Show;

/// The hypothesis automaton produced by the learner.
pub mod dfa;

/// Membership oracles and the memoizing adapter wrapped around them.
pub mod oracle;

/// The observation table underlying the refinement loop.
pub mod table;

/// Simulation of equivalence queries by bounded exhaustive enumeration.
pub mod search;

/// The learner itself.
pub mod lstar;

/// The prelude is supposed to make using this package easier. Including
/// everything, i.e. `use nerode::prelude::*;` should be enough to use it.
pub mod prelude {
    pub use crate::alphabet::{Alphabet, CharAlphabet, Symbol, SymbolOf};
    pub use crate::dfa::{Dfa, StateId};
    pub use crate::lstar::{learn, LStar, LStarError};
    pub use crate::math;
    pub use crate::oracle::{Cached, DfaOracle, FnOracle, Oracle};
    pub use crate::show::Show;
    pub use crate::table::ObservationTable;
    pub use crate::word::Word;
}
