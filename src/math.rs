/// Type alias for maps, we use this to hide which type of map we are actually
/// using. Iteration visits entries in insertion order, which keeps runs of the
/// learner deterministic.
pub type Map<K, V> = indexmap::IndexMap<K, V>;

/// Type alias for sets, with the same insertion-order iteration guarantee as
/// [`Map`].
pub type Set<S> = indexmap::IndexSet<S>;
