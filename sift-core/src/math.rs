pub use indexmap::map;

/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
/// Iteration follows insertion order.
pub type Set<S> = indexmap::IndexSet<S>;

/// Type alias for maps, we use this to hide which type of `HashMap` we are actually using.
/// Iteration follows insertion order.
pub type Map<K, V> = indexmap::IndexMap<K, V>;

/// Represents a bijective mapping between `L` and `R`, that is a mapping which associates
/// each `L` with precisely one `R` and vice versa.
pub type Bijection<L, R> = bimap::BiBTreeMap<L, R>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_iterate_in_insertion_order() {
        let mut map = Map::default();
        for (k, v) in [(3, 'c'), (1, 'a'), (2, 'b')] {
            map.insert(k, v);
        }
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![3, 1, 2]);

        map.shift_remove(&1);
        assert_eq!(map.values().copied().collect::<String>(), "cb");
    }

    #[test]
    fn bijection_lookups() {
        let mut bij = Bijection::new();
        bij.insert(0usize, 'q');
        bij.insert(1usize, 'p');
        assert_eq!(bij.get_by_left(&1), Some(&'p'));
        assert_eq!(bij.get_by_right(&'q'), Some(&0));
    }
}
