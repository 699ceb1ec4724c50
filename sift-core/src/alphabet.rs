use std::{fmt::Debug, hash::Hash};

use itertools::Itertools;
use thiserror::Error;

use crate::Show;

/// A symbol of an alphabet, which is also the type of the symbols in a word.
pub trait Symbol: PartialEq + Eq + Debug + Copy + Ord + PartialOrd + Hash + Show {}
impl<S: PartialEq + Eq + Debug + Copy + Ord + PartialOrd + Hash + Show> Symbol for S {}

/// Errors that can occur when manipulating an alphabet.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum AlphabetError {
    /// The symbol is already part of the alphabet, growing would change nothing.
    #[error("symbol {0} is already part of the alphabet")]
    DuplicateSymbol(String),
    /// The requested alphabet cannot be built from single letters.
    #[error("cannot build an alphabet of size {0} from the letters a to z")]
    TooLarge(usize),
}

/// An alphabet abstracts an ordered collection of [`Symbol`]s. Each symbol has a stable index,
/// symbols are enumerated in the order of their indices. An alphabet may grow over time (see
/// [`GrowingAlphabet`]) but it never shrinks and never reorders the symbols it already has.
pub trait Alphabet: Clone + Debug {
    /// The type of symbols in this alphabet.
    type Symbol: Symbol;

    /// Type for an iterator over all symbols of the alphabet.
    type Universe<'this>: Iterator<Item = Self::Symbol>
    where
        Self: 'this;

    /// Returns an iterator over all symbols in the alphabet, in index order.
    fn universe(&self) -> Self::Universe<'_>;

    /// Returns the number of symbols in the alphabet.
    fn size(&self) -> usize;

    /// Returns the symbol with the given index, if it exists.
    fn try_nth(&self, pos: usize) -> Option<Self::Symbol>;

    /// Returns the index of the given symbol, if it is present.
    fn position(&self, symbol: Self::Symbol) -> Option<usize>;

    /// Returns true if the given symbol is present in the alphabet.
    fn contains(&self, symbol: Self::Symbol) -> bool {
        self.position(symbol).is_some()
    }

    /// Returns true if the alphabet is empty.
    fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

/// An [`Alphabet`] to which symbols can be appended.
pub trait GrowingAlphabet: Alphabet {
    /// Appends `symbol` and returns its index. Fails if the symbol is already present.
    fn add_symbol(&mut self, symbol: Self::Symbol) -> Result<usize, AlphabetError>;
}

impl<A: Alphabet> Alphabet for &A {
    type Symbol = A::Symbol;
    type Universe<'this> = A::Universe<'this> where Self: 'this;

    fn universe(&self) -> Self::Universe<'_> {
        A::universe(self)
    }
    fn size(&self) -> usize {
        A::size(self)
    }
    fn try_nth(&self, pos: usize) -> Option<Self::Symbol> {
        A::try_nth(self, pos)
    }
    fn position(&self, symbol: Self::Symbol) -> Option<usize> {
        A::position(self, symbol)
    }
}

/// An alphabet that is just a list of symbols, the index of a symbol is its position in
/// the list.
#[derive(Clone, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub struct SimpleAlphabet<S>(Vec<S>);

/// Represents an alphabet where a [`Symbol`] is just a single `char`.
pub type CharAlphabet = SimpleAlphabet<char>;

impl CharAlphabet {
    /// Creates a new [`CharAlphabet`] of the given size. The symbols are just the first `size`
    /// letters of the alphabet, i.e. 'a' to 'z'.
    pub fn of_size(size: usize) -> Result<Self, AlphabetError> {
        if size > 26 {
            return Err(AlphabetError::TooLarge(size));
        }
        Ok(Self((0..size).map(|i| (b'a' + i as u8) as char).collect()))
    }
}

impl<S: Symbol> SimpleAlphabet<S> {
    /// Creates an alphabet from the given symbols, keeping their order. Duplicates are
    /// rejected.
    pub fn new(symbols: Vec<S>) -> Result<Self, AlphabetError> {
        let mut alphabet = Self(Vec::with_capacity(symbols.len()));
        for sym in symbols {
            alphabet.add_symbol(sym)?;
        }
        Ok(alphabet)
    }

    /// Returns the symbols as a slice, ordered by index.
    pub fn symbols(&self) -> &[S] {
        &self.0
    }
}

impl<S> std::ops::Index<usize> for SimpleAlphabet<S> {
    type Output = S;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// Collects the symbols into an alphabet, the symbols are deduplicated and sorted.
impl<S: Symbol> FromIterator<S> for SimpleAlphabet<S> {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().unique().sorted().collect())
    }
}

impl<S: Symbol> Alphabet for SimpleAlphabet<S> {
    type Symbol = S;
    type Universe<'this> = std::iter::Copied<std::slice::Iter<'this, S>>
    where
        Self: 'this;

    fn universe(&self) -> Self::Universe<'_> {
        self.0.iter().copied()
    }

    fn size(&self) -> usize {
        self.0.len()
    }

    fn try_nth(&self, pos: usize) -> Option<S> {
        self.0.get(pos).copied()
    }

    fn position(&self, symbol: S) -> Option<usize> {
        self.0.iter().position(|x| symbol.eq(x))
    }
}

impl<S: Symbol> GrowingAlphabet for SimpleAlphabet<S> {
    fn add_symbol(&mut self, symbol: S) -> Result<usize, AlphabetError> {
        if self.contains(symbol) {
            return Err(AlphabetError::DuplicateSymbol(symbol.show()));
        }
        self.0.push(symbol);
        Ok(self.0.len() - 1)
    }
}

/// Computes all elements of the free monoid over a set of given symbols.
/// In other words, it builds all finite words in length-lexicographic order
/// meaning words are computed in increasing length and sorted by symbol index.
#[derive(Debug, Clone)]
pub struct FreeMonoid<S> {
    symbols: Vec<S>,
    current: Vec<usize>,
    max_length: Option<usize>,
}

impl<S: Symbol> Iterator for FreeMonoid<S> {
    type Item = Vec<S>;
    fn next(&mut self) -> Option<Self::Item> {
        if let Some(max) = self.max_length {
            if self.current.len() > max {
                return None;
            }
        }
        if self.symbols.is_empty() && !self.current.is_empty() {
            return None;
        }

        let out = self.current.iter().map(|i| self.symbols[*i]).collect();

        let mut carry = true;
        let mut i = self.current.len();
        while carry && i > 0 {
            i -= 1;
            self.current[i] += 1;
            if self.current[i] >= self.symbols.len() {
                self.current[i] = 0;
                carry = true;
            } else {
                carry = false;
            }
        }

        if carry {
            self.current = vec![0; self.current.len() + 1];
        }

        Some(out)
    }
}

impl<S> FreeMonoid<S> {
    /// Creates a new unbounded enumeration for the given vec of symbols.
    pub fn new(symbols: Vec<S>) -> Self {
        Self {
            symbols,
            current: vec![],
            max_length: None,
        }
    }

    /// Enumerates all words up to and including the given length.
    pub fn up_to(symbols: Vec<S>, max_length: usize) -> Self {
        Self {
            symbols,
            current: vec![],
            max_length: Some(max_length),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growing_keeps_indices_stable() {
        let mut alphabet = CharAlphabet::of_size(2).unwrap();
        assert_eq!(alphabet.position('b'), Some(1));
        assert_eq!(alphabet.add_symbol('c'), Ok(2));
        assert_eq!(alphabet.universe().collect::<String>(), "abc");
        assert_eq!(alphabet.position('a'), Some(0));
        assert!(matches!(
            alphabet.add_symbol('a'),
            Err(AlphabetError::DuplicateSymbol(_))
        ));
        assert!(CharAlphabet::of_size(30).is_err());
    }

    #[test]
    fn new_keeps_order_collect_sorts() {
        let given = SimpleAlphabet::new(vec!['c', 'a']).unwrap();
        assert_eq!(given.try_nth(0), Some('c'));
        let collected: CharAlphabet = "cbab".chars().collect();
        assert_eq!(collected.symbols(), &['a', 'b', 'c']);
        assert!(SimpleAlphabet::new(vec![1u8, 1]).is_err());
    }

    #[test]
    fn free_monoid_is_length_lexicographic() {
        let words: Vec<String> = FreeMonoid::up_to(vec!['a', 'b'], 2)
            .map(|w| w.into_iter().collect())
            .collect();
        assert_eq!(words, vec!["", "a", "b", "aa", "ab", "ba", "bb"]);

        assert_eq!(FreeMonoid::new(vec!['x']).take(4).count(), 4);
        assert_eq!(FreeMonoid::<char>::up_to(vec![], 3).count(), 1);
    }
}
