use std::{cmp::Ordering, fmt::Debug, ops::Deref};

use crate::Show;

/// A finite word, i.e. an immutable sequence of symbols. All operations that "modify" a word
/// produce a new one.
///
/// Words are ordered length-lexicographically: shorter words come first and words of equal
/// length are compared symbol by symbol.
///
/// # Example
/// ```
/// use sift_core::word::Word;
/// let word = Word::from("abc");
/// assert_eq!(word.prefix(2), Word::from("ab"));
/// assert_eq!(word.suffix(1), Word::from("c"));
/// assert_eq!(word.prepend('x').skip(1), word);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Word<S>(Vec<S>);

impl<S> Word<S> {
    /// The empty word ε.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// The word consisting of a single symbol.
    pub fn from_symbol(symbol: S) -> Self {
        Self(vec![symbol])
    }

    /// Returns the symbols of `self` as a slice.
    pub fn as_slice(&self) -> &[S] {
        &self.0
    }

    /// Consumes `self` and returns the underlying vector of symbols.
    pub fn into_vec(self) -> Vec<S> {
        self.0
    }
}

impl<S: Clone> Word<S> {
    /// Returns the prefix of length `length`, or the whole word if it is shorter.
    pub fn prefix(&self, length: usize) -> Self {
        Self(self.0[..length.min(self.0.len())].to_vec())
    }

    /// Returns the suffix of length `length`, or the whole word if it is shorter.
    pub fn suffix(&self, length: usize) -> Self {
        let start = self.0.len().saturating_sub(length);
        Self(self.0[start..].to_vec())
    }

    /// Returns the word that remains after dropping the first `offset` symbols.
    pub fn skip(&self, offset: usize) -> Self {
        Self(self.0[offset.min(self.0.len())..].to_vec())
    }

    /// Returns the word `self · symbol`.
    pub fn append(&self, symbol: S) -> Self {
        let mut symbols = Vec::with_capacity(self.0.len() + 1);
        symbols.extend_from_slice(&self.0);
        symbols.push(symbol);
        Self(symbols)
    }

    /// Returns the word `symbol · self`.
    pub fn prepend(&self, symbol: S) -> Self {
        let mut symbols = Vec::with_capacity(self.0.len() + 1);
        symbols.push(symbol);
        symbols.extend_from_slice(&self.0);
        Self(symbols)
    }

    /// Returns the concatenation `self · other`.
    pub fn concat(&self, other: &[S]) -> Self {
        let mut symbols = Vec::with_capacity(self.0.len() + other.len());
        symbols.extend_from_slice(&self.0);
        symbols.extend_from_slice(other);
        Self(symbols)
    }
}

impl<S: Copy> Word<S> {
    /// Returns the first symbol, if it exists.
    pub fn first_symbol(&self) -> Option<S> {
        self.0.first().copied()
    }

    /// Returns the last symbol, if it exists.
    pub fn last_symbol(&self) -> Option<S> {
        self.0.last().copied()
    }
}

impl<S> Default for Word<S> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<S> Deref for Word<S> {
    type Target = [S];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> AsRef<[S]> for Word<S> {
    fn as_ref(&self) -> &[S] {
        &self.0
    }
}

impl<S> From<Vec<S>> for Word<S> {
    fn from(value: Vec<S>) -> Self {
        Self(value)
    }
}

impl<S: Clone> From<&[S]> for Word<S> {
    fn from(value: &[S]) -> Self {
        Self(value.to_vec())
    }
}

impl From<&str> for Word<char> {
    fn from(value: &str) -> Self {
        Self(value.chars().collect())
    }
}

impl<S> FromIterator<S> for Word<S> {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<S> IntoIterator for Word<S> {
    type Item = S;
    type IntoIter = std::vec::IntoIter<S>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, S> IntoIterator for &'a Word<S> {
    type Item = &'a S;
    type IntoIter = std::slice::Iter<'a, S>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<S: Show> Show for Word<S> {
    fn show(&self) -> String {
        S::show_collection(&self.0)
    }
}

impl<S: Show> Debug for Word<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.show())
    }
}

impl<S: Ord> Ord for Word<S> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.iter().cmp(other.0.iter()))
    }
}

impl<S: Ord> PartialOrd for Word<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
