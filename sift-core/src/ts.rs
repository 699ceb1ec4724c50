use itertools::Itertools;

use crate::{
    alphabet::{Alphabet, SimpleAlphabet, Symbol},
    math, Color, Void,
};

/// States of a [`DTS`] are addressed by their position.
pub type StateIndex = usize;

/// A deterministic transition system. Every state carries a color of type `Q` and has at most
/// one outgoing edge per symbol, each edge carries a color of type `C`. Edges are stored per
/// state in insertion order.
#[derive(Clone, PartialEq, Eq)]
pub struct DTS<A: Alphabet, Q = Void, C = Void> {
    alphabet: A,
    states: Vec<Q>,
    edges: Vec<math::Map<A::Symbol, (StateIndex, C)>>,
}

impl<A: Alphabet, Q: Color, C: Color> DTS<A, Q, C> {
    /// Creates an empty transition system over the given alphabet.
    pub fn for_alphabet(alphabet: A) -> Self {
        Self {
            alphabet,
            states: vec![],
            edges: vec![],
        }
    }

    /// Returns a reference to the alphabet.
    pub fn alphabet(&self) -> &A {
        &self.alphabet
    }

    /// Adds a state with the given color and returns its index.
    pub fn add_state(&mut self, color: Q) -> StateIndex {
        self.states.push(color);
        self.edges.push(math::Map::default());
        self.states.len() - 1
    }

    /// Adds an edge, returning the edge that was previously present for `source` and `symbol`.
    /// Panics if one of the states does not exist, this is a programming error.
    pub fn add_edge(
        &mut self,
        source: StateIndex,
        symbol: A::Symbol,
        color: C,
        target: StateIndex,
    ) -> Option<(StateIndex, C)> {
        assert!(target < self.states.len(), "target state does not exist");
        self.edges[source].insert(symbol, (target, color))
    }

    /// Returns the number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// Iterates over the indices of all states.
    pub fn state_indices(&self) -> std::ops::Range<StateIndex> {
        0..self.states.len()
    }

    /// Returns the color of the given state.
    pub fn state_color(&self, state: StateIndex) -> Option<&Q> {
        self.states.get(state)
    }

    /// Returns target and color of the edge leaving `state` on `symbol`.
    pub fn edge(&self, state: StateIndex, symbol: A::Symbol) -> Option<(StateIndex, &C)> {
        self.edges
            .get(state)?
            .get(&symbol)
            .map(|(target, color)| (*target, color))
    }

    /// Returns the successor of `state` on `symbol`.
    pub fn successor(&self, state: StateIndex, symbol: A::Symbol) -> Option<StateIndex> {
        self.edge(state, symbol).map(|(target, _)| target)
    }

    /// Runs `word` from `source` and returns the reached state, or `None` if some transition
    /// is missing along the way.
    pub fn reached_state_index_from(
        &self,
        source: StateIndex,
        word: &[A::Symbol],
    ) -> Option<StateIndex> {
        word.iter()
            .try_fold(source, |state, sym| self.successor(state, *sym))
    }

    /// Returns true if every state has an edge for every symbol of the alphabet.
    pub fn is_complete(&self) -> bool {
        self.edges
            .iter()
            .all(|edges| self.alphabet.universe().all(|sym| edges.contains_key(&sym)))
    }
}

impl<A: Alphabet, Q: std::fmt::Debug, C: std::fmt::Debug> std::fmt::Debug for DTS<A, Q, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (state, color) in self.states.iter().enumerate() {
            writeln!(
                f,
                "{state} {color:?}: {}",
                self.edges[state]
                    .iter()
                    .map(|(sym, (target, c))| format!("{sym:?}|{c:?} -> {target}"))
                    .join(", ")
            )?;
        }
        Ok(())
    }
}

/// Helper for building a [`DTS`] from a list of transitions. The alphabet is collected from
/// the symbols that appear on the transitions.
///
/// # Example
/// ```
/// use sift_core::prelude::*;
/// let dfa = TSBuilder::with_state_colors([true, false])
///     .with_transitions([(0, 'a', Void, 1), (1, 'a', Void, 0)])
///     .into_dfa(0);
/// assert!(dfa.accepts(&['a', 'a']));
/// assert!(!dfa.accepts(&['a']));
/// ```
#[derive(Debug, Clone)]
pub struct TSBuilder<S, Q = Void, C = Void> {
    state_colors: Vec<Q>,
    default_color: Option<Q>,
    edges: Vec<(StateIndex, S, C, StateIndex)>,
}

impl<S: Symbol, C: Color> TSBuilder<S, Void, C> {
    /// Creates a builder where states do not carry any color.
    pub fn without_state_colors() -> Self {
        Self {
            state_colors: vec![],
            default_color: Some(Void),
            edges: vec![],
        }
    }
}

impl<S: Symbol, Q: Color, C: Color> TSBuilder<S, Q, C> {
    /// Creates a builder where the `i`-th state receives the `i`-th given color.
    pub fn with_state_colors<I: IntoIterator<Item = Q>>(colors: I) -> Self {
        Self {
            state_colors: colors.into_iter().collect(),
            default_color: None,
            edges: vec![],
        }
    }

    /// Colors states that are not explicitly colored with `color`.
    pub fn default_color(mut self, color: Q) -> Self {
        self.default_color = Some(color);
        self
    }

    /// Adds transitions given as `(source, symbol, color, target)`.
    pub fn with_transitions<I: IntoIterator<Item = (StateIndex, S, C, StateIndex)>>(
        mut self,
        transitions: I,
    ) -> Self {
        self.edges.extend(transitions);
        self
    }

    /// Builds the transition system. Panics if a state without color is referenced and no
    /// default color was set, as that is a mistake in the definition.
    pub fn into_dts(self) -> DTS<SimpleAlphabet<S>, Q, C> {
        let alphabet: SimpleAlphabet<S> = self.edges.iter().map(|(_, sym, _, _)| *sym).collect();
        let size = self
            .edges
            .iter()
            .flat_map(|(p, _, _, q)| [*p + 1, *q + 1])
            .chain(std::iter::once(self.state_colors.len()))
            .max()
            .unwrap_or(0);

        let mut ts = DTS::for_alphabet(alphabet);
        for state in 0..size {
            let color = self
                .state_colors
                .get(state)
                .cloned()
                .or_else(|| self.default_color.clone())
                .unwrap_or_else(|| panic!("state {state} has no color and there is no default"));
            ts.add_state(color);
        }
        for (source, sym, color, target) in self.edges {
            ts.add_edge(source, sym, color, target);
        }
        ts
    }
}
