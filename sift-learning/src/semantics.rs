//! The three kinds of machines that can be learned differ only in the shape of the answers
//! the oracle gives and in where outputs live in the hypothesis. Everything else, the tree,
//! sifting, splitting and counterexample analysis, is shared and parameterized by a
//! [`Semantics`].
use std::marker::PhantomData;

use sift_core::{prelude::*, word::Word};

use crate::{
    active::Hypothesis,
    datastructure::{BinaryChildren, Children, MapChildren},
};

/// The answer of the oracle to a query. Two answers for the same input word that were
/// obtained by splitting it at different positions must agree.
pub trait Output: Color + Show {
    /// Returns true if `self` and `other` can both be answers for the same input word.
    fn agrees_with(&self, other: &Self) -> bool;
}

impl Output for bool {
    fn agrees_with(&self, other: &Self) -> bool {
        self == other
    }
}

impl<O: Color + Show> Output for Word<O> {
    /// For words, the answer for the shorter suffix has to be a suffix of the answer for the
    /// longer one.
    fn agrees_with(&self, other: &Self) -> bool {
        let n = self.len().min(other.len());
        self.suffix(n) == other.suffix(n)
    }
}

/// Parameterizes the learner over the kind of machine that is learned.
pub trait Semantics {
    /// Shape of an answer to a query.
    type Output: Output;
    /// Children of inner nodes in the discrimination tree, keyed by [`Self::Output`].
    type Children: Children<Self::Output>;
    /// Whether states of the hypothesis carry an output.
    const STATE_OUTPUTS: bool;
    /// Whether transitions of the hypothesis carry an output.
    const TRANSITION_OUTPUTS: bool;

    /// Reduces an answer for the whole input word to the part that concerns the last
    /// `suffix_len` symbols. Returns `None` if `answer` is too short for that.
    fn relevant(answer: &Self::Output, suffix_len: usize) -> Option<Self::Output>;

    /// Discriminators on which all short prefixes of a leaf must agree before any structural
    /// consistency check is made. A disagreement is resolved by splitting with the discriminator
    /// directly, which is how the very first states are discovered.
    fn immediate_discriminators<A: Alphabet>(alphabet: &A) -> Vec<Word<A::Symbol>>;

    /// Discriminator used when a split cannot be derived from an existing inner node.
    fn fresh_discriminator<S: Symbol>(symbol: S) -> Word<S> {
        Word::from_symbol(symbol)
    }

    /// The query whose answer is stored with a prefix, as `(prefix, suffix)`. For machines with
    /// state outputs this is the output of the state, for Mealy machines it is the output of
    /// the transition over the last symbol. Returns `None` if nothing needs to be stored.
    fn local_query<S: Symbol>(word: &Word<S>) -> Option<(Word<S>, Word<S>)>;

    /// Computes the answer the hypothesis gives for `prefix · suffix`, in the same shape in which
    /// the oracle answers.
    fn evaluate<H>(hypothesis: &H, prefix: &[H::Symbol], suffix: &[H::Symbol]) -> Option<Self::Output>
    where
        H: Hypothesis<Semantics = Self> + ?Sized;
}

/// Semantics for learning deterministic finite automata. Answers are booleans, the tree is
/// binary and acceptance is a state output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DfaSemantics;

impl Semantics for DfaSemantics {
    type Output = bool;
    type Children = BinaryChildren;
    const STATE_OUTPUTS: bool = true;
    const TRANSITION_OUTPUTS: bool = false;

    fn relevant(answer: &bool, _suffix_len: usize) -> Option<bool> {
        Some(*answer)
    }

    fn immediate_discriminators<A: Alphabet>(_alphabet: &A) -> Vec<Word<A::Symbol>> {
        vec![Word::empty()]
    }

    fn local_query<S: Symbol>(word: &Word<S>) -> Option<(Word<S>, Word<S>)> {
        Some((word.clone(), Word::empty()))
    }

    fn evaluate<H>(hypothesis: &H, prefix: &[H::Symbol], suffix: &[H::Symbol]) -> Option<bool>
    where
        H: Hypothesis<Semantics = Self> + ?Sized,
    {
        let state = hypothesis.reached_index(prefix)?;
        let state = hypothesis.reached_index_from(state, suffix)?;
        hypothesis.state_output(state)
    }
}

/// Semantics for learning Mealy machines. The answer to `(u, v)` consists of the `|v|` outputs
/// produced while reading `v` after `u`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MealySemantics<O>(PhantomData<O>);

impl<O: Color + Show> Semantics for MealySemantics<O> {
    type Output = Word<O>;
    type Children = MapChildren<Word<O>>;
    const STATE_OUTPUTS: bool = false;
    const TRANSITION_OUTPUTS: bool = true;

    fn relevant(answer: &Word<O>, suffix_len: usize) -> Option<Word<O>> {
        (answer.len() >= suffix_len).then(|| answer.suffix(suffix_len))
    }

    fn immediate_discriminators<A: Alphabet>(alphabet: &A) -> Vec<Word<A::Symbol>> {
        alphabet.universe().map(Word::from_symbol).collect()
    }

    fn local_query<S: Symbol>(word: &Word<S>) -> Option<(Word<S>, Word<S>)> {
        let last = word.last_symbol()?;
        Some((word.prefix(word.len() - 1), Word::from_symbol(last)))
    }

    fn evaluate<H>(hypothesis: &H, prefix: &[H::Symbol], suffix: &[H::Symbol]) -> Option<Word<O>>
    where
        H: Hypothesis<Semantics = Self> + ?Sized,
    {
        let mut state = hypothesis.reached_index(prefix)?;
        let mut out = Vec::with_capacity(suffix.len());
        for &sym in suffix {
            out.extend(hypothesis.transition_output(state, sym)?);
            state = hypothesis.successor(state, sym)?;
        }
        Some(out.into())
    }
}

/// Semantics for learning Moore machines. The answer to `(u, v)` consists of the `|v| + 1`
/// outputs of the states visited while reading `v` after `u`, starting with the state
/// reached by `u`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MooreSemantics<O>(PhantomData<O>);

impl<O: Color + Show> Semantics for MooreSemantics<O> {
    type Output = Word<O>;
    type Children = MapChildren<Word<O>>;
    const STATE_OUTPUTS: bool = true;
    const TRANSITION_OUTPUTS: bool = false;

    fn relevant(answer: &Word<O>, suffix_len: usize) -> Option<Word<O>> {
        (answer.len() > suffix_len).then(|| answer.suffix(suffix_len + 1))
    }

    fn immediate_discriminators<A: Alphabet>(_alphabet: &A) -> Vec<Word<A::Symbol>> {
        vec![Word::empty()]
    }

    fn local_query<S: Symbol>(word: &Word<S>) -> Option<(Word<S>, Word<S>)> {
        Some((word.clone(), Word::empty()))
    }

    fn evaluate<H>(hypothesis: &H, prefix: &[H::Symbol], suffix: &[H::Symbol]) -> Option<Word<O>>
    where
        H: Hypothesis<Semantics = Self> + ?Sized,
    {
        let mut state = hypothesis.reached_index(prefix)?;
        let mut out = Vec::with_capacity(suffix.len() + 1);
        out.extend(hypothesis.state_output(state)?);
        for &sym in suffix {
            state = hypothesis.successor(state, sym)?;
            out.extend(hypothesis.state_output(state)?);
        }
        Some(out.into())
    }
}
