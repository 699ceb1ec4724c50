use std::{cell::Cell, marker::PhantomData};

use rand::{rngs::StdRng, Rng, SeedableRng};
use sift_core::{prelude::*, word::Word};
use tracing::{debug, trace};

use super::{
    hypothesis::{separating_word, Hypothesis},
    DFAOracle, MealyOracle, MembershipOracle, MooreOracle,
};
use crate::semantics::{DfaSemantics, MealySemantics, MooreSemantics, Semantics};

/// A word on which the hypothesis is wrong, together with the answer the system gives for it.
pub type Counterexample<S, O> = (Word<S>, O);

/// Decides whether a hypothesis behaves like the system that is learned. If it does not, a
/// [`Counterexample`] is produced. Equivalence oracles may also be approximations that search
/// only part of the input space, in which case not finding a counterexample proves nothing.
pub trait EquivalenceOracle {
    type Symbol: Symbol;
    type Semantics: Semantics;

    fn find_counterexample<H, A>(
        &self,
        hypothesis: &H,
        alphabet: &A,
    ) -> Option<Counterexample<Self::Symbol, <Self::Semantics as Semantics>::Output>>
    where
        H: Hypothesis<Symbol = Self::Symbol, Semantics = Self::Semantics>,
        A: Alphabet<Symbol = Self::Symbol>;
}

impl<A: Alphabet> EquivalenceOracle for DFAOracle<A> {
    type Symbol = A::Symbol;
    type Semantics = DfaSemantics;

    /// Compares the hypothesis with the automaton and returns a shortest word on which they
    /// differ.
    fn find_counterexample<H, B>(&self, hypothesis: &H, alphabet: &B) -> Option<(Word<A::Symbol>, bool)>
    where
        H: Hypothesis<Symbol = A::Symbol, Semantics = DfaSemantics>,
        B: Alphabet<Symbol = A::Symbol>,
    {
        let word = separating_word(self.automaton(), hypothesis, alphabet)?;
        let expected = self.automaton().accepts(&word);
        debug!("found counterexample {}", word.show());
        Some((word, expected))
    }
}

impl<A: Alphabet, O: Color + Show> EquivalenceOracle for MealyOracle<A, O> {
    type Symbol = A::Symbol;
    type Semantics = MealySemantics<O>;

    fn find_counterexample<H, B>(
        &self,
        hypothesis: &H,
        alphabet: &B,
    ) -> Option<(Word<A::Symbol>, Word<O>)>
    where
        H: Hypothesis<Symbol = A::Symbol, Semantics = MealySemantics<O>>,
        B: Alphabet<Symbol = A::Symbol>,
    {
        let word = separating_word(self.automaton(), hypothesis, alphabet)?;
        let expected = Hypothesis::output(self.automaton(), &word)?;
        debug!("found counterexample {}", word.show());
        Some((word, expected))
    }
}

impl<A: Alphabet, O: Color + Show> EquivalenceOracle for MooreOracle<A, O> {
    type Symbol = A::Symbol;
    type Semantics = MooreSemantics<O>;

    fn find_counterexample<H, B>(
        &self,
        hypothesis: &H,
        alphabet: &B,
    ) -> Option<(Word<A::Symbol>, Word<O>)>
    where
        H: Hypothesis<Symbol = A::Symbol, Semantics = MooreSemantics<O>>,
        B: Alphabet<Symbol = A::Symbol>,
    {
        let word = separating_word(self.automaton(), hypothesis, alphabet)?;
        let expected = Hypothesis::output(self.automaton(), &word)?;
        debug!("found counterexample {}", word.show());
        Some((word, expected))
    }
}

/// Compares the hypothesis with a membership oracle on all words up to a maximal length, in
/// length-lexicographic order. The first word on which they differ is returned, which makes it a
/// shortest counterexample of bounded length.
#[derive(Debug, Clone)]
pub struct ExhaustiveEquivalence<Q, M> {
    oracle: Q,
    max_length: usize,
    _semantics: PhantomData<M>,
}

impl<Q, M> ExhaustiveEquivalence<Q, M> {
    pub fn new(oracle: Q, max_length: usize) -> Self {
        Self {
            oracle,
            max_length,
            _semantics: PhantomData,
        }
    }
}

impl<Q, M> EquivalenceOracle for ExhaustiveEquivalence<Q, M>
where
    Q: MembershipOracle,
    M: Semantics<Output = Q::Output>,
{
    type Symbol = Q::Symbol;
    type Semantics = M;

    fn find_counterexample<H, A>(&self, hypothesis: &H, alphabet: &A) -> Option<(Word<Q::Symbol>, M::Output)>
    where
        H: Hypothesis<Symbol = Q::Symbol, Semantics = M>,
        A: Alphabet<Symbol = Q::Symbol>,
    {
        FreeMonoid::up_to(alphabet.universe().collect(), self.max_length).find_map(|word| {
            let word = Word::from(word);
            let expected = M::relevant(&self.oracle.answer(&[], &word), word.len())?;
            (hypothesis.output(&word).as_ref() != Some(&expected)).then_some((word, expected))
        })
    }
}

/// Samples random words and compares hypothesis and membership oracle on them. The lengths of
/// the words are drawn uniformly from the given range. Sampling is seeded, every call draws a
/// fresh but reproducible sequence of words.
#[derive(Debug, Clone)]
pub struct RandomWordsEquivalence<Q, M> {
    oracle: Q,
    min_length: usize,
    max_length: usize,
    samples: usize,
    seed: u64,
    round: Cell<u64>,
    _semantics: PhantomData<M>,
}

impl<Q, M> RandomWordsEquivalence<Q, M> {
    /// Draws `samples` words with lengths between `min_length` and `max_length`, both included.
    pub fn new(oracle: Q, min_length: usize, max_length: usize, samples: usize, seed: u64) -> Self {
        Self {
            oracle,
            min_length,
            max_length: max_length.max(min_length),
            samples,
            seed,
            round: Cell::new(0),
            _semantics: PhantomData,
        }
    }
}

impl<Q, M> EquivalenceOracle for RandomWordsEquivalence<Q, M>
where
    Q: MembershipOracle,
    M: Semantics<Output = Q::Output>,
{
    type Symbol = Q::Symbol;
    type Semantics = M;

    fn find_counterexample<H, A>(&self, hypothesis: &H, alphabet: &A) -> Option<(Word<Q::Symbol>, M::Output)>
    where
        H: Hypothesis<Symbol = Q::Symbol, Semantics = M>,
        A: Alphabet<Symbol = Q::Symbol>,
    {
        let symbols = alphabet.universe().collect::<Vec<_>>();
        if symbols.is_empty() {
            return None;
        }
        let round = self.round.get();
        self.round.set(round + 1);
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(round));

        for _ in 0..self.samples {
            let length = rng.gen_range(self.min_length..=self.max_length);
            let word = (0..length)
                .map(|_| symbols[rng.gen_range(0..symbols.len())])
                .collect::<Word<_>>();
            let Some(expected) = M::relevant(&self.oracle.answer(&[], &word), word.len()) else {
                continue;
            };
            if hypothesis.output(&word).as_ref() != Some(&expected) {
                debug!("random word {} is a counterexample", word.show());
                return Some((word, expected));
            }
        }
        trace!("no counterexample among {} random words", self.samples);
        None
    }
}
