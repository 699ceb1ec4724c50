use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use sift_core::{prelude::*, word::Word};
use tracing::trace;

use crate::{
    error::{LearningError, Result},
    semantics::Output,
};

/// A membership query `(prefix, suffix)` together with its answer, once it is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query<S: Show, O> {
    pub prefix: Word<S>,
    pub suffix: Word<S>,
    pub output: Option<O>,
}

impl<S: Symbol, O> Query<S, O> {
    /// Creates a query that has not been answered yet.
    pub fn new(prefix: Word<S>, suffix: Word<S>) -> Self {
        Self {
            prefix,
            suffix,
            output: None,
        }
    }

    /// Creates a query whose answer is already known.
    pub fn answered(prefix: Word<S>, suffix: Word<S>, output: O) -> Self {
        Self {
            prefix,
            suffix,
            output: Some(output),
        }
    }

    /// The whole input word `prefix · suffix`.
    pub fn input(&self) -> Word<S> {
        self.prefix.concat(&self.suffix)
    }
}

/// Answers membership queries about the system that is learned. The answer to a query
/// `(prefix, suffix)` is the output the system produces on the input `prefix · suffix`, it may
/// cover more than just `suffix` since the learner only looks at the part that concerns `suffix`.
///
/// Oracles are assumed to be deterministic and to answer every query, an oracle that gives
/// different answers for the same input word is detected by the learner and reported as an
/// error.
pub trait MembershipOracle {
    type Symbol: Symbol;
    type Output: Output;

    /// Answers a single query.
    fn answer(&self, prefix: &[Self::Symbol], suffix: &[Self::Symbol]) -> Self::Output;

    /// Answers every query of the batch by filling in its output. The default answers them one
    /// after another.
    fn answer_batch(&self, queries: &mut [Query<Self::Symbol, Self::Output>]) {
        for query in queries.iter_mut() {
            query.output = Some(self.answer(&query.prefix, &query.suffix));
        }
    }
}

impl<Q: MembershipOracle + ?Sized> MembershipOracle for &Q {
    type Symbol = Q::Symbol;
    type Output = Q::Output;

    fn answer(&self, prefix: &[Self::Symbol], suffix: &[Self::Symbol]) -> Self::Output {
        (**self).answer(prefix, suffix)
    }

    fn answer_batch(&self, queries: &mut [Query<Self::Symbol, Self::Output>]) {
        (**self).answer_batch(queries)
    }
}

/// An oracle based on a [`DFA`]. A query is answered with whether the automaton accepts the
/// input word.
#[derive(Debug, Clone)]
pub struct DFAOracle<A: Alphabet> {
    automaton: DFA<A>,
}

impl<A: Alphabet> DFAOracle<A> {
    /// Creates an oracle for the given automaton, which has to be complete.
    pub fn new(automaton: DFA<A>) -> Result<Self> {
        if !automaton.ts().is_complete() {
            return Err(LearningError::IncompleteTarget);
        }
        Ok(Self { automaton })
    }

    pub fn automaton(&self) -> &DFA<A> {
        &self.automaton
    }
}

impl<A: Alphabet> MembershipOracle for DFAOracle<A> {
    type Symbol = A::Symbol;
    type Output = bool;

    fn answer(&self, prefix: &[A::Symbol], suffix: &[A::Symbol]) -> bool {
        let out = self.automaton.accepts(&[prefix, suffix].concat());
        trace!("{}·{} is {}", prefix.show(), suffix.show(), out.show());
        out
    }
}

/// An oracle based on a [`MealyMachine`]. A query is answered with the outputs of all
/// transitions taken on the input word.
///
/// # Panics
/// Answering panics if the input word contains a symbol that is not in the alphabet of the
/// machine, so the learner must not work with a larger alphabet than the target.
#[derive(Debug, Clone)]
pub struct MealyOracle<A: Alphabet, O: Color> {
    automaton: MealyMachine<A, O>,
}

impl<A: Alphabet, O: Color> MealyOracle<A, O> {
    /// Creates an oracle for the given machine, which has to be complete.
    pub fn new(automaton: MealyMachine<A, O>) -> Result<Self> {
        if !automaton.ts().is_complete() {
            return Err(LearningError::IncompleteTarget);
        }
        Ok(Self { automaton })
    }

    pub fn automaton(&self) -> &MealyMachine<A, O> {
        &self.automaton
    }
}

impl<A: Alphabet, O: Color + Show> MembershipOracle for MealyOracle<A, O> {
    type Symbol = A::Symbol;
    type Output = Word<O>;

    fn answer(&self, prefix: &[A::Symbol], suffix: &[A::Symbol]) -> Word<O> {
        self.automaton
            .transform(&[prefix, suffix].concat())
            .expect("complete machine has a run on every word over its alphabet")
            .into()
    }
}

/// An oracle based on a [`MooreMachine`]. A query is answered with the outputs of all states
/// visited on the input word, including the initial one.
///
/// # Panics
/// Like [`MealyOracle`], answering panics on symbols that are not in the alphabet of the machine.
#[derive(Debug, Clone)]
pub struct MooreOracle<A: Alphabet, O: Color> {
    automaton: MooreMachine<A, O>,
}

impl<A: Alphabet, O: Color> MooreOracle<A, O> {
    /// Creates an oracle for the given machine, which has to be complete.
    pub fn new(automaton: MooreMachine<A, O>) -> Result<Self> {
        if !automaton.ts().is_complete() {
            return Err(LearningError::IncompleteTarget);
        }
        Ok(Self { automaton })
    }

    pub fn automaton(&self) -> &MooreMachine<A, O> {
        &self.automaton
    }
}

impl<A: Alphabet, O: Color + Show> MembershipOracle for MooreOracle<A, O> {
    type Symbol = A::Symbol;
    type Output = Word<O>;

    fn answer(&self, prefix: &[A::Symbol], suffix: &[A::Symbol]) -> Word<O> {
        self.automaton
            .transform(&[prefix, suffix].concat())
            .expect("complete machine has a run on every word over its alphabet")
            .into()
    }
}

/// Wraps a function that computes the output on a whole input word.
///
/// ```
/// use sift_learning::prelude::*;
/// let oracle = FnOracle::new(|word: &[char]| word.len() % 3 == 0);
/// assert!(oracle.answer(&['a'], &['b', 'c']));
/// ```
#[derive(Clone)]
pub struct FnOracle<S, O, F> {
    function: F,
    _marker: std::marker::PhantomData<fn(&[S]) -> O>,
}

impl<S, O, F: Fn(&[S]) -> O> FnOracle<S, O, F> {
    pub fn new(function: F) -> Self {
        Self {
            function,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<S: Symbol, O: Output, F: Fn(&[S]) -> O> MembershipOracle for FnOracle<S, O, F> {
    type Symbol = S;
    type Output = O;

    fn answer(&self, prefix: &[S], suffix: &[S]) -> O {
        (self.function)(&[prefix, suffix].concat())
    }
}

/// Counts the queries that reach the wrapped oracle and the symbols they contain.
#[derive(Debug, Default)]
pub struct CountingOracle<Q> {
    oracle: Q,
    queries: AtomicUsize,
    symbols: AtomicUsize,
}

impl<Q> CountingOracle<Q> {
    pub fn new(oracle: Q) -> Self {
        Self {
            oracle,
            queries: AtomicUsize::new(0),
            symbols: AtomicUsize::new(0),
        }
    }

    /// Number of queries answered so far.
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    /// Total length of the input words of all queries answered so far.
    pub fn symbols(&self) -> usize {
        self.symbols.load(Ordering::Relaxed)
    }

    pub fn inner(&self) -> &Q {
        &self.oracle
    }
}

impl<Q: MembershipOracle> MembershipOracle for CountingOracle<Q> {
    type Symbol = Q::Symbol;
    type Output = Q::Output;

    fn answer(&self, prefix: &[Self::Symbol], suffix: &[Self::Symbol]) -> Self::Output {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.symbols
            .fetch_add(prefix.len() + suffix.len(), Ordering::Relaxed);
        self.oracle.answer(prefix, suffix)
    }

    fn answer_batch(&self, queries: &mut [Query<Self::Symbol, Self::Output>]) {
        self.queries.fetch_add(queries.len(), Ordering::Relaxed);
        self.symbols.fetch_add(
            queries
                .iter()
                .map(|q| q.prefix.len() + q.suffix.len())
                .sum(),
            Ordering::Relaxed,
        );
        self.oracle.answer_batch(queries)
    }
}

/// Answers batches of queries in parallel on the global `rayon` thread pool. Single queries are
/// answered on the calling thread.
#[derive(Debug, Clone)]
pub struct ParallelOracle<Q> {
    oracle: Q,
}

impl<Q> ParallelOracle<Q> {
    pub fn new(oracle: Q) -> Self {
        Self { oracle }
    }

    pub fn inner(&self) -> &Q {
        &self.oracle
    }
}

impl<Q> MembershipOracle for ParallelOracle<Q>
where
    Q: MembershipOracle + Sync,
    Q::Symbol: Send,
    Q::Output: Send,
{
    type Symbol = Q::Symbol;
    type Output = Q::Output;

    fn answer(&self, prefix: &[Self::Symbol], suffix: &[Self::Symbol]) -> Self::Output {
        self.oracle.answer(prefix, suffix)
    }

    fn answer_batch(&self, queries: &mut [Query<Self::Symbol, Self::Output>]) {
        if queries.len() < 2 {
            return self.oracle.answer_batch(queries);
        }
        queries.par_iter_mut().for_each(|query| {
            query.output = Some(self.oracle.answer(&query.prefix, &query.suffix));
        });
        trace!(
            "answered {} queries on {} threads",
            queries.len(),
            rayon::current_num_threads()
        );
    }
}
