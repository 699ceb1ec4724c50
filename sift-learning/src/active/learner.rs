use std::{collections::VecDeque, time::Instant};

use sift_core::{alphabet::GrowingAlphabet, prelude::*, word::Word};
use tracing::{debug, info, trace, warn};

use super::{Counterexample, EquivalenceOracle, Hypothesis, HypothesisView, MembershipOracle, Query};
use crate::{
    config::LearnerConfig,
    datastructure::{DiscriminationTree, PrefixId},
    error::{LearningError, Result},
    semantics::{DfaSemantics, MealySemantics, MooreSemantics, Semantics},
};

/// Learner for deterministic finite automata.
pub type DfaLearner<A, Q> = Learner<A, DfaSemantics, Q>;
/// Learner for Mealy machines with outputs of type `O`.
pub type MealyLearner<A, O, Q> = Learner<A, MealySemantics<O>, Q>;
/// Learner for Moore machines with outputs of type `O`.
pub type MooreLearner<A, O, Q> = Learner<A, MooreSemantics<O>, Q>;

/// Drives the learning of a machine through a [`DiscriminationTree`].
///
/// After [`Learner::start_learning`] the hypothesis consists of the single state of the empty
/// word. Every counterexample handed to [`Learner::refine_hypothesis`] is decomposed by a binary
/// search into a prefix that leads to a new state and a suffix that shows why. The prefix is
/// promoted, the suffix is kept as a witness and re-evaluated after every refinement, so that a
/// single counterexample may reveal several states. Discriminators never grow beyond what
/// refinement derives from existing ones, they are not copied from counterexamples.
///
/// [`Learner::infer`] runs the complete loop against an [`EquivalenceOracle`].
pub struct Learner<A: Alphabet, M: Semantics, Q> {
    tree: DiscriminationTree<A, M, Q>,
    config: LearnerConfig,
    started: bool,
    rounds: usize,
}

impl<A, M, Q> Learner<A, M, Q>
where
    A: Alphabet,
    M: Semantics,
    Q: MembershipOracle<Symbol = A::Symbol, Output = M::Output>,
{
    /// Creates a learner with the default configuration.
    pub fn new(alphabet: A, oracle: Q) -> Self {
        Self::with_config(alphabet, oracle, LearnerConfig::default())
    }

    pub fn with_config(alphabet: A, oracle: Q, config: LearnerConfig) -> Self {
        Self {
            tree: DiscriminationTree::new(alphabet, oracle, &config),
            config,
            started: false,
            rounds: 0,
        }
    }

    pub fn tree(&self) -> &DiscriminationTree<A, M, Q> {
        &self.tree
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    /// Number of counterexamples that led to a refinement.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// The current hypothesis.
    pub fn hypothesis(&self) -> Result<HypothesisView<'_, A, M, Q>> {
        if !self.started {
            return Err(LearningError::NotStarted);
        }
        Ok(HypothesisView::new(&self.tree))
    }

    /// Sifts the empty word and builds the first hypothesis. Calling this on a learner that has
    /// already been started does nothing.
    pub fn start_learning(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        let start = Instant::now();
        self.tree.sift_word(&[])?;
        self.started = true;
        self.stabilize()?;
        info!(
            "initial hypothesis has {} states, built in {}ms",
            self.tree.size(),
            start.elapsed().as_millis()
        );
        Ok(())
    }

    /// Refines the hypothesis until it agrees with `counterexample`. The output of the
    /// counterexample is the answer the system gives for its word, as a membership oracle would
    /// give it for an empty prefix. Returns `false` if the hypothesis already produces that
    /// output, in which case nothing changes.
    pub fn refine_hypothesis(
        &mut self,
        counterexample: Counterexample<A::Symbol, M::Output>,
    ) -> Result<bool> {
        if !self.started {
            return Err(LearningError::NotStarted);
        }
        let (word, answer) = counterexample;
        let output =
            M::relevant(&answer, word.len()).ok_or_else(|| LearningError::MalformedAnswer {
                prefix: Word::<A::Symbol>::empty().show(),
                suffix: word.show(),
                answer: answer.show(),
            })?;
        let target = Query::answered(Word::empty(), word, output);
        if !self.is_counterexample(&target)? {
            debug!(
                "{} is not a counterexample, hypothesis already agrees",
                target.suffix.show()
            );
            return Ok(false);
        }
        self.rounds += 1;
        let states = self.tree.size();

        let mut witnesses = VecDeque::from([target.clone()]);
        let mut iterations = 0;
        while self.is_counterexample(&target)? {
            iterations += 1;
            if iterations > self.config.iteration_threshold {
                return Err(LearningError::IterationThresholdExceeded(
                    self.config.iteration_threshold,
                ));
            }
            let Some(witness) = witnesses.front_mut() else {
                break;
            };
            if witness.output.is_none() {
                witness.output = Some(self.tree.query(&witness.prefix, &witness.suffix)?);
            }
            let witness = witness.clone();

            if self.is_counterexample(&witness)? {
                self.analyze(&witness, &mut witnesses)?;
                self.stabilize()?;
            } else {
                trace!(
                    "dropping witness {} · {}",
                    witness.prefix.show(),
                    witness.suffix.show()
                );
                witnesses.pop_front();
            }
        }

        info!(
            "counterexample {} raised the number of states from {states} to {}",
            target.suffix.show(),
            self.tree.size()
        );
        Ok(true)
    }

    /// Runs the learning loop: the hypothesis is handed to `equivalence` and refined with the
    /// counterexample it returns, until there is none. The number of rounds is bounded by the
    /// iteration threshold of the configuration.
    pub fn infer<E>(&mut self, equivalence: &E) -> Result<HypothesisView<'_, A, M, Q>>
    where
        E: EquivalenceOracle<Symbol = A::Symbol, Semantics = M>,
    {
        let start = Instant::now();
        self.start_learning()?;
        let threshold = self.config.iteration_threshold;

        for iteration in 0..threshold {
            let counterexample = {
                let hypothesis = self.hypothesis()?;
                trace!("iteration {iteration} with tree\n{:?}", self.tree);
                equivalence.find_counterexample(&hypothesis, self.tree.alphabet())
            };
            let Some(counterexample) = counterexample else {
                info!(
                    "learned {} states with {} counterexamples in {}ms, {} of {} cached answers reused",
                    self.tree.size(),
                    self.rounds,
                    start.elapsed().as_millis(),
                    self.tree.cache().hits(),
                    self.tree.cache().len()
                );
                return self.hypothesis();
            };
            if !self.refine_hypothesis(counterexample)? {
                warn!("equivalence oracle returned a word the hypothesis already handles");
            }
        }
        Err(LearningError::IterationThresholdExceeded(threshold))
    }

    /// Alternates closing and consistency checks until the tree no longer changes.
    fn stabilize(&mut self) -> Result<()> {
        for _ in 0..self.config.iteration_threshold {
            let promoted = self.tree.close()?;
            if !self.tree.make_consistent()? {
                trace!("stable with {} states after {promoted} promotions", self.tree.size());
                return Ok(());
            }
        }
        Err(LearningError::IterationThresholdExceeded(
            self.config.iteration_threshold,
        ))
    }

    fn is_counterexample(&self, query: &Query<A::Symbol, M::Output>) -> Result<bool> {
        let Some(expected) = &query.output else {
            return Ok(false);
        };
        let predicted = self
            .hypothesis()?
            .suffix_output(&query.prefix, &query.suffix)
            .ok_or_else(|| LearningError::IncompleteHypothesis(query.input().show()))?;
        Ok(&predicted != expected)
    }

    /// Finds the position in the input of `witness` at which the hypothesis first goes wrong and
    /// promotes the prefix that ends there. The suffix behind it becomes a new witness, for the
    /// promoted prefix and for every short prefix of the leaf it was classified into.
    fn analyze(
        &mut self,
        witness: &Query<A::Symbol, M::Output>,
        witnesses: &mut VecDeque<Query<A::Symbol, M::Output>>,
    ) -> Result<()> {
        let word = witness.input();
        let longest = self.first_long_prefix(&word)?;
        let mut upper = word.len();
        let mut lower = self.tree.word(longest).len() - 1;
        let mut extension = None;

        // answers for the prefix of length `lower` still differ, for `upper` they agree
        while upper - lower > 1 {
            let mid = (upper + lower) / 2;
            let suffix = word.skip(mid);
            match self.diverging_short(&word.prefix(mid), &suffix)? {
                Some(u) => {
                    extension = Some((u, suffix[0]));
                    lower = mid;
                }
                None => upper = mid,
            }
        }

        let promoted = match extension {
            Some((u, symbol)) => self.tree.prefixes().successor(u, symbol).ok_or_else(|| {
                LearningError::UnknownPrefix(self.tree.word(u).append(symbol).show())
            })?,
            None => longest,
        };
        let continuation = word.skip(lower + 1);
        let leaf = self.tree.leaf_of(promoted)?;
        debug!(
            "{} splits into {} leading to a new state and {}",
            word.show(),
            self.tree.word(promoted).show(),
            continuation.show()
        );

        let shorts = self
            .tree
            .shorts(leaf)
            .iter()
            .map(|&u| self.tree.word(u).clone())
            .collect::<Vec<_>>();
        for u in shorts {
            witnesses.push_front(Query::new(u, continuation.clone()));
        }
        witnesses.push_front(Query::new(self.tree.word(promoted).clone(), continuation));
        self.tree.make_short_prefix(promoted)
    }

    /// Walks along `word` through the short prefixes and returns the first prefix that is not
    /// short.
    fn first_long_prefix(&self, word: &Word<A::Symbol>) -> Result<PrefixId> {
        let prefixes = self.tree.prefixes();
        let mut current = prefixes.root();
        for &symbol in word.iter() {
            current = prefixes
                .successor(current, symbol)
                .ok_or_else(|| LearningError::UnknownSymbol(symbol.show()))?;
            if !prefixes.is_short(current) {
                return Ok(current);
            }
        }
        Err(LearningError::SpuriousCounterexample(word.show()))
    }

    /// Among the short prefixes of the state the hypothesis reaches on `prefix`, returns the
    /// first one for which hypothesis and oracle disagree on `suffix`.
    fn diverging_short(
        &mut self,
        prefix: &[A::Symbol],
        suffix: &[A::Symbol],
    ) -> Result<Option<PrefixId>> {
        let predictions = {
            let hypothesis = self.hypothesis()?;
            let state = hypothesis
                .reached_index(prefix)
                .ok_or_else(|| LearningError::IncompleteHypothesis(prefix.show()))?;
            self.tree
                .shorts(state)
                .iter()
                .map(|&u| {
                    let word = self.tree.word(u);
                    hypothesis
                        .suffix_output(word, suffix)
                        .map(|predicted| (u, word.clone(), predicted))
                        .ok_or_else(|| LearningError::IncompleteHypothesis(word.show()))
                })
                .collect::<Result<Vec<_>>>()?
        };
        for (u, word, predicted) in predictions {
            if self.tree.query(&word, suffix)? != predicted {
                return Ok(Some(u));
            }
        }
        Ok(None)
    }
}

impl<A, M, Q> Learner<A, M, Q>
where
    A: GrowingAlphabet,
    M: Semantics,
    Q: MembershipOracle<Symbol = A::Symbol, Output = M::Output>,
{
    /// Adds `symbol` to the alphabet. If learning has started, the extensions of all short
    /// prefixes by the symbol are sifted and the tree is stabilized again, the hypothesis then
    /// has transitions for the new symbol.
    pub fn add_alphabet_symbol(&mut self, symbol: A::Symbol) -> Result<()> {
        self.tree.add_alphabet_symbol(symbol)?;
        if self.started {
            self.stabilize()?;
        }
        Ok(())
    }
}
