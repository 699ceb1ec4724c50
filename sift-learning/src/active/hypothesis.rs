use std::{collections::VecDeque, fmt::Debug, hash::Hash};

use sift_core::{math, prelude::*, ts::StateIndex, word::Word};

use super::MembershipOracle;
use crate::{
    datastructure::{DiscriminationTree, LeafId},
    error::{LearningError, Result},
    semantics::{DfaSemantics, MealySemantics, MooreSemantics, Semantics},
};

/// The output type a [`Hypothesis`] produces.
pub type OutputOf<H> = <<H as Hypothesis>::Semantics as Semantics>::Output;

/// A deterministic machine whose behavior can be compared with the answers of a membership
/// oracle. It is implemented by the hypothesis the learner maintains as well as by the concrete
/// automata, which lets both be used interchangeably by equivalence oracles.
///
/// Outputs are given in the shape of the oracle's answers: state outputs for DFAs and Moore
/// machines, transition outputs for Mealy machines.
pub trait Hypothesis {
    type Symbol: Symbol;
    type Semantics: Semantics;
    type StateIndex: Copy + Eq + Hash + Ord + Debug;

    fn initial(&self) -> Option<Self::StateIndex>;

    fn successor(&self, state: Self::StateIndex, symbol: Self::Symbol) -> Option<Self::StateIndex>;

    /// The output of `state`, if states carry outputs.
    fn state_output(
        &self,
        state: Self::StateIndex,
    ) -> Option<<Self::Semantics as Semantics>::Output>;

    /// The output of the transition from `state` on `symbol`, if transitions carry outputs.
    fn transition_output(
        &self,
        state: Self::StateIndex,
        symbol: Self::Symbol,
    ) -> Option<<Self::Semantics as Semantics>::Output>;

    fn reached_index_from(
        &self,
        state: Self::StateIndex,
        word: &[Self::Symbol],
    ) -> Option<Self::StateIndex> {
        word.iter()
            .try_fold(state, |q, sym| self.successor(q, *sym))
    }

    fn reached_index(&self, word: &[Self::Symbol]) -> Option<Self::StateIndex> {
        self.reached_index_from(self.initial()?, word)
    }

    /// The answer this machine gives to the query `(prefix, suffix)`.
    fn suffix_output(
        &self,
        prefix: &[Self::Symbol],
        suffix: &[Self::Symbol],
    ) -> Option<<Self::Semantics as Semantics>::Output> {
        Self::Semantics::evaluate(self, prefix, suffix)
    }

    /// The answer this machine gives to the query `(ε, word)`.
    fn output(&self, word: &[Self::Symbol]) -> Option<<Self::Semantics as Semantics>::Output> {
        self.suffix_output(&[], word)
    }
}

/// Finds a shortest word on which `left` and `right` behave differently by a breadth first
/// search through their product. Returns `None` if they are equivalent on `alphabet`.
pub fn separating_word<L, R, A>(left: &L, right: &R, alphabet: &A) -> Option<Word<A::Symbol>>
where
    A: Alphabet,
    L: Hypothesis<Symbol = A::Symbol>,
    R: Hypothesis<Symbol = A::Symbol, Semantics = L::Semantics>,
{
    let start = match (left.initial(), right.initial()) {
        (Some(l), Some(r)) => (l, r),
        (None, None) => return None,
        _ => return Some(Word::empty()),
    };
    let mut seen = math::Set::default();
    seen.insert(start);
    let mut queue = VecDeque::from([(start, Word::empty())]);

    while let Some(((l, r), word)) = queue.pop_front() {
        if left.state_output(l) != right.state_output(r) {
            return Some(word);
        }
        for sym in alphabet.universe() {
            let extended = word.append(sym);
            if left.transition_output(l, sym) != right.transition_output(r, sym) {
                return Some(extended);
            }
            match (left.successor(l, sym), right.successor(r, sym)) {
                (Some(p), Some(q)) => {
                    if seen.insert((p, q)) {
                        queue.push_back(((p, q), extended));
                    }
                }
                (None, None) => {}
                _ => return Some(extended),
            }
        }
    }
    None
}

/// Read-only view of the hypothesis that a [`DiscriminationTree`] represents. States are the
/// live leaves, the initial state is the leaf of the empty word and the transition from a leaf
/// on a symbol leads to the leaf of its representative extended by that symbol.
///
/// The view is cheap to create and reflects the tree at the time it is used, it can be turned
/// into a standalone automaton with [`HypothesisView::to_dfa`], [`HypothesisView::to_mealy`] or
/// [`HypothesisView::to_moore`].
pub struct HypothesisView<'a, A: Alphabet, M: Semantics, Q> {
    tree: &'a DiscriminationTree<A, M, Q>,
}

impl<'a, A: Alphabet, M: Semantics, Q> Clone for HypothesisView<'a, A, M, Q> {
    fn clone(&self) -> Self {
        Self { tree: self.tree }
    }
}

impl<'a, A, M, Q> HypothesisView<'a, A, M, Q>
where
    A: Alphabet,
    M: Semantics,
    Q: MembershipOracle<Symbol = A::Symbol, Output = M::Output>,
{
    pub fn new(tree: &'a DiscriminationTree<A, M, Q>) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &'a DiscriminationTree<A, M, Q> {
        self.tree
    }

    pub fn alphabet(&self) -> &'a A {
        self.tree.alphabet()
    }

    /// Number of states.
    pub fn size(&self) -> usize {
        self.tree.size()
    }

    /// The states in the order the tree enumerates its leaves.
    pub fn states(&self) -> Vec<LeafId> {
        self.tree.leaves().collect()
    }

    /// The representative of `state`, i.e. its first short prefix.
    pub fn representative(&self, state: LeafId) -> Option<&'a Word<A::Symbol>> {
        let first = *self.tree.shorts(state).first()?;
        Some(self.tree.word(first))
    }

    /// Numbers the states consecutively, in the order of [`Self::states`].
    pub fn state_indices(&self) -> math::Bijection<StateIndex, LeafId> {
        self.tree.leaves().enumerate().collect()
    }

    /// The states visited while reading `word`, starting with the initial one.
    pub fn run(&self, word: &[A::Symbol]) -> Option<Vec<LeafId>> {
        let mut state = self.initial()?;
        let mut visited = Vec::with_capacity(word.len() + 1);
        visited.push(state);
        for &sym in word {
            state = self.successor(state, sym)?;
            visited.push(state);
        }
        Some(visited)
    }

    fn incomplete(&self, state: LeafId) -> LearningError {
        LearningError::IncompleteHypothesis(
            self.representative(state)
                .map(|word| word.show())
                .unwrap_or_else(|| state.to_string()),
        )
    }

    /// Copies the hypothesis into a transition system, coloring states and edges with the given
    /// functions. Returns the transition system together with the index of the initial state.
    fn materialize<X, Y>(
        &self,
        state_color: impl Fn(&Self, LeafId) -> Option<X>,
        edge_color: impl Fn(&Self, LeafId, A::Symbol) -> Option<Y>,
    ) -> Result<(DTS<A, X, Y>, StateIndex)>
    where
        X: Color,
        Y: Color,
    {
        let indices = self.state_indices();
        let mut ts = DTS::for_alphabet(self.alphabet().clone());
        for (_, &state) in indices.iter() {
            let color = state_color(self, state).ok_or_else(|| self.incomplete(state))?;
            ts.add_state(color);
        }
        for (&source, &state) in indices.iter() {
            for sym in self.alphabet().universe() {
                let target = self
                    .successor(state, sym)
                    .and_then(|leaf| indices.get_by_right(&leaf))
                    .ok_or_else(|| self.incomplete(state))?;
                let color = edge_color(self, state, sym).ok_or_else(|| self.incomplete(state))?;
                ts.add_edge(source, sym, color, *target);
            }
        }
        let initial = self
            .initial()
            .and_then(|leaf| indices.get_by_right(&leaf).copied())
            .ok_or(LearningError::NotStarted)?;
        Ok((ts, initial))
    }
}

impl<'a, A, M, Q> Hypothesis for HypothesisView<'a, A, M, Q>
where
    A: Alphabet,
    M: Semantics,
    Q: MembershipOracle<Symbol = A::Symbol, Output = M::Output>,
{
    type Symbol = A::Symbol;
    type Semantics = M;
    type StateIndex = LeafId;

    fn initial(&self) -> Option<LeafId> {
        let root = self.tree.prefixes().root();
        self.tree.prefixes().leaf(root)
    }

    fn successor(&self, state: LeafId, symbol: A::Symbol) -> Option<LeafId> {
        let first = *self.tree.shorts(state).first()?;
        let successor = self.tree.prefixes().successor(first, symbol)?;
        self.tree.prefixes().leaf(successor)
    }

    fn state_output(&self, state: LeafId) -> Option<M::Output> {
        if !M::STATE_OUTPUTS {
            return None;
        }
        if let Some(label) = self.tree.root_label(state) {
            return Some(label.clone());
        }
        let first = *self.tree.shorts(state).first()?;
        self.tree.prefixes().output(first).cloned()
    }

    fn transition_output(&self, state: LeafId, symbol: A::Symbol) -> Option<M::Output> {
        if !M::TRANSITION_OUTPUTS {
            return None;
        }
        let first = *self.tree.shorts(state).first()?;
        let successor = self.tree.prefixes().successor(first, symbol)?;
        self.tree.prefixes().output(successor).cloned()
    }
}

impl<'a, A, Q> HypothesisView<'a, A, DfaSemantics, Q>
where
    A: Alphabet,
    Q: MembershipOracle<Symbol = A::Symbol, Output = bool>,
{
    pub fn accepts(&self, word: &[A::Symbol]) -> Option<bool> {
        self.output(word)
    }

    /// Copies the hypothesis into a [`DFA`].
    pub fn to_dfa(&self) -> Result<DFA<A>> {
        let (ts, initial) = self.materialize(
            |view, state| view.state_output(state),
            |_, _, _| Some(Void),
        )?;
        Ok(DFA::from_parts(ts, initial))
    }
}

impl<'a, A, O, Q> HypothesisView<'a, A, MealySemantics<O>, Q>
where
    A: Alphabet,
    O: Color + Show,
    Q: MembershipOracle<Symbol = A::Symbol, Output = Word<O>>,
{
    /// The outputs produced on `word`.
    pub fn transduce(&self, word: &[A::Symbol]) -> Option<Word<O>> {
        self.output(word)
    }

    /// Copies the hypothesis into a [`MealyMachine`].
    pub fn to_mealy(&self) -> Result<MealyMachine<A, O>> {
        let (ts, initial) = self.materialize(
            |_, _| Some(Void),
            |view, state, sym| view.transition_output(state, sym)?.first().cloned(),
        )?;
        Ok(MealyMachine::from_parts(ts, initial))
    }
}

impl<'a, A, O, Q> HypothesisView<'a, A, MooreSemantics<O>, Q>
where
    A: Alphabet,
    O: Color + Show,
    Q: MembershipOracle<Symbol = A::Symbol, Output = Word<O>>,
{
    /// The outputs produced on `word`.
    pub fn transduce(&self, word: &[A::Symbol]) -> Option<Word<O>> {
        self.output(word)
    }

    /// Copies the hypothesis into a [`MooreMachine`].
    pub fn to_moore(&self) -> Result<MooreMachine<A, O>> {
        let (ts, initial) = self.materialize(
            |view, state| view.state_output(state)?.first().cloned(),
            |_, _, _| Some(Void),
        )?;
        Ok(MooreMachine::from_parts(ts, initial))
    }
}

impl<A: Alphabet> Hypothesis for DFA<A> {
    type Symbol = A::Symbol;
    type Semantics = DfaSemantics;
    type StateIndex = StateIndex;

    fn initial(&self) -> Option<StateIndex> {
        Some(DFA::initial(self))
    }

    fn successor(&self, state: StateIndex, symbol: A::Symbol) -> Option<StateIndex> {
        self.ts().successor(state, symbol)
    }

    fn state_output(&self, state: StateIndex) -> Option<bool> {
        self.ts().state_color(state).copied()
    }

    fn transition_output(&self, _state: StateIndex, _symbol: A::Symbol) -> Option<bool> {
        None
    }
}

impl<A: Alphabet, O: Color + Show> Hypothesis for MealyMachine<A, O> {
    type Symbol = A::Symbol;
    type Semantics = MealySemantics<O>;
    type StateIndex = StateIndex;

    fn initial(&self) -> Option<StateIndex> {
        Some(MealyMachine::initial(self))
    }

    fn successor(&self, state: StateIndex, symbol: A::Symbol) -> Option<StateIndex> {
        self.ts().successor(state, symbol)
    }

    fn state_output(&self, _state: StateIndex) -> Option<Word<O>> {
        None
    }

    fn transition_output(&self, state: StateIndex, symbol: A::Symbol) -> Option<Word<O>> {
        let (_, color) = self.ts().edge(state, symbol)?;
        Some(Word::from_symbol(color.clone()))
    }
}

impl<A: Alphabet, O: Color + Show> Hypothesis for MooreMachine<A, O> {
    type Symbol = A::Symbol;
    type Semantics = MooreSemantics<O>;
    type StateIndex = StateIndex;

    fn initial(&self) -> Option<StateIndex> {
        Some(MooreMachine::initial(self))
    }

    fn successor(&self, state: StateIndex, symbol: A::Symbol) -> Option<StateIndex> {
        self.ts().successor(state, symbol)
    }

    fn state_output(&self, state: StateIndex) -> Option<Word<O>> {
        self.ts().state_color(state).cloned().map(Word::from_symbol)
    }

    fn transition_output(&self, _state: StateIndex, _symbol: A::Symbol) -> Option<Word<O>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use sift_core::{prelude::*, word::Word};

    use super::{separating_word, Hypothesis};

    fn mod_three() -> DFA<CharAlphabet> {
        TSBuilder::with_state_colors([true, false, false])
            .with_transitions([(0, 'a', Void, 1), (1, 'a', Void, 2), (2, 'a', Void, 0)])
            .into_dfa(0)
    }

    #[test]
    fn automata_answer_like_oracles() {
        let dfa = mod_three();
        assert_eq!(dfa.suffix_output(&['a'], &['a', 'a']), Some(true));
        assert_eq!(dfa.output(&['a']), Some(false));

        let mealy: MealyMachine<CharAlphabet, u8> = TSBuilder::without_state_colors()
            .with_transitions([(0, 'a', 0, 1), (1, 'a', 1, 0)])
            .into_mealy(0);
        assert_eq!(
            mealy.suffix_output(&['a'], &['a', 'a']),
            Some(Word::from(vec![1, 0]))
        );

        let moore = TSBuilder::with_state_colors([5u8, 6])
            .with_transitions([(0, 'a', Void, 1), (1, 'a', Void, 0)])
            .into_moore(0);
        assert_eq!(
            moore.suffix_output(&['a'], &['a']),
            Some(Word::from(vec![6, 5]))
        );
        assert_eq!(Hypothesis::output(&moore, &[]), Some(Word::from(vec![5])));
    }

    #[test]
    fn separating_words_are_shortest() {
        let dfa = mod_three();
        let other = TSBuilder::with_state_colors([true, false])
            .with_transitions([(0, 'a', Void, 1), (1, 'a', Void, 0)])
            .into_dfa(0);
        let alphabet = dfa.alphabet().clone();
        assert_eq!(
            separating_word(&dfa, &other, &alphabet),
            Some(Word::from("aa"))
        );
        assert_eq!(separating_word(&dfa, &dfa, &alphabet), None);
    }
}
