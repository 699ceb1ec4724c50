use crate::{
    alphabet::{Alphabet, CharAlphabet, Symbol},
    ts::{StateIndex, TSBuilder, DTS},
    Color, Int, Void,
};

/// A deterministic finite automaton, i.e. a [`DTS`] whose states are colored with a boolean
/// indicating whether they are accepting, together with an initial state.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DFA<A: Alphabet = CharAlphabet> {
    ts: DTS<A, bool, Void>,
    initial: StateIndex,
}

impl<A: Alphabet> DFA<A> {
    /// Wraps the given transition system with the given initial state.
    pub fn from_parts(ts: DTS<A, bool, Void>, initial: StateIndex) -> Self {
        assert!(initial < ts.size(), "initial state does not exist");
        Self { ts, initial }
    }

    /// Returns the initial state.
    pub fn initial(&self) -> StateIndex {
        self.initial
    }

    /// Gives access to the underlying transition system.
    pub fn ts(&self) -> &DTS<A, bool, Void> {
        &self.ts
    }

    /// Returns the alphabet.
    pub fn alphabet(&self) -> &A {
        self.ts.alphabet()
    }

    /// Returns the number of states.
    pub fn size(&self) -> usize {
        self.ts.size()
    }

    /// Returns whether `state` is accepting.
    pub fn is_accepting(&self, state: StateIndex) -> bool {
        self.ts.state_color(state).copied().unwrap_or(false)
    }

    /// Returns true if and only if the run on `word` exists and ends in an accepting state.
    pub fn accepts(&self, word: &[A::Symbol]) -> bool {
        self.ts
            .reached_state_index_from(self.initial, word)
            .map(|q| self.is_accepting(q))
            .unwrap_or(false)
    }
}

/// A Mealy machine is a transition system where each transition has an output. Running it on a
/// word of length `n` produces `n` outputs, one per transition.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MealyMachine<A: Alphabet = CharAlphabet, O = Int> {
    ts: DTS<A, Void, O>,
    initial: StateIndex,
}

impl<A: Alphabet, O: Color> MealyMachine<A, O> {
    /// Wraps the given transition system with the given initial state.
    pub fn from_parts(ts: DTS<A, Void, O>, initial: StateIndex) -> Self {
        assert!(initial < ts.size(), "initial state does not exist");
        Self { ts, initial }
    }

    /// Returns the initial state.
    pub fn initial(&self) -> StateIndex {
        self.initial
    }

    /// Gives access to the underlying transition system.
    pub fn ts(&self) -> &DTS<A, Void, O> {
        &self.ts
    }

    /// Returns the alphabet.
    pub fn alphabet(&self) -> &A {
        self.ts.alphabet()
    }

    /// Returns the number of states.
    pub fn size(&self) -> usize {
        self.ts.size()
    }

    /// Produces the sequence of outputs along the run on `word`, or `None` if the machine is
    /// not defined on some prefix of `word`.
    pub fn transform(&self, word: &[A::Symbol]) -> Option<Vec<O>> {
        let mut state = self.initial;
        let mut out = Vec::with_capacity(word.len());
        for sym in word {
            let (target, color) = self.ts.edge(state, *sym)?;
            out.push(color.clone());
            state = target;
        }
        Some(out)
    }

    /// Returns the output of the last transition taken on `word`.
    pub fn last_output(&self, word: &[A::Symbol]) -> Option<O> {
        self.transform(word)?.pop()
    }
}

/// A Moore machine assigns an output to every state. Running it on a word of length `n`
/// visits `n + 1` states and thus produces `n + 1` outputs.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MooreMachine<A: Alphabet = CharAlphabet, O = Int> {
    ts: DTS<A, O, Void>,
    initial: StateIndex,
}

impl<A: Alphabet, O: Color> MooreMachine<A, O> {
    /// Wraps the given transition system with the given initial state.
    pub fn from_parts(ts: DTS<A, O, Void>, initial: StateIndex) -> Self {
        assert!(initial < ts.size(), "initial state does not exist");
        Self { ts, initial }
    }

    /// Returns the initial state.
    pub fn initial(&self) -> StateIndex {
        self.initial
    }

    /// Gives access to the underlying transition system.
    pub fn ts(&self) -> &DTS<A, O, Void> {
        &self.ts
    }

    /// Returns the alphabet.
    pub fn alphabet(&self) -> &A {
        self.ts.alphabet()
    }

    /// Returns the number of states.
    pub fn size(&self) -> usize {
        self.ts.size()
    }

    /// Returns the output of the state that is reached on `word`.
    pub fn output(&self, word: &[A::Symbol]) -> Option<O> {
        let q = self.ts.reached_state_index_from(self.initial, word)?;
        self.ts.state_color(q).cloned()
    }

    /// Produces the outputs of all states visited on `word`, starting with the initial one.
    pub fn transform(&self, word: &[A::Symbol]) -> Option<Vec<O>> {
        let mut state = self.initial;
        let mut out = Vec::with_capacity(word.len() + 1);
        out.push(self.ts.state_color(state)?.clone());
        for sym in word {
            state = self.ts.successor(state, *sym)?;
            out.push(self.ts.state_color(state)?.clone());
        }
        Some(out)
    }
}

impl<S: Symbol> TSBuilder<S, bool, Void> {
    /// Builds a [`DFA`] with the given initial state.
    pub fn into_dfa(self, initial: StateIndex) -> DFA<crate::alphabet::SimpleAlphabet<S>> {
        DFA::from_parts(self.into_dts(), initial)
    }
}

impl<S: Symbol, O: Color> TSBuilder<S, Void, O> {
    /// Builds a [`MealyMachine`] with the given initial state.
    pub fn into_mealy(
        self,
        initial: StateIndex,
    ) -> MealyMachine<crate::alphabet::SimpleAlphabet<S>, O> {
        MealyMachine::from_parts(self.into_dts(), initial)
    }
}

impl<S: Symbol, O: Color> TSBuilder<S, O, Void> {
    /// Builds a [`MooreMachine`] with the given initial state.
    pub fn into_moore(
        self,
        initial: StateIndex,
    ) -> MooreMachine<crate::alphabet::SimpleAlphabet<S>, O> {
        MooreMachine::from_parts(self.into_dts(), initial)
    }
}
