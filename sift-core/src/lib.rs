//! Basic building blocks for active automata learning: alphabets, finite words and
//! small deterministic machines that serve as learning targets and as the materialized
//! form of a learned hypothesis.
#![deny(rustdoc::broken_intra_doc_links)]

use std::{fmt::Debug, hash::Hash};

/// Defines mathematical helpers, most importantly the map and set types that are used
/// throughout. These preserve insertion order, which keeps every traversal deterministic.
pub mod math;

mod show;
pub use show::Show;

/// An alphabet defines an ordered collection of symbols, each of which has a stable index.
pub mod alphabet;

/// Finite words over some alphabet, together with the usual operations on them.
pub mod word;

/// A deterministic transition system backed by per-state edge maps.
pub mod ts;

/// Deterministic finite automata, Mealy machines and Moore machines built on top of [`ts::DTS`].
#[allow(clippy::upper_case_acronyms)]
pub mod automaton;

/// A color is simply a type that can be used to color states or transitions, or more generally
/// anything that can be produced as an output.
pub trait Color: Clone + Eq + Hash + Debug {}

impl<T: Eq + Clone + Hash + Debug> Color for T {}

/// Alias for the default integer type that is used for coloring edges and states.
pub type Int = u8;

/// Represents the absence of a color. A DFA for example does not carry any information on
/// its edges, so the edge color is [`Void`].
#[derive(Hash, Eq, PartialEq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct Void;

impl Debug for Void {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#")
    }
}

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use sift_core::prelude::*;` should be enough for most uses.
pub mod prelude {
    pub use super::{
        alphabet::{Alphabet, AlphabetError, CharAlphabet, FreeMonoid, SimpleAlphabet, Symbol},
        automaton::{MealyMachine, MooreMachine, DFA},
        math,
        ts::{StateIndex, TSBuilder, DTS},
        word::Word,
        Color, Int, Show, Void,
    };
}
