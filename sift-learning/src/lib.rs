//! Active learning of deterministic finite automata, Mealy machines and Moore machines with a
//! discrimination tree.
//!
//! The learner classifies access words by sifting them through a tree whose inner nodes are
//! labeled with discriminating suffixes. Counterexamples are decomposed by binary search, only
//! the single prefix they reveal is promoted and new discriminators are always derived from
//! existing ones, which keeps the tree small.
//!
//! ```
//! use sift_learning::prelude::*;
//!
//! // accepts words whose number of a's is divisible by three
//! let oracle = FnOracle::new(|word: &[char]| word.iter().filter(|&&c| c == 'a').count() % 3 == 0);
//! let equivalence = ExhaustiveEquivalence::<_, DfaSemantics>::new(&oracle, 6);
//! let mut learner = DfaLearner::new(CharAlphabet::of_size(2).unwrap(), &oracle);
//! let dfa = learner.infer(&equivalence).unwrap().to_dfa().unwrap();
//! assert_eq!(dfa.size(), 3);
//! assert!(dfa.accepts(&['a', 'b', 'a', 'a']));
//! ```
#![deny(rustdoc::broken_intra_doc_links)]

/// Oracles, hypotheses and the learning loop.
pub mod active;

/// Configuration of a learner.
pub mod config;
pub use config::LearnerConfig;

/// The discrimination tree and the data structures it is built from.
pub mod datastructure;

mod error;
pub use error::{LearningError, Result};

/// Parameterization over the kind of machine that is learned.
pub mod semantics;

/// Everything needed to set up and run a learner, together with the prelude of `sift_core`.
pub mod prelude {
    pub use super::{
        active::{
            CountingOracle, DFAOracle, DfaLearner, EquivalenceOracle, ExhaustiveEquivalence,
            FnOracle, Hypothesis, HypothesisView, Learner, MealyLearner, MealyOracle,
            MembershipOracle, MooreLearner, MooreOracle, ParallelOracle, Query,
            RandomWordsEquivalence,
        },
        config::LearnerConfig,
        error::LearningError,
        semantics::{DfaSemantics, MealySemantics, MooreSemantics, Semantics},
    };
    pub use sift_core::prelude::*;
}
