use sift_core::alphabet::AlphabetError;
use thiserror::Error;

use crate::datastructure::LeafId;

/// Everything that can go wrong while learning. None of these errors can be recovered from
/// inside the discrimination tree, they are reported to whoever drives the learning loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LearningError {
    /// The oracle gave two answers for the same input word that contradict each other.
    /// The target is assumed to be deterministic, so every split made so far is suspect.
    #[error("oracle is inconsistent on {prefix} · {suffix}: answered {first} and later {second}")]
    OracleInconsistency {
        prefix: String,
        suffix: String,
        first: String,
        second: String,
    },
    /// The oracle answer is too short to contain the outputs for the queried suffix.
    #[error("oracle answer {answer} for {prefix} · {suffix} does not cover the suffix")]
    MalformedAnswer {
        prefix: String,
        suffix: String,
        answer: String,
    },
    /// A split was requested that cannot be carried out.
    #[error("cannot split leaf {leaf}: {reason}")]
    UnsplittableLeaf { leaf: LeafId, reason: &'static str },
    /// Only long prefixes can be promoted to short prefixes.
    #[error("prefix {0} is not a long prefix of any leaf")]
    NotLong(String),
    /// The leaf was replaced by a split and does not represent a state anymore.
    #[error("leaf {0} has been split and no longer represents a state")]
    RetiredLeaf(LeafId),
    /// The prefix has never been sifted, so it is not classified.
    #[error("prefix {0} has not been sifted")]
    UnknownPrefix(String),
    /// The symbol is not part of the alphabet the learner works with.
    #[error("symbol {0} is not part of the alphabet")]
    UnknownSymbol(String),
    /// The hypothesis is not defined on the given word.
    #[error("hypothesis has no run on {0}")]
    IncompleteHypothesis(String),
    /// Counterexample analysis found no long prefix to promote. Happens only if the
    /// hypothesis already agrees with the oracle on the word, i.e. the oracle changed its mind.
    #[error("no prefix of {0} can be promoted, the word does not expose a new state")]
    SpuriousCounterexample(String),
    /// The target machine given to an oracle is missing transitions.
    #[error("target machine is not complete")]
    IncompleteTarget,
    #[error(transparent)]
    Alphabet(#[from] AlphabetError),
    /// The learning loop ran into the configured iteration threshold.
    #[error("learning did not terminate within {0} iterations")]
    IterationThresholdExceeded(usize),
    /// The hypothesis was requested before learning has been started.
    #[error("learning has not been started")]
    NotStarted,
}

/// Shorthand for results whose error is a [`LearningError`].
pub type Result<T> = std::result::Result<T, LearningError>;
