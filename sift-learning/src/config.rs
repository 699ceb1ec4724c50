use tracing::warn;

/// Upper bound on the number of rounds any loop of the learner may run. Can be overridden
/// through the environment variable named in [`ITERATION_THRESHOLD_VAR`].
pub const ITERATION_THRESHOLD: usize = if cfg!(debug_assertions) { 1_000 } else { 200_000 };

/// Name of the environment variable that overrides [`ITERATION_THRESHOLD`].
pub const ITERATION_THRESHOLD_VAR: &str = "SIFT_MAX_ITERATIONS";

/// Configuration of a learning run.
///
/// ```
/// use sift_learning::LearnerConfig;
/// let config = LearnerConfig::default()
///     .verify_cached_answers(true)
///     .with_iteration_threshold(50);
/// assert!(config.cache_queries);
/// assert_eq!(config.iteration_threshold, 50);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnerConfig {
    /// Whether answers of the oracle are memoized. Without the cache, oracle inconsistencies
    /// cannot be detected.
    pub cache_queries: bool,
    /// Whether a cached answer is asked again and compared with the stored one. This doubles
    /// the number of repeated queries but surfaces nondeterministic targets early.
    pub verify_cached: bool,
    /// Upper bound on the rounds of the refinement and equivalence loops.
    pub iteration_threshold: usize,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            cache_queries: true,
            verify_cached: false,
            iteration_threshold: threshold_from_env(),
        }
    }
}

impl LearnerConfig {
    /// Enables or disables memoization of oracle answers.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_queries = enabled;
        self
    }

    /// Enables or disables re-asking cached queries.
    pub fn verify_cached_answers(mut self, enabled: bool) -> Self {
        self.verify_cached = enabled;
        self
    }

    /// Sets the iteration threshold.
    pub fn with_iteration_threshold(mut self, threshold: usize) -> Self {
        self.iteration_threshold = threshold;
        self
    }
}

fn threshold_from_env() -> usize {
    match std::env::var(ITERATION_THRESHOLD_VAR) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            warn!("ignoring {ITERATION_THRESHOLD_VAR}={value}, it is not a number");
            ITERATION_THRESHOLD
        }),
        Err(_) => ITERATION_THRESHOLD,
    }
}
