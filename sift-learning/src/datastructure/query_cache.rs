use sift_core::{math, prelude::*, word::Word};
use tracing::trace;

use crate::{
    error::{LearningError, Result},
    semantics::{Output, Semantics},
};

/// Memoizes answers of the oracle. Entries are keyed by the full input word `u · v`, and for
/// every word all answers that were obtained for different splits are kept, each together with
/// the length of the suffix it was asked for.
///
/// Since the answers for one input word must agree no matter where it is split, every new
/// answer is compared with the stored ones, which detects inconsistent oracles.
#[derive(Debug, Clone)]
pub struct QueryCache<S: Show, O> {
    enabled: bool,
    entries: math::Map<Word<S>, Vec<(usize, O)>>,
    hits: usize,
}

impl<S: Symbol, O: Output> QueryCache<S, O> {
    /// Creates an empty cache. A disabled cache never returns anything and stores nothing.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: math::Map::default(),
            hits: 0,
        }
    }

    /// Number of distinct input words for which an answer is stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of queries that were answered from the cache.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Looks up the answer for `prefix · suffix`. Any answer stored for the same input word that
    /// covers the requested suffix is reduced to it.
    pub fn lookup<M>(&mut self, prefix: &[S], suffix: &[S]) -> Option<O>
    where
        M: Semantics<Output = O>,
    {
        if !self.enabled {
            return None;
        }
        let key = Word::from(prefix).concat(suffix);
        let found = self
            .entries
            .get(&key)?
            .iter()
            .find_map(|(_, output)| M::relevant(output, suffix.len()))?;
        self.hits += 1;
        Some(found)
    }

    /// Stores the answer for `prefix · suffix`. Fails if it contradicts an answer that was
    /// stored for the same input word before.
    pub fn record(&mut self, prefix: &[S], suffix: &[S], output: O) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let key = Word::from(prefix).concat(suffix);
        let stored = self.entries.entry(key).or_default();
        if let Some((_, conflicting)) = stored
            .iter()
            .find(|(_, known)| !known.agrees_with(&output))
        {
            return Err(LearningError::OracleInconsistency {
                prefix: prefix.show(),
                suffix: suffix.show(),
                first: conflicting.show(),
                second: output.show(),
            });
        }
        if stored.iter().all(|(len, _)| *len != suffix.len()) {
            trace!("caching answer {} for {}·{}", output.show(), prefix.show(), suffix.show());
            stored.push((suffix.len(), output));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sift_core::word::Word;

    use super::QueryCache;
    use crate::{
        error::LearningError,
        semantics::{DfaSemantics, MealySemantics},
    };

    #[test]
    fn answers_are_reused_across_splits() {
        let mut cache: QueryCache<char, Word<u8>> = QueryCache::new(true);
        cache
            .record(&['a'], &['b', 'c'], Word::from(vec![1, 2]))
            .unwrap();
        assert_eq!(
            cache.lookup::<MealySemantics<u8>>(&['a', 'b'], &['c']),
            Some(Word::from(vec![2]))
        );
        assert_eq!(cache.lookup::<MealySemantics<u8>>(&[], &['a', 'b', 'c']), None);
        assert_eq!(cache.hits(), 1);
        assert!(cache.record(&['a', 'b'], &['c'], Word::from(vec![2])).is_ok());
    }

    #[test]
    fn contradicting_answers_are_rejected() {
        let mut cache: QueryCache<char, bool> = QueryCache::new(true);
        cache.record(&['a'], &[], true).unwrap();
        assert!(matches!(
            cache.record(&[], &['a'], false),
            Err(LearningError::OracleInconsistency { .. })
        ));
        assert_eq!(cache.lookup::<DfaSemantics>(&[], &['a']), Some(true));
        assert!(format!("{cache:?}").contains("{a: [(0, true)]}"));
    }

    #[test]
    fn disabled_cache_stores_nothing() {
        let mut cache: QueryCache<char, bool> = QueryCache::new(false);
        cache.record(&['a'], &[], true).unwrap();
        assert!(cache.record(&['a'], &[], false).is_ok());
        assert_eq!(cache.lookup::<DfaSemantics>(&['a'], &[]), None);
        assert!(cache.is_empty());
    }
}
