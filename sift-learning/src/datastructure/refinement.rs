use sift_core::{alphabet::GrowingAlphabet, math, prelude::*, word::Word};
use tracing::{debug, trace};

use super::{Children, DiscriminationTree, InnerNode, LeafId, NodeId, PrefixId};
use crate::{
    active::MembershipOracle,
    error::{LearningError, Result},
    semantics::Semantics,
};

/// Result of splitting a leaf: the inner node that replaced it and the leaves that now hold its
/// short prefixes, in the order in which their answers were first seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub node: NodeId,
    pub leaves: Vec<LeafId>,
}

impl<A, M, Q> DiscriminationTree<A, M, Q>
where
    A: Alphabet,
    M: Semantics,
    Q: MembershipOracle<Symbol = A::Symbol, Output = M::Output>,
{
    /// Splits the leaf that contains the short prefixes `first` and `second`, using the fact
    /// that their successors on `symbol` are classified into different leaves. The new
    /// discriminator is `symbol` followed by the discriminator of the lowest common ancestor of
    /// those two leaves.
    pub fn split(&mut self, first: PrefixId, second: PrefixId, symbol: A::Symbol) -> Result<Split> {
        let leaf = self.leaf_of(first)?;
        if self.leaf_of(second)? != leaf {
            return Err(LearningError::UnsplittableLeaf {
                leaf,
                reason: "prefixes are classified into different leaves",
            });
        }
        if !self.prefixes.is_short(first) || !self.prefixes.is_short(second) {
            return Err(LearningError::UnsplittableLeaf {
                leaf,
                reason: "only short prefixes can be separated",
            });
        }
        let left = self.successor_leaf(first, symbol)?;
        let right = self.successor_leaf(second, symbol)?;
        if left == right {
            return Err(LearningError::UnsplittableLeaf {
                leaf,
                reason: "successors are not separated",
            });
        }

        let discriminator = match self.lowest_common_ancestor(left.into(), right.into()) {
            NodeId::Inner(node) => self.inner[node].discriminator.prepend(symbol),
            NodeId::Leaf(_) => M::fresh_discriminator(symbol),
        };
        self.split_on(leaf, discriminator)
    }

    /// Replaces `leaf` by an inner node labeled with `discriminator`. The short prefixes are
    /// partitioned by their answer to the discriminator, each class becomes a new leaf. The long
    /// prefixes are sifted again, starting at the new inner node. Fails if all short prefixes
    /// give the same answer, in which case the tree is left untouched.
    pub fn split_on(&mut self, leaf: LeafId, discriminator: Word<A::Symbol>) -> Result<Split> {
        if self.leaves[leaf.0].retired {
            return Err(LearningError::RetiredLeaf(leaf));
        }
        let shorts = self.leaves[leaf.0].short.clone();
        let queries = shorts
            .iter()
            .map(|u| (self.word(*u).clone(), discriminator.clone()))
            .collect::<Vec<_>>();
        let answers = self.query_batch(&queries)?;

        let mut classes: math::Map<M::Output, Vec<PrefixId>> = math::Map::default();
        for (u, answer) in shorts.into_iter().zip(answers) {
            classes.entry(answer).or_default().push(u);
        }
        if classes.len() < 2 {
            return Err(LearningError::UnsplittableLeaf {
                leaf,
                reason: "discriminator does not separate the short prefixes",
            });
        }

        let parent = self.leaves[leaf.0].parent;
        let node = self.inner.len();
        self.inner.push(InnerNode {
            parent,
            discriminator: discriminator.clone(),
            children: M::Children::default(),
        });
        let mut created = Vec::with_capacity(classes.len());
        for (answer, members) in classes {
            let child = self.new_leaf(Some(node));
            for &u in &members {
                self.prefixes.set_leaf(u, LeafId(child));
            }
            self.leaves[child].short = members;
            let inserted = self.inner[node].children.insert(answer, NodeId::Leaf(child));
            debug_assert!(inserted);
            created.push(LeafId(child));
        }

        match parent {
            Some(p) => {
                let replaced = self.inner[p].children.replace(leaf.into(), NodeId::Inner(node));
                debug_assert!(replaced, "leaf is not a child of its parent");
            }
            None => self.root = NodeId::Inner(node),
        }
        let retired = &mut self.leaves[leaf.0];
        retired.retired = true;
        retired.short.clear();
        let longs = std::mem::take(&mut retired.long);
        debug!(
            "split {leaf} with {} into {}",
            discriminator.show(),
            created.iter().map(|l| l.to_string()).collect::<Vec<_>>().join(", ")
        );

        for u in longs {
            self.sift_from(NodeId::Inner(node), u)?;
        }
        Ok(Split {
            node: NodeId::Inner(node),
            leaves: created,
        })
    }

    /// Tries to separate the short prefixes of `leaf`. First the short prefixes are compared on
    /// the immediate discriminators of the semantics, a disagreement there is resolved by
    /// splitting on that discriminator. Otherwise the representative is compared with every
    /// other short prefix: if their successors on some symbol lie in different leaves, the leaf
    /// is split using the symbol whose leaves have the shortest separating discriminator, ties
    /// go to the symbol that comes first in the alphabet.
    ///
    /// Returns whether a split was made.
    pub fn refine_if_possible(&mut self, leaf: LeafId) -> Result<bool> {
        let shorts = self.leaves[leaf.0].short.clone();
        let Some((&representative, others)) = shorts.split_first() else {
            return Ok(false);
        };
        if others.is_empty() {
            return Ok(false);
        }

        for discriminator in M::immediate_discriminators(&self.alphabet) {
            let word = self.word(representative).clone();
            let reference = self.query(&word, &discriminator)?;
            for &other in others {
                let word = self.word(other).clone();
                let answer = self.query(&word, &discriminator)?;
                if answer != reference {
                    debug!(
                        "{} and {} disagree on {}",
                        self.word(representative).show(),
                        self.word(other).show(),
                        discriminator.show()
                    );
                    self.split_on(leaf, discriminator)?;
                    return Ok(true);
                }
            }
        }

        let symbols = self.alphabet.universe().collect::<Vec<_>>();
        for &other in others {
            let mut best: Option<(usize, A::Symbol)> = None;
            for &symbol in &symbols {
                let left = self.successor_leaf(representative, symbol)?;
                let right = self.successor_leaf(other, symbol)?;
                if left == right {
                    continue;
                }
                let length = self
                    .discriminator(self.lowest_common_ancestor(left.into(), right.into()))
                    .map_or(0, |d| d.len());
                if best.map_or(true, |(shortest, _)| length < shortest) {
                    best = Some((length, symbol));
                }
            }
            if let Some((_, symbol)) = best {
                self.split(representative, other, symbol)?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Makes at most one refinement, scanning the leaves in their deterministic order. Returns
    /// whether the tree changed.
    pub fn make_consistent(&mut self) -> Result<bool> {
        for leaf in self.leaves().collect::<Vec<_>>() {
            if self.refine_if_possible(leaf)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Promotes the long prefix `prefix` to a short prefix of its leaf. Its local output is
    /// recorded and all of its one-symbol extensions are sifted.
    pub fn make_short_prefix(&mut self, prefix: PrefixId) -> Result<()> {
        let leaf = self.leaf_of(prefix)?;
        if !self.leaves[leaf.0].long.shift_remove(&prefix) {
            return Err(LearningError::NotLong(self.word(prefix).show()));
        }
        self.leaves[leaf.0].short.push(prefix);
        self.prefixes.mark_short(prefix);
        trace!("{} is now short in {leaf}", self.word(prefix).show());

        if M::STATE_OUTPUTS {
            self.record_local_output(prefix)?;
        }
        for symbol in self.alphabet.universe().collect::<Vec<_>>() {
            self.extend(prefix, symbol)?;
        }
        Ok(())
    }

    /// Promotes a long prefix in every leaf without short prefixes until there is none left.
    /// Returns the number of promotions.
    pub fn close(&mut self) -> Result<usize> {
        let mut promoted = 0;
        loop {
            let pending = self.leaves().find_map(|leaf| {
                let data = &self.leaves[leaf.0];
                data.short
                    .is_empty()
                    .then(|| data.long.first().copied())
                    .flatten()
            });
            let Some(prefix) = pending else {
                return Ok(promoted);
            };
            self.make_short_prefix(prefix)?;
            promoted += 1;
        }
    }

    /// The leaf of `prefix · symbol`.
    pub fn successor_leaf(&self, prefix: PrefixId, symbol: A::Symbol) -> Result<LeafId> {
        let successor = self.prefixes.successor(prefix, symbol).ok_or_else(|| {
            LearningError::UnknownPrefix(self.word(prefix).append(symbol).show())
        })?;
        self.leaf_of(successor)
    }

    /// Sifts `prefix · symbol` and records its local output for semantics with transition
    /// outputs.
    fn extend(&mut self, prefix: PrefixId, symbol: A::Symbol) -> Result<()> {
        let successor = self.prefixes.append(prefix, symbol);
        self.sift(successor)?;
        if M::TRANSITION_OUTPUTS {
            self.record_local_output(successor)?;
        }
        Ok(())
    }

    fn record_local_output(&mut self, prefix: PrefixId) -> Result<()> {
        if self.prefixes.output(prefix).is_some() {
            return Ok(());
        }
        if let Some((u, v)) = M::local_query(self.word(prefix)) {
            let output = self.query(&u, &v)?;
            self.prefixes.set_output(prefix, output);
        }
        Ok(())
    }
}

impl<A, M, Q> DiscriminationTree<A, M, Q>
where
    A: GrowingAlphabet,
    M: Semantics,
    Q: MembershipOracle<Symbol = A::Symbol, Output = M::Output>,
{
    /// Adds `symbol` to the alphabet and sifts the extension of every short prefix by it.
    pub fn add_alphabet_symbol(&mut self, symbol: A::Symbol) -> Result<()> {
        self.alphabet.add_symbol(symbol)?;
        debug!("growing alphabet by {}", symbol.show());
        for leaf in self.leaves().collect::<Vec<_>>() {
            for prefix in self.leaves[leaf.0].short.clone() {
                self.extend(prefix, symbol)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use sift_core::{prelude::*, word::Word};

    use crate::{
        active::{DFAOracle, FnOracle, MealyOracle, MembershipOracle},
        config::LearnerConfig,
        datastructure::{DiscriminationTree, NodeId, PrefixId},
        error::LearningError,
        semantics::{DfaSemantics, MealySemantics},
    };

    /// Accepts words where the number of 0s and the number of 1s are both even.
    fn even_even() -> DFA<SimpleAlphabet<char>> {
        TSBuilder::with_state_colors([true, false, false, false])
            .with_transitions([
                (0, '0', Void, 1),
                (0, '1', Void, 2),
                (1, '0', Void, 0),
                (1, '1', Void, 3),
                (2, '0', Void, 3),
                (2, '1', Void, 0),
                (3, '0', Void, 2),
                (3, '1', Void, 1),
            ])
            .into_dfa(0)
    }

    type DfaTree = DiscriminationTree<SimpleAlphabet<char>, DfaSemantics, DFAOracle<SimpleAlphabet<char>>>;

    fn started() -> DfaTree {
        let dfa = even_even();
        let alphabet = dfa.alphabet().clone();
        let mut tree =
            DiscriminationTree::new(alphabet, DFAOracle::new(dfa).unwrap(), &LearnerConfig::default());
        let (eps, _) = tree.sift_word(&[]).unwrap();
        tree.close().unwrap();
        assert!(tree.prefixes().is_short(eps));
        tree
    }

    fn promote<A, Q>(tree: &mut DiscriminationTree<A, DfaSemantics, Q>, word: &str) -> PrefixId
    where
        A: Alphabet<Symbol = char>,
        Q: MembershipOracle<Symbol = char, Output = bool>,
    {
        let prefix = tree.prefixes().lookup(&Word::from(word)).unwrap();
        tree.make_short_prefix(prefix).unwrap();
        prefix
    }

    fn stabilize(tree: &mut DfaTree) {
        loop {
            tree.close().unwrap();
            if !tree.make_consistent().unwrap() {
                break;
            }
        }
    }

    #[test_log::test]
    fn output_disagreement_splits_on_empty_word() {
        let mut tree = started();
        assert_eq!(tree.size(), 1);
        promote(&mut tree, "0");
        assert!(tree.make_consistent().unwrap());
        assert_eq!(tree.size(), 2);
        assert_eq!(tree.inner_count(), 1);
        assert_eq!(tree.discriminator(tree.root()), Some(&Word::empty()));
        assert!(!tree.make_consistent().unwrap());
    }

    #[test_log::test]
    fn structural_split_separates_successors() {
        let mut tree = started();
        promote(&mut tree, "0");
        stabilize(&mut tree);
        // 1 and 0 are both rejected, their 0-successors are not
        let one = promote(&mut tree, "1");
        let zero = tree.prefixes().lookup(&['0']).unwrap();
        assert_eq!(tree.leaf_of(one).unwrap(), tree.leaf_of(zero).unwrap());

        let leaf = tree.leaf_of(one).unwrap();
        let mut before = tree.leaf(leaf).short().to_vec();
        before.extend(tree.leaf(leaf).long());

        let split = tree.split(zero, one, '0').unwrap();
        assert_eq!(split.leaves.len(), 2);
        assert_ne!(tree.leaf_of(one).unwrap(), tree.leaf_of(zero).unwrap());
        assert!(tree.leaf(leaf).is_retired());
        assert_eq!(tree.discriminator(split.node), Some(&Word::from("0")));

        let mut after = tree
            .leaves_below(split.node)
            .flat_map(|l| {
                let data = tree.leaf(l);
                data.short().iter().copied().chain(data.long()).collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test_log::test]
    fn discriminators_extend_existing_ones() {
        let mut tree = started();
        promote(&mut tree, "0");
        stabilize(&mut tree);
        promote(&mut tree, "1");
        let splits_before = tree.inner_count();
        stabilize(&mut tree);
        assert!(tree.inner_count() > splits_before);

        for node in 0..tree.inner_count() {
            let discriminator = tree.discriminator(NodeId::Inner(node)).unwrap();
            if discriminator.len() <= 1 {
                continue;
            }
            let rest = discriminator.skip(1);
            assert!((0..node).any(|earlier| {
                tree.discriminator(NodeId::Inner(earlier)) == Some(&rest)
            }));
        }
    }

    /// A tree over `a` and `b` for the language `accepted`, with every word of `short` promoted.
    fn finite_language(
        accepted: &'static [&'static str],
        short: &[&str],
    ) -> DiscriminationTree<CharAlphabet, DfaSemantics, impl MembershipOracle<Symbol = char, Output = bool>> {
        let oracle = FnOracle::new(move |word: &[char]| {
            accepted.iter().any(|w| w.chars().eq(word.iter().copied()))
        });
        let mut tree = DiscriminationTree::new(
            CharAlphabet::of_size(2).unwrap(),
            oracle,
            &LearnerConfig::default(),
        );
        tree.sift_word(&[]).unwrap();
        tree.close().unwrap();
        for word in short {
            promote(&mut tree, word);
        }
        tree
    }

    #[test_log::test]
    fn refinement_prefers_the_shortest_discriminator() {
        let mut tree = finite_language(&["ab", "aabb"], &["a", "ab"]);
        let eps = tree.prefixes().root();
        let a = tree.prefixes().lookup(&['a']).unwrap();
        tree.split_on(tree.leaf_of(eps).unwrap(), Word::empty()).unwrap();
        promote(&mut tree, "aa");
        tree.split_on(tree.leaf_of(eps).unwrap(), Word::from("bb")).unwrap();

        let leaf = tree.leaf_of(eps).unwrap();
        assert_eq!(tree.leaf_of(a).unwrap(), leaf);
        assert_eq!(tree.shorts(leaf), &[eps, a]);

        // on a the successors are only told apart by bb, on b already by the root
        let on_a = tree.lowest_common_ancestor(
            tree.successor_leaf(eps, 'a').unwrap().into(),
            tree.successor_leaf(a, 'a').unwrap().into(),
        );
        assert_eq!(tree.discriminator(on_a), Some(&Word::from("bb")));
        let on_b = tree.lowest_common_ancestor(
            tree.successor_leaf(eps, 'b').unwrap().into(),
            tree.successor_leaf(a, 'b').unwrap().into(),
        );
        let expected = tree.discriminator(on_b).unwrap().prepend('b');
        assert_eq!(expected, Word::from("b"));

        assert!(tree.refine_if_possible(leaf).unwrap());
        let node = NodeId::Inner(tree.inner_count() - 1);
        assert_eq!(tree.discriminator(node), Some(&expected));
        assert_ne!(tree.leaf_of(eps).unwrap(), tree.leaf_of(a).unwrap());
        assert!(tree.leaf(leaf).is_retired());
    }

    #[test_log::test]
    fn equally_short_discriminators_follow_alphabet_order() {
        let mut tree = finite_language(&["a", "bb"], &["a"]);
        let eps = tree.prefixes().root();
        tree.split_on(tree.leaf_of(eps).unwrap(), Word::empty()).unwrap();
        let b = promote(&mut tree, "b");

        let leaf = tree.leaf_of(eps).unwrap();
        assert_eq!(tree.shorts(leaf), &[eps, b]);
        for symbol in ['a', 'b'] {
            let lca = tree.lowest_common_ancestor(
                tree.successor_leaf(eps, symbol).unwrap().into(),
                tree.successor_leaf(b, symbol).unwrap().into(),
            );
            assert_eq!(lca, tree.root());
        }

        assert!(tree.refine_if_possible(leaf).unwrap());
        let node = NodeId::Inner(tree.inner_count() - 1);
        assert_eq!(tree.discriminator(node), Some(&Word::from("a")));
    }

    #[test_log::test]
    fn splitting_requires_separated_successors() {
        let mut tree = started();
        promote(&mut tree, "0");
        stabilize(&mut tree);
        let eps = tree.prefixes().root();
        let zero = tree.prefixes().lookup(&['0']).unwrap();
        assert!(matches!(
            tree.split(eps, zero, '0'),
            Err(LearningError::UnsplittableLeaf { .. })
        ));
        let leaf = tree.leaf_of(eps).unwrap();
        assert!(matches!(
            tree.split_on(leaf, Word::from("1")),
            Err(LearningError::UnsplittableLeaf { .. })
        ));
        assert!(matches!(
            tree.make_short_prefix(eps),
            Err(LearningError::NotLong(_))
        ));
    }

    #[test_log::test]
    fn alphabet_growth_sifts_new_extensions() {
        let dfa = even_even();
        let mut tree = DiscriminationTree::<_, DfaSemantics, _>::new(
            SimpleAlphabet::new(vec!['0']).unwrap(),
            DFAOracle::new(dfa).unwrap(),
            &LearnerConfig::default(),
        );
        tree.sift_word(&[]).unwrap();
        tree.close().unwrap();
        promote(&mut tree, "0");
        stabilize(&mut tree);
        assert_eq!(tree.size(), 2);

        tree.add_alphabet_symbol('1').unwrap();
        let eps = tree.prefixes().root();
        assert!(tree.successor_leaf(eps, '1').is_ok());
        assert!(matches!(
            tree.add_alphabet_symbol('1'),
            Err(LearningError::Alphabet(_))
        ));
    }

    #[test_log::test]
    fn mealy_outputs_split_without_descent() {
        let target: MealyMachine<SimpleAlphabet<char>, u8> = TSBuilder::without_state_colors()
            .with_transitions([(0, 'a', 0, 1), (1, 'a', 1, 0)])
            .into_mealy(0);
        let alphabet = target.alphabet().clone();
        let mut tree = DiscriminationTree::<_, MealySemantics<u8>, _>::new(
            alphabet,
            MealyOracle::new(target).unwrap(),
            &LearnerConfig::default(),
        );
        let (eps, root) = tree.sift_word(&[]).unwrap();
        tree.close().unwrap();
        let a = tree.prefixes().lookup(&['a']).unwrap();
        tree.make_short_prefix(a).unwrap();
        assert_eq!(tree.leaf_of(a).unwrap(), root);
        // all successors sit in the only leaf, only the outputs tell them apart
        assert_eq!(tree.successor_leaf(eps, 'a').unwrap(), root);
        assert_eq!(tree.successor_leaf(a, 'a').unwrap(), root);
        assert_eq!(tree.root(), NodeId::Leaf(root.index()));

        assert!(tree.refine_if_possible(root).unwrap());
        assert_eq!(tree.discriminator(tree.root()), Some(&Word::from("a")));
        assert_eq!(tree.size(), 2);
        assert_ne!(tree.leaf_of(eps).unwrap(), tree.leaf_of(a).unwrap());
    }

    /// Answers depend on where the word is split, not only on the word.
    struct SplitSensitive;

    impl MembershipOracle for SplitSensitive {
        type Symbol = char;
        type Output = bool;

        fn answer(&self, prefix: &[char], _suffix: &[char]) -> bool {
            prefix.len() % 2 == 0
        }
    }

    /// Flips its answer on every query.
    struct Flaky(AtomicBool);

    impl MembershipOracle for Flaky {
        type Symbol = char;
        type Output = bool;

        fn answer(&self, _prefix: &[char], _suffix: &[char]) -> bool {
            self.0.fetch_xor(true, Ordering::Relaxed)
        }
    }

    #[test_log::test]
    fn inconsistent_oracle_is_detected() {
        let mut tree = DiscriminationTree::<_, DfaSemantics, _>::new(
            CharAlphabet::of_size(1).unwrap(),
            SplitSensitive,
            &LearnerConfig::default(),
        );
        assert!(tree.query(&[], &['a']).unwrap());
        // answered from the cache, the oracle would say otherwise
        assert!(tree.query(&['a'], &[]).unwrap());
        assert_eq!(tree.cache().hits(), 1);
        assert_eq!(tree.cache().len(), 1);
        assert!(matches!(
            tree.query_batch(&[
                (Word::from("aa"), Word::empty()),
                (Word::from("a"), Word::from("a"))
            ]),
            Err(LearningError::OracleInconsistency { .. })
        ));
    }

    #[test_log::test]
    fn verification_detects_changed_answers() {
        let config = LearnerConfig::default().verify_cached_answers(true);
        let mut tree = DiscriminationTree::<_, DfaSemantics, _>::new(
            CharAlphabet::of_size(1).unwrap(),
            Flaky(AtomicBool::new(false)),
            &config,
        );
        assert!(!tree.query(&['a'], &[]).unwrap());
        assert!(matches!(
            tree.query(&['a'], &[]),
            Err(LearningError::OracleInconsistency { .. })
        ));

        let mut unverified = DiscriminationTree::<_, DfaSemantics, _>::new(
            CharAlphabet::of_size(1).unwrap(),
            Flaky(AtomicBool::new(false)),
            &LearnerConfig::default(),
        );
        assert!(!unverified.query(&['a'], &[]).unwrap());
        assert!(!unverified.query(&['a'], &[]).unwrap());
    }
}
