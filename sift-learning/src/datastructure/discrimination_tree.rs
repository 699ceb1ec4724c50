use std::{fmt::Debug, marker::PhantomData};

use itertools::Itertools;
use sift_core::{math, prelude::*, word::Word};
use tracing::{debug, trace};

use super::{Children, PrefixId, PrefixTree, QueryCache};
use crate::{
    active::{MembershipOracle, Query},
    config::LearnerConfig,
    error::{LearningError, Result},
    semantics::Semantics,
};

/// Addresses a node of a [`DiscriminationTree`], inner nodes and leaves live in separate arenas.
#[derive(Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    Inner(usize),
    Leaf(usize),
}

impl NodeId {
    pub fn try_inner(&self) -> Option<usize> {
        let Self::Inner(n) = self else {
            return None;
        };
        Some(*n)
    }
    pub fn try_leaf(&self) -> Option<LeafId> {
        let Self::Leaf(n) = self else {
            return None;
        };
        Some(LeafId(*n))
    }
}

impl Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (a, b) = match self {
            NodeId::Inner(n) => ("N", n),
            NodeId::Leaf(n) => ("L", n),
        };
        write!(f, "{a}({b})")
    }
}

/// Handle of a leaf. Live leaves are the states of the hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeafId(pub(crate) usize);

impl LeafId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for LeafId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl From<LeafId> for NodeId {
    fn from(value: LeafId) -> Self {
        NodeId::Leaf(value.0)
    }
}

/// An inner node, labeled with a discriminator. Its children are keyed by the answers to
/// queries `(u, discriminator)`.
#[derive(Debug, Clone)]
pub(crate) struct InnerNode<S: Show, C> {
    pub(crate) parent: Option<usize>,
    pub(crate) discriminator: Word<S>,
    pub(crate) children: C,
}

/// A leaf holds the prefixes that are classified into it. Short prefixes represent the state
/// the leaf stands for, the first of them is the canonical representative. Long prefixes are
/// successors of short prefixes that have been sifted here.
///
/// Once split, a leaf is retired and only kept so that handles to it stay valid.
#[derive(Debug, Clone, Default)]
pub struct Leaf {
    pub(crate) parent: Option<usize>,
    pub(crate) short: Vec<PrefixId>,
    pub(crate) long: math::Set<PrefixId>,
    pub(crate) retired: bool,
}

impl Leaf {
    pub fn short(&self) -> &[PrefixId] {
        &self.short
    }
    pub fn long(&self) -> impl Iterator<Item = PrefixId> + '_ {
        self.long.iter().copied()
    }
    pub fn is_retired(&self) -> bool {
        self.retired
    }
}

/// The discrimination tree at the heart of the learner. It owns everything the learner knows:
/// the alphabet, the membership oracle together with a cache of its answers, and the store of
/// classified prefixes.
///
/// Nodes live in two arenas, one for inner nodes and one for leaves, and refer to their parent
/// by index. The root starts out as a single leaf.
pub struct DiscriminationTree<A: Alphabet, M: Semantics, Q> {
    pub(crate) alphabet: A,
    pub(crate) oracle: Q,
    pub(crate) cache: QueryCache<A::Symbol, M::Output>,
    pub(crate) verify_cached: bool,
    pub(crate) prefixes: PrefixTree<A::Symbol, M::Output>,
    pub(crate) inner: Vec<InnerNode<A::Symbol, M::Children>>,
    pub(crate) leaves: Vec<Leaf>,
    pub(crate) root: NodeId,
    _semantics: PhantomData<M>,
}

impl<A, M, Q> DiscriminationTree<A, M, Q>
where
    A: Alphabet,
    M: Semantics,
    Q: MembershipOracle<Symbol = A::Symbol, Output = M::Output>,
{
    /// Creates a tree consisting of a single empty leaf.
    pub fn new(alphabet: A, oracle: Q, config: &LearnerConfig) -> Self {
        Self {
            alphabet,
            oracle,
            cache: QueryCache::new(config.cache_queries),
            verify_cached: config.verify_cached,
            prefixes: PrefixTree::new(),
            inner: vec![],
            leaves: vec![Leaf::default()],
            root: NodeId::Leaf(0),
            _semantics: PhantomData,
        }
    }

    pub fn alphabet(&self) -> &A {
        &self.alphabet
    }

    pub fn oracle(&self) -> &Q {
        &self.oracle
    }

    pub fn prefixes(&self) -> &PrefixTree<A::Symbol, M::Output> {
        &self.prefixes
    }

    pub fn cache(&self) -> &QueryCache<A::Symbol, M::Output> {
        &self.cache
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live leaves, which is the number of states of the hypothesis.
    pub fn size(&self) -> usize {
        self.leaves().count()
    }

    /// Number of inner nodes, every successful split creates exactly one.
    pub fn inner_count(&self) -> usize {
        self.inner.len()
    }

    pub fn leaf(&self, leaf: LeafId) -> &Leaf {
        &self.leaves[leaf.0]
    }

    /// The short prefixes of `leaf`, the first one is its representative.
    pub fn shorts(&self, leaf: LeafId) -> &[PrefixId] {
        &self.leaves[leaf.0].short
    }

    /// The long prefixes of `leaf`, in the order they were sifted there.
    pub fn longs(&self, leaf: LeafId) -> impl Iterator<Item = PrefixId> + '_ {
        self.leaves[leaf.0].long()
    }

    /// Returns the discriminator of `node`, or `None` for leaves.
    pub fn discriminator(&self, node: NodeId) -> Option<&Word<A::Symbol>> {
        Some(&self.inner[node.try_inner()?].discriminator)
    }

    pub fn word(&self, prefix: PrefixId) -> &Word<A::Symbol> {
        self.prefixes.word(prefix)
    }

    /// Returns the leaf `prefix` is classified into.
    pub fn leaf_of(&self, prefix: PrefixId) -> Result<LeafId> {
        self.prefixes
            .leaf(prefix)
            .ok_or_else(|| LearningError::UnknownPrefix(self.word(prefix).show()))
    }

    /// Iterates over all live leaves in a deterministic order: depth first, children in the
    /// order their container enumerates them.
    pub fn leaves(&self) -> Leaves<'_, A, M, Q> {
        self.leaves_below(self.root)
    }

    /// Iterates over the live leaves in the subtree of `node`.
    pub fn leaves_below(&self, node: NodeId) -> Leaves<'_, A, M, Q> {
        Leaves {
            tree: self,
            stack: vec![node],
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<usize> {
        match node {
            NodeId::Inner(n) => self.inner[n].parent,
            NodeId::Leaf(n) => self.leaves[n].parent,
        }
    }

    /// The nodes on the path from the root down to `node`, both included.
    pub fn path_to(&self, node: NodeId) -> Vec<NodeId> {
        let mut path = vec![node];
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            current = NodeId::Inner(parent);
            path.push(current);
        }
        path.reverse();
        path
    }

    /// Number of edges between the root and `node`.
    pub fn depth(&self, node: NodeId) -> usize {
        self.path_to(node).len() - 1
    }

    /// Walks the root paths of both nodes in parallel and returns the last node on which they
    /// agree.
    pub fn lowest_common_ancestor(&self, a: NodeId, b: NodeId) -> NodeId {
        let left = self.path_to(a);
        let right = self.path_to(b);
        left.into_iter()
            .zip(right)
            .take_while(|(l, r)| l == r)
            .last()
            .map(|(node, _)| node)
            .unwrap_or(self.root)
    }

    /// Returns the output under which the subtree containing `leaf` hangs off the root, provided
    /// the root is an inner node labeled with the empty word.
    pub fn root_label(&self, leaf: LeafId) -> Option<&M::Output> {
        let root = self.root.try_inner()?;
        if !self.inner[root].discriminator.is_empty() {
            return None;
        }
        let path = self.path_to(leaf.into());
        self.inner[root].children.output_of(*path.get(1)?)
    }

    /// Asks the membership query `(prefix, suffix)` and returns the part of the answer that
    /// concerns `suffix`. Answers are taken from the cache if possible.
    pub fn query(&mut self, prefix: &[A::Symbol], suffix: &[A::Symbol]) -> Result<M::Output> {
        if let Some(cached) = self.cache.lookup::<M>(prefix, suffix) {
            if self.verify_cached {
                self.ask(prefix, suffix)?;
            }
            return Ok(cached);
        }
        self.ask(prefix, suffix)
    }

    /// Answers all given queries, dispatching the ones that miss the cache to the oracle as a
    /// single batch. The answers are returned in the order of `queries`.
    pub fn query_batch(
        &mut self,
        queries: &[(Word<A::Symbol>, Word<A::Symbol>)],
    ) -> Result<Vec<M::Output>> {
        let mut answers = Vec::with_capacity(queries.len());
        let mut pending = vec![];
        let mut positions = vec![];
        for (i, (prefix, suffix)) in queries.iter().enumerate() {
            let cached = if self.verify_cached {
                None
            } else {
                self.cache.lookup::<M>(prefix, suffix)
            };
            if cached.is_none() {
                positions.push(i);
                pending.push(Query::new(prefix.clone(), suffix.clone()));
            }
            answers.push(cached);
        }

        if !pending.is_empty() {
            trace!("dispatching {} queries to the oracle", pending.len());
            self.oracle.answer_batch(&mut pending);
            for (position, query) in positions.into_iter().zip(pending) {
                let Some(answer) = query.output else {
                    return Err(LearningError::MalformedAnswer {
                        prefix: query.prefix.show(),
                        suffix: query.suffix.show(),
                        answer: "⊥".to_string(),
                    });
                };
                let output = self.accept(&query.prefix, &query.suffix, answer)?;
                answers[position] = Some(output);
            }
        }
        Ok(answers.into_iter().flatten().collect())
    }

    fn ask(&mut self, prefix: &[A::Symbol], suffix: &[A::Symbol]) -> Result<M::Output> {
        let answer = self.oracle.answer(prefix, suffix);
        self.accept(prefix, suffix, answer)
    }

    fn accept(
        &mut self,
        prefix: &[A::Symbol],
        suffix: &[A::Symbol],
        answer: M::Output,
    ) -> Result<M::Output> {
        let output = M::relevant(&answer, suffix.len()).ok_or_else(|| {
            LearningError::MalformedAnswer {
                prefix: prefix.show(),
                suffix: suffix.show(),
                answer: answer.show(),
            }
        })?;
        self.cache.record(prefix, suffix, output.clone())?;
        Ok(output)
    }

    /// Sifts `prefix` from the root, see [`Self::sift_from`].
    pub fn sift(&mut self, prefix: PrefixId) -> Result<LeafId> {
        self.sift_from(self.root, prefix)
    }

    /// Creates the prefix for `word` if needed and sifts it from the root.
    pub fn sift_word(&mut self, word: &[A::Symbol]) -> Result<(PrefixId, LeafId)> {
        let prefix = word
            .iter()
            .fold(self.prefixes.root(), |id, sym| self.prefixes.append(id, *sym));
        let leaf = self.sift(prefix)?;
        Ok((prefix, leaf))
    }

    /// Descends from `start` by asking, at every inner node, the query for `prefix` and its
    /// discriminator and following the child for the answer. If there is no such child, a new
    /// leaf is attached for it. The prefix is then recorded as a long prefix of the leaf that
    /// was reached.
    ///
    /// Short prefixes keep their leaf, sifting them is a no-op.
    pub fn sift_from(&mut self, start: NodeId, prefix: PrefixId) -> Result<LeafId> {
        if self.prefixes.is_short(prefix) {
            return self.leaf_of(prefix);
        }
        let word = self.prefixes.word(prefix).clone();
        let mut current = start;
        let leaf = loop {
            match current {
                NodeId::Leaf(leaf) => break leaf,
                NodeId::Inner(node) => {
                    let discriminator = self.inner[node].discriminator.clone();
                    let output = self.query(&word, &discriminator)?;
                    current = match self.inner[node].children.child(&output) {
                        Some(child) => child,
                        None => {
                            let created = self.new_leaf(Some(node));
                            debug!(
                                "sifting {} discovered {} for answer {} to {}",
                                word.show(),
                                LeafId(created),
                                output.show(),
                                discriminator.show()
                            );
                            let inserted = self.inner[node]
                                .children
                                .insert(output, NodeId::Leaf(created));
                            debug_assert!(inserted, "child for new answer already present");
                            NodeId::Leaf(created)
                        }
                    };
                }
            }
        };

        if self.leaves[leaf].retired {
            return Err(LearningError::RetiredLeaf(LeafId(leaf)));
        }
        if let Some(previous) = self.prefixes.leaf(prefix) {
            if previous.0 != leaf {
                self.leaves[previous.0].long.shift_remove(&prefix);
            }
        }
        self.leaves[leaf].long.insert(prefix);
        self.prefixes.set_leaf(prefix, LeafId(leaf));
        trace!("sifted {} into {}", word.show(), LeafId(leaf));
        Ok(LeafId(leaf))
    }

    pub(crate) fn new_leaf(&mut self, parent: Option<usize>) -> usize {
        self.leaves.push(Leaf {
            parent,
            ..Default::default()
        });
        self.leaves.len() - 1
    }
}

/// Iterator over the live leaves of a subtree, see [`DiscriminationTree::leaves`].
pub struct Leaves<'a, A: Alphabet, M: Semantics, Q> {
    tree: &'a DiscriminationTree<A, M, Q>,
    stack: Vec<NodeId>,
}

impl<'a, A: Alphabet, M: Semantics, Q> Iterator for Leaves<'a, A, M, Q> {
    type Item = LeafId;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            if let Some(leaf) = node.try_leaf() {
                return Some(leaf);
            }
            if let Some(n) = node.try_inner() {
                let children = self.tree.inner[n]
                    .children
                    .iter()
                    .map(|(_, child)| child)
                    .collect_vec();
                self.stack.extend(children.into_iter().rev());
            }
        }
        None
    }
}

impl<A, M, Q> Debug for DiscriminationTree<A, M, Q>
where
    A: Alphabet,
    M: Semantics,
    Q: MembershipOracle<Symbol = A::Symbol, Output = M::Output>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(["Leaf", "Path", "Short", "Long"].map(String::from));
        for leaf in self.leaves() {
            let path = self
                .path_to(leaf.into())
                .iter()
                .tuple_windows()
                .filter_map(|(parent, child)| {
                    let node = &self.inner[parent.try_inner()?];
                    Some(format!(
                        "{}:{}",
                        node.discriminator.show(),
                        node.children.output_of(*child)?.show()
                    ))
                })
                .join(" ");
            let data = &self.leaves[leaf.0];
            builder.push_record([
                leaf.to_string(),
                path,
                data.short.iter().map(|p| self.word(*p).show()).join(", "),
                data.long.iter().map(|p| self.word(*p).show()).join(", "),
            ]);
        }
        write!(f, "{}", builder.build())
    }
}

#[cfg(test)]
mod tests {
    use sift_core::{prelude::*, word::Word};

    use super::{DiscriminationTree, NodeId};
    use crate::{
        active::{CountingOracle, DFAOracle},
        config::LearnerConfig,
        semantics::DfaSemantics,
    };

    fn parity_dfa() -> DFA<CharAlphabet> {
        TSBuilder::with_state_colors([true, false])
            .with_transitions([
                (0, 'a', Void, 1),
                (0, 'b', Void, 0),
                (1, 'a', Void, 0),
                (1, 'b', Void, 1),
            ])
            .into_dfa(0)
    }

    type Tree = DiscriminationTree<CharAlphabet, DfaSemantics, CountingOracle<DFAOracle<CharAlphabet>>>;

    fn tree() -> Tree {
        let dfa = parity_dfa();
        let alphabet = dfa.alphabet().clone();
        let oracle = CountingOracle::new(DFAOracle::new(dfa).unwrap());
        DiscriminationTree::new(alphabet, oracle, &LearnerConfig::default())
    }

    #[test_log::test]
    fn sifting_into_single_leaf() {
        let mut tree = tree();
        let (eps, leaf) = tree.sift_word(&[]).unwrap();
        assert_eq!(tree.root(), NodeId::Leaf(0));
        assert_eq!(tree.leaf(leaf).long().collect::<Vec<_>>(), vec![eps]);
        assert_eq!(tree.size(), 1);
        assert_eq!(tree.oracle().queries(), 0);
    }

    #[test_log::test]
    fn sifting_is_idempotent() {
        let mut tree = tree();
        let (eps, _) = tree.sift_word(&[]).unwrap();
        tree.make_short_prefix(eps).unwrap();
        tree.make_consistent().unwrap();
        let (a, _) = tree.sift_word(&['a']).unwrap();
        tree.make_short_prefix(a).unwrap();
        assert!(tree.make_consistent().unwrap());

        let (word, first) = tree.sift_word(&['a', 'b', 'a']).unwrap();
        let asked = tree.oracle().queries();
        let second = tree.sift(word).unwrap();
        assert_eq!(first, second);
        assert_eq!(tree.oracle().queries(), asked);
        assert_eq!(tree.leaf(first).long().filter(|p| *p == word).count(), 1);
    }

    #[test_log::test]
    fn lowest_common_ancestor_and_paths() {
        let mut tree = tree();
        let (eps, _) = tree.sift_word(&[]).unwrap();
        tree.make_short_prefix(eps).unwrap();
        let (a, _) = tree.sift_word(&['a']).unwrap();
        tree.make_short_prefix(a).unwrap();
        assert!(tree.make_consistent().unwrap());

        let leaves = tree.leaves().collect::<Vec<_>>();
        assert_eq!(leaves.len(), 2);
        assert_eq!(
            tree.lowest_common_ancestor(leaves[0].into(), leaves[1].into()),
            tree.root()
        );
        assert_eq!(
            tree.lowest_common_ancestor(leaves[0].into(), leaves[0].into()),
            NodeId::from(leaves[0])
        );
        assert_eq!(tree.discriminator(tree.root()), Some(&Word::empty()));
        assert_eq!(tree.path_to(leaves[1].into()).len(), 2);
        assert_eq!(tree.depth(leaves[1].into()), 1);
        assert_eq!(tree.depth(tree.root()), 0);
        assert!(tree
            .longs(leaves[0])
            .any(|p| tree.word(p) == &Word::from("aa")));
        assert_eq!(tree.root_label(leaves[0]), Some(&true));
        assert_eq!(tree.root_label(leaves[1]), Some(&false));
        assert!(format!("{tree:?}").contains("ε:+"));
    }

    #[test_log::test]
    fn batches_only_ask_missing_queries() {
        let mut tree = tree();
        assert!(tree.query(&['a'], &[]).is_ok());
        let answers = tree
            .query_batch(&[
                (Word::from("a"), Word::empty()),
                (Word::empty(), Word::from("a")),
                (Word::from("b"), Word::empty()),
            ])
            .unwrap();
        assert_eq!(answers, vec![false, false, true]);
        assert_eq!(tree.oracle().queries(), 2);
    }
}
