use sift_core::{math, prelude::*, word::Word};

use super::LeafId;

/// Handle of a node in a [`PrefixTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrefixId(usize);

impl std::fmt::Display for PrefixId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "p{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct PrefixNode<S: Show, O> {
    word: Word<S>,
    parent: Option<PrefixId>,
    successors: math::Map<S, PrefixId>,
    leaf: Option<LeafId>,
    short: bool,
    output: Option<O>,
}

/// The store of all prefixes the learner has ever classified. It is a trie, so every prefix
/// of a stored word is stored as well, and each word has exactly one node.
///
/// Besides the word itself, a node remembers the leaf of the discrimination tree it was
/// classified into, whether it is a short prefix, and its local output, i.e. the answer to
/// the query that defines its output in the hypothesis.
#[derive(Debug, Clone)]
pub struct PrefixTree<S: Show, O> {
    nodes: Vec<PrefixNode<S, O>>,
}

impl<S: Symbol, O: Clone> Default for PrefixTree<S, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Symbol, O: Clone> PrefixTree<S, O> {
    /// Creates a tree that only contains the empty word.
    pub fn new() -> Self {
        Self {
            nodes: vec![PrefixNode {
                word: Word::empty(),
                parent: None,
                successors: math::Map::default(),
                leaf: None,
                short: false,
                output: None,
            }],
        }
    }

    /// The node of the empty word.
    pub fn root(&self) -> PrefixId {
        PrefixId(0)
    }

    /// Number of stored prefixes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false, the empty word is stored from the beginning.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn word(&self, id: PrefixId) -> &Word<S> {
        &self.nodes[id.0].word
    }

    pub fn parent(&self, id: PrefixId) -> Option<PrefixId> {
        self.nodes[id.0].parent
    }

    /// Returns the node of `id · symbol` if it exists.
    pub fn successor(&self, id: PrefixId, symbol: S) -> Option<PrefixId> {
        self.nodes[id.0].successors.get(&symbol).copied()
    }

    /// Returns the node of `id · symbol`, creating it if needed.
    pub fn append(&mut self, id: PrefixId, symbol: S) -> PrefixId {
        if let Some(existing) = self.successor(id, symbol) {
            return existing;
        }
        let created = PrefixId(self.nodes.len());
        let word = self.nodes[id.0].word.append(symbol);
        self.nodes.push(PrefixNode {
            word,
            parent: Some(id),
            successors: math::Map::default(),
            leaf: None,
            short: false,
            output: None,
        });
        self.nodes[id.0].successors.insert(symbol, created);
        created
    }

    /// Finds the node of the given word.
    pub fn lookup(&self, word: &[S]) -> Option<PrefixId> {
        word.iter()
            .try_fold(self.root(), |id, sym| self.successor(id, *sym))
    }

    /// Returns the leaf `id` is currently classified into.
    pub fn leaf(&self, id: PrefixId) -> Option<LeafId> {
        self.nodes[id.0].leaf
    }

    pub(crate) fn set_leaf(&mut self, id: PrefixId, leaf: LeafId) {
        self.nodes[id.0].leaf = Some(leaf);
    }

    /// Whether `id` is a short prefix, i.e. the representative of a state.
    pub fn is_short(&self, id: PrefixId) -> bool {
        self.nodes[id.0].short
    }

    pub(crate) fn mark_short(&mut self, id: PrefixId) {
        self.nodes[id.0].short = true;
    }

    /// The recorded local output of `id`.
    pub fn output(&self, id: PrefixId) -> Option<&O> {
        self.nodes[id.0].output.as_ref()
    }

    pub(crate) fn set_output(&mut self, id: PrefixId, output: O) {
        self.nodes[id.0].output = Some(output);
    }
}

#[cfg(test)]
mod tests {
    use sift_core::word::Word;

    use super::PrefixTree;

    #[test]
    fn prefixes_are_shared() {
        let mut tree: PrefixTree<char, bool> = PrefixTree::new();
        let a = tree.append(tree.root(), 'a');
        let ab = tree.append(a, 'b');
        assert_eq!(tree.append(tree.root(), 'a'), a);
        assert_eq!(tree.word(ab), &Word::from("ab"));
        assert_eq!(tree.parent(ab), Some(a));
        assert_eq!(tree.lookup(&['a', 'b']), Some(ab));
        assert_eq!(tree.lookup(&['b']), None);
        assert_eq!(tree.len(), 3);

        assert!(!tree.is_short(a));
        tree.mark_short(a);
        assert!(tree.is_short(a));
        tree.set_output(a, true);
        assert_eq!(tree.output(a), Some(&true));
        assert_eq!(tree.output(ab), None);
    }
}
