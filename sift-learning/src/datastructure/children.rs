use std::fmt::Debug;

use sift_core::math;

use super::NodeId;

/// The outgoing edges of an inner node of a discrimination tree, keyed by the answer of the
/// oracle to the node's discriminator. Implementations enumerate their children in a fixed
/// order, which makes every traversal of the tree deterministic.
pub trait Children<O>: Default + Clone + Debug {
    /// Iterator over the children together with the output they are labeled with.
    type Iter<'a>: Iterator<Item = (&'a O, NodeId)>
    where
        Self: 'a,
        O: 'a;

    /// Returns the child for the given output, if it exists.
    fn child(&self, output: &O) -> Option<NodeId>;

    /// Returns the output under which `child` is attached.
    fn output_of(&self, child: NodeId) -> Option<&O>;

    /// Attaches `child` under `output`. Returns false and leaves `self` unchanged if there is
    /// already a child for `output`.
    fn insert(&mut self, output: O, child: NodeId) -> bool;

    /// Replaces the child `old` with `new`, keeping the output and position. Returns false if
    /// `old` is not a child.
    fn replace(&mut self, old: NodeId, new: NodeId) -> bool;

    /// Enumerates all children.
    fn iter(&self) -> Self::Iter<'_>;

    /// Returns the number of children.
    fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns true if there are no children.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Children for boolean outputs. The child for `true` is always enumerated first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinaryChildren {
    accepting: Option<NodeId>,
    rejecting: Option<NodeId>,
}

impl BinaryChildren {
    fn slot(&mut self, output: bool) -> &mut Option<NodeId> {
        if output {
            &mut self.accepting
        } else {
            &mut self.rejecting
        }
    }
}

impl Children<bool> for BinaryChildren {
    type Iter<'a> = std::iter::Flatten<std::array::IntoIter<Option<(&'a bool, NodeId)>, 2>>;

    fn child(&self, output: &bool) -> Option<NodeId> {
        if *output {
            self.accepting
        } else {
            self.rejecting
        }
    }

    fn output_of(&self, child: NodeId) -> Option<&bool> {
        if self.accepting == Some(child) {
            Some(&true)
        } else if self.rejecting == Some(child) {
            Some(&false)
        } else {
            None
        }
    }

    fn insert(&mut self, output: bool, child: NodeId) -> bool {
        let slot = self.slot(output);
        if slot.is_some() {
            return false;
        }
        *slot = Some(child);
        true
    }

    fn replace(&mut self, old: NodeId, new: NodeId) -> bool {
        match self.output_of(old).copied() {
            Some(output) => {
                *self.slot(output) = Some(new);
                true
            }
            None => false,
        }
    }

    fn iter(&self) -> Self::Iter<'_> {
        [
            self.accepting.map(|child| (&true, child)),
            self.rejecting.map(|child| (&false, child)),
        ]
        .into_iter()
        .flatten()
    }
}

/// Children for arbitrary outputs, enumerated in the order in which they were inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapChildren<O: std::hash::Hash + Eq>(math::Map<O, NodeId>);

impl<O: std::hash::Hash + Eq> Default for MapChildren<O> {
    fn default() -> Self {
        Self(math::Map::default())
    }
}

impl<O: std::hash::Hash + Eq + Clone + Debug> Children<O> for MapChildren<O> {
    type Iter<'a> = std::iter::Map<
        math::map::Iter<'a, O, NodeId>,
        fn((&'a O, &'a NodeId)) -> (&'a O, NodeId),
    > where Self: 'a, O: 'a;

    fn child(&self, output: &O) -> Option<NodeId> {
        self.0.get(output).copied()
    }

    fn output_of(&self, child: NodeId) -> Option<&O> {
        self.0
            .iter()
            .find_map(|(output, id)| (*id == child).then_some(output))
    }

    fn insert(&mut self, output: O, child: NodeId) -> bool {
        if self.0.contains_key(&output) {
            return false;
        }
        self.0.insert(output, child);
        true
    }

    fn replace(&mut self, old: NodeId, new: NodeId) -> bool {
        match self.0.values_mut().find(|id| **id == old) {
            Some(id) => {
                *id = new;
                true
            }
            None => false,
        }
    }

    fn iter(&self) -> Self::Iter<'_> {
        self.0.iter().map(copied_child as fn(_) -> _)
    }
}

fn copied_child<'a, O>((output, id): (&'a O, &'a NodeId)) -> (&'a O, NodeId) {
    (output, *id)
}

#[cfg(test)]
mod tests {
    use super::{BinaryChildren, Children, MapChildren};
    use crate::datastructure::NodeId;

    #[test]
    fn binary_children_enumerate_true_first() {
        let mut children = BinaryChildren::default();
        assert!(children.insert(false, NodeId::Leaf(1)));
        assert!(children.insert(true, NodeId::Leaf(2)));
        assert!(!children.insert(true, NodeId::Leaf(3)));
        assert_eq!(
            children.iter().collect::<Vec<_>>(),
            vec![(&true, NodeId::Leaf(2)), (&false, NodeId::Leaf(1))]
        );
        assert!(children.replace(NodeId::Leaf(1), NodeId::Inner(0)));
        assert_eq!(children.child(&false), Some(NodeId::Inner(0)));
        assert_eq!(children.output_of(NodeId::Leaf(2)), Some(&true));
        assert_eq!(children.output_of(NodeId::Leaf(1)), None);
    }

    #[test]
    fn map_children_keep_insertion_order() {
        let mut children = MapChildren::default();
        assert!(children.insert("x", NodeId::Leaf(0)));
        assert!(children.insert("a", NodeId::Leaf(1)));
        assert!(!children.insert("x", NodeId::Leaf(2)));
        assert_eq!(children.len(), 2);
        assert_eq!(
            children.iter().map(|(o, _)| *o).collect::<Vec<_>>(),
            vec!["x", "a"]
        );
        assert!(children.replace(NodeId::Leaf(1), NodeId::Inner(3)));
        assert_eq!(children.output_of(NodeId::Inner(3)), Some(&"a"));
        assert!(!children.replace(NodeId::Leaf(1), NodeId::Inner(4)));
    }
}
