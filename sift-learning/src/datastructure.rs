//! Data structures the learner is built from: the discrimination tree itself, the children of
//! its inner nodes, the store of classified prefixes and the cache of oracle answers.

mod children;
pub use children::{BinaryChildren, Children, MapChildren};

mod discrimination_tree;
pub(crate) use discrimination_tree::InnerNode;
pub use discrimination_tree::{DiscriminationTree, Leaf, LeafId, Leaves, NodeId};

mod prefix_tree;
pub use prefix_tree::{PrefixId, PrefixTree};

mod query_cache;
pub use query_cache::QueryCache;

mod refinement;
pub use refinement::Split;
