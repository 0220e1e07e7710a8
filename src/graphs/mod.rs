pub mod poa;
pub mod toposort;
pub mod merge;

#[cfg(test)]
pub(crate) mod mock;

use std::fmt::Debug;
use std::hash::Hash;

/// Dense node identifier, equal to the node's slot in the fixed-capacity arrays
pub type NodeId = u32;

pub trait NodeIndexType: Copy + Hash + PartialOrd + Ord + PartialEq + Eq + Debug {
    fn index(&self) -> usize;
}

impl NodeIndexType for NodeId {
    #[inline(always)]
    fn index(&self) -> usize {
        *self as usize
    }
}

/// The view of a graph needed to sort it and align reads against it.
///
/// Node indices are dense, i.e., `all_nodes()` yields exactly `node_count()` nodes
/// with `index()` values in `[0, node_count)`, in ascending order. Successors and
/// predecessors are yielded in edge insertion order, which the topological sorter
/// relies on for its tie-break.
pub trait AlignableGraph {
    type NodeIndex: NodeIndexType;
    type NodeIterator<'a>: Iterator<Item=Self::NodeIndex> + 'a
        where Self: 'a;
    type PredecessorIterator<'a>: Iterator<Item=Self::NodeIndex> + 'a
        where Self: 'a;
    type SuccessorIterator<'a>: Iterator<Item=Self::NodeIndex> + 'a
        where Self: 'a;

    fn all_nodes(&self) -> Self::NodeIterator<'_>;
    fn node_count(&self) -> usize;

    fn in_degree(&self, node: Self::NodeIndex) -> usize;
    fn predecessors(&self, node: Self::NodeIndex) -> Self::PredecessorIterator<'_>;
    fn successors(&self, node: Self::NodeIndex) -> Self::SuccessorIterator<'_>;

    /// Exit nodes have no outgoing edges
    fn is_end(&self, node: Self::NodeIndex) -> bool {
        self.successors(node).next().is_none()
    }

    fn get_symbol(&self, node: Self::NodeIndex) -> u8;
}
