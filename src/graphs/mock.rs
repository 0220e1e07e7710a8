//! A module containing a mock graph struct useful for creating
//! test graphs in unit tests

use rustc_hash::FxHashMap;
use petgraph::graph::{DiGraph, NodeIndex, NodeIndices};
use petgraph::{Incoming, Outgoing};

use crate::graphs::{AlignableGraph, NodeIndexType};

pub(crate) type NIx = u32;

pub(crate) type MockGraph = DiGraph<u8, (), NIx>;

impl NodeIndexType for NodeIndex<NIx> {
    #[inline(always)]
    fn index(&self) -> usize {
        NodeIndex::index(*self)
    }
}

/// Petgraph yields neighbors most recent edge first, flip them to insertion order
fn neighbors_in_insertion_order(graph: &MockGraph, node: NodeIndex<NIx>, dir: petgraph::Direction) -> std::vec::IntoIter<NodeIndex<NIx>> {
    let mut neighbors: Vec<_> = graph.neighbors_directed(node, dir).collect();
    neighbors.reverse();

    neighbors.into_iter()
}

impl AlignableGraph for MockGraph {
    type NodeIndex = NodeIndex<NIx>;

    type NodeIterator<'a> = NodeIndices<NIx>
        where Self: 'a;

    type PredecessorIterator<'a> = std::vec::IntoIter<NodeIndex<NIx>>
        where Self: 'a;
    type SuccessorIterator<'a> = std::vec::IntoIter<NodeIndex<NIx>>
        where Self: 'a;

    fn all_nodes(&self) -> Self::NodeIterator<'_> {
        self.node_indices()
    }

    fn node_count(&self) -> usize {
        self.node_count()
    }

    fn in_degree(&self, node: Self::NodeIndex) -> usize {
        self.neighbors_directed(node, Incoming).count()
    }

    fn predecessors(&self, node: Self::NodeIndex) -> Self::PredecessorIterator<'_> {
        neighbors_in_insertion_order(self, node, Incoming)
    }

    fn successors(&self, node: Self::NodeIndex) -> Self::SuccessorIterator<'_> {
        neighbors_in_insertion_order(self, node, Outgoing)
    }

    fn get_symbol(&self, node: Self::NodeIndex) -> u8 {
        self[node]
    }
}

fn graph_from_edges(num_nodes: u8, edges: &[(u8, u8)]) -> MockGraph {
    let mut nmap = FxHashMap::default();
    let mut g = MockGraph::default();

    for i in 1..=num_nodes {
        let nix = g.add_node(b'A' + i - 1);
        nmap.insert(i, nix);
    }

    for (s, t) in edges.iter() {
        g.add_edge(nmap[s], nmap[t], ());
    }

    g
}

pub(crate) fn create_test_graph1() -> MockGraph {
    let edges = [
        (1, 2),
        (2, 3),
        (3, 4),
        (4, 5),
        (5, 6),
        (3, 7),
        (7, 8),
        (8, 9)
    ];

    graph_from_edges(9, &edges)
}

pub(crate) fn create_test_graph2() -> MockGraph {
    let edges = [
        (1, 2),
        (1, 3),
        (2, 3),
        (3, 4),
        (3, 5),
        (3, 11),
        (4, 8),
        (5, 6),
        (5, 9),
        (6, 7),
        (6, 10),
        (7, 8),
        (8, 13),
        (8, 14),
        (9, 10),
        (10, 7),
        (11, 12),
        (12, 8),
        (13, 14),
        (13, 15),
        (15, 14)
    ];

    graph_from_edges(15, &edges)
}
