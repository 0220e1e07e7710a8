use tracing::{debug, trace};

use crate::aligner::AlignedPair;
use crate::errors::{Capacity, PoaError};
use crate::graphs::poa::POAGraph;
use crate::graphs::toposort::TopologicalOrder;
use crate::graphs::NodeId;

impl POAGraph {
    /// Incorporate an aligned read into the graph.
    ///
    /// `traceback` is the alignment as produced by the aligner, i.e., in reverse, and
    /// `order` the topological order it was computed with. The read's path through the
    /// graph is built as follows:
    ///
    /// * A matching node is reused.
    /// * A mismatching node is replaced by the member of its alignment group carrying the
    ///   read symbol, or by a new node that joins the group if there is no such member.
    /// * An inserted read symbol gets a new node.
    /// * Deleted nodes are skipped, the path continues at the next placed node.
    ///
    /// Consecutive nodes on the path are connected, and each placed node gains coverage.
    ///
    /// On error the graph may have been partially modified and should not receive further reads.
    pub fn add_alignment(
        &mut self,
        order: &TopologicalOrder<NodeId>,
        seq: &[u8],
        traceback: &[AlignedPair<NodeId>],
    ) -> Result<(), PoaError> {
        order.check_matches(&*self)?;

        for pair in traceback {
            if pair.qpos.is_some_and(|q| q >= seq.len()) {
                return Err(PoaError::InvalidTraceback);
            }

            if let Some(node) = pair.node {
                self.check_node(node)?;
            }
        }

        let nodes_before = self.node_count();
        let mut prev: Option<NodeId> = None;

        for pair in traceback.iter().rev() {
            let curr = match (pair.node, pair.qpos) {
                (Some(node), Some(qpos)) => self.resolve_aligned(node, seq[qpos])?,
                (None, Some(qpos)) => self.add_node(seq[qpos])?,
                (Some(_), None) => continue,
                (None, None) => return Err(PoaError::InvalidTraceback),
            };

            if let Some(p) = prev {
                self.reinforce_edge(p, curr)?;
            }

            self.increment_coverage(curr);
            prev = Some(curr);
        }

        debug!(new_nodes = self.node_count() - nodes_before, nodes = self.node_count(), edges = self.edge_count(), "add_alignment");

        Ok(())
    }

    /// The node that represents `symbol` in the alignment column of `node`
    fn resolve_aligned(&mut self, node: NodeId, symbol: u8) -> Result<NodeId, PoaError> {
        if self.symbol(node) == symbol {
            return Ok(node);
        }

        if let Some(sibling) = self.aligned_nodes(node).iter().copied().find(|n| self.symbol(*n) == symbol) {
            trace!(node, sibling, "reuse aligned node");
            return Ok(sibling);
        }

        // Check the group before allocating, so a full group doesn't leave an orphan node behind
        if !self.can_join_alignment_group(node) {
            return Err(PoaError::capacity(Capacity::AlignedNodes, self.limits().max_aligned_nodes));
        }

        let new_node = self.add_node(symbol)?;
        self.join_alignment_group(new_node, node)?;
        trace!(node, new_node, "new aligned node");

        Ok(new_node)
    }
}

#[cfg(test)]
mod tests {
    use crate::aligner::{AlignedPair, PoaAligner};
    use crate::config::{WindowConfig, WindowLimits};
    use crate::errors::{Capacity, PoaError};
    use crate::graphs::poa::POAGraph;
    use crate::graphs::toposort::topological_sort;
    use crate::graphs::{AlignableGraph, NodeId};

    fn config() -> WindowConfig {
        WindowConfig {
            limits: WindowLimits { max_nodes: 32, max_read_length: 16, ..WindowLimits::default() },
            ..WindowConfig::default()
        }
    }

    fn chain(limits: WindowLimits, seq: &[u8]) -> POAGraph {
        let edges: Vec<_> = (1..seq.len() as NodeId).map(|i| (i - 1, i)).collect();
        POAGraph::from_edges(limits, seq, &edges).unwrap()
    }

    fn align_and_merge(graph: &mut POAGraph, seq: &[u8]) -> Result<i32, PoaError> {
        let order = topological_sort(&*graph)?;
        let mut aligner = PoaAligner::new(&config());
        let result = aligner.align(&*graph, &order, seq)?;
        graph.add_alignment(&order, seq, &result.traceback)?;

        Ok(result.score)
    }

    #[test]
    fn test_identical_read_adds_no_nodes() {
        let mut graph = chain(config().limits, b"ACGTAC");

        align_and_merge(&mut graph, b"ACGTAC").unwrap();
        align_and_merge(&mut graph, b"ACGTAC").unwrap();

        assert_eq!(graph.node_count(), 6);
        assert_eq!(graph.edge_count(), 5);
        for i in 1..6 {
            assert_eq!(graph.edge_weight(i - 1, i), Some(3));
            assert_eq!(graph.coverage(i), 2);
        }
    }

    #[test]
    fn test_mismatches_create_aligned_nodes() {
        let mut graph = chain(config().limits, b"ABCDE");

        let score = align_and_merge(&mut graph, b"GBCFE").unwrap();
        assert_eq!(score, -6 + 8 + 8 - 6 + 8);

        assert_eq!(graph.node_count(), 7);
        assert_eq!(graph.symbol(5), b'G');
        assert_eq!(graph.symbol(6), b'F');
        assert_eq!(graph.aligned_nodes(0), &[5]);
        assert_eq!(graph.aligned_nodes(5), &[0]);
        assert_eq!(graph.aligned_nodes(3), &[6]);

        let out_degrees: Vec<_> = graph.all_nodes().map(|n| graph.out_degree(n)).collect();
        assert_eq!(out_degrees, [1, 1, 2, 1, 0, 1, 1]);

        assert!(graph.has_edge(5, 1));
        assert!(graph.has_edge(2, 6));
        assert!(graph.has_edge(6, 4));
        assert_eq!(graph.edge_weight(1, 2), Some(2));
    }

    #[test]
    fn test_aligned_sibling_is_reused() {
        let mut graph = chain(config().limits, b"ACGTA");

        align_and_merge(&mut graph, b"ACTTA").unwrap();
        assert_eq!(graph.node_count(), 6);

        // Same read again follows the new node
        align_and_merge(&mut graph, b"ACTTA").unwrap();
        assert_eq!(graph.node_count(), 6);
        assert_eq!(graph.coverage(5), 2);
        assert_eq!(graph.edge_weight(1, 5), Some(2));

        // A third symbol in the same column aligns to G, no sibling carries an A, so a
        // new node joins the whole group
        align_and_merge(&mut graph, b"ACATA").unwrap();
        assert_eq!(graph.node_count(), 7);
        assert_eq!(graph.aligned_nodes(6), &[2, 5]);
        assert!(graph.is_aligned(5, 6));
        assert!(graph.is_aligned(2, 6));
    }

    #[test]
    fn test_insertion_and_deletion() {
        let mut graph = chain(config().limits, b"ACGTACGT");

        // The T at position 3 is deleted
        align_and_merge(&mut graph, b"ACGACGT").unwrap();
        assert_eq!(graph.node_count(), 8);
        assert_eq!(graph.edge_weight(2, 4), Some(1));
        assert_eq!(graph.edge_weight(2, 3), Some(1));
        assert_eq!(graph.coverage(3), 0);

        // A C inserted after the first T
        align_and_merge(&mut graph, b"ACGTCACGT").unwrap();
        assert_eq!(graph.node_count(), 9);
        assert_eq!(graph.symbol(8), b'C');
        assert!(graph.aligned_nodes(8).is_empty());
        assert!(graph.has_edge(3, 8));
        assert!(graph.has_edge(8, 4));

        topological_sort(&graph).unwrap();
    }

    #[test]
    fn test_branching_graph_end_to_end() {
        //        |----->F------|
        //        |             v
        //  E---->A----->B----->D
        //               ^
        //  C------------|
        let mut graph = POAGraph::from_edges(
            config().limits,
            b"ABCDEF",
            &[(0, 5), (0, 1), (1, 3), (2, 1), (4, 0), (5, 3)]
        ).unwrap();

        let out_before: Vec<_> = graph.all_nodes().map(|n| graph.out_degree(n)).collect();
        assert_eq!(out_before, [2, 1, 1, 0, 1, 1]);

        align_and_merge(&mut graph, b"EGFD").unwrap();

        assert_eq!(graph.node_count(), 7);
        assert_eq!(graph.symbol(6), b'G');
        assert_eq!(graph.aligned_nodes(6), &[0]);
        assert_eq!(graph.in_neighbors(6), &[4]);
        assert_eq!(graph.out_neighbors(6), &[5]);

        let out_after: Vec<_> = graph.all_nodes().map(|n| graph.out_degree(n)).collect();
        assert_eq!(out_after, [2, 1, 1, 0, 2, 1, 1]);
        assert_eq!(graph.edge_weight(5, 3), Some(2));

        let order = topological_sort(&graph).unwrap();
        assert_eq!(order.nodes(), &[2, 4, 0, 6, 1, 5, 3]);
    }

    #[test]
    fn test_first_read_builds_chain() {
        let mut graph = POAGraph::new(config().limits);
        let score = align_and_merge(&mut graph, b"ACGT").unwrap();

        assert_eq!(score, -32);
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
        for i in 1..4 {
            assert!(graph.has_edge(i - 1, i));
        }
    }

    #[test]
    fn test_node_capacity() {
        let limits = WindowLimits { max_nodes: 5, ..config().limits };
        let mut graph = chain(limits, b"ACGT");

        let err = align_and_merge(&mut graph, b"ACCGTT").unwrap_err();
        assert!(matches!(err, PoaError::CapacityExceeded { capacity: Capacity::Nodes, limit: 5 }));
        assert_eq!(graph.node_count(), 5);
    }

    #[test]
    fn test_aligned_group_capacity() {
        let limits = WindowLimits { max_aligned_nodes: 1, ..config().limits };
        let mut graph = chain(limits, b"ACGTA");

        align_and_merge(&mut graph, b"ACTTA").unwrap();
        let nodes = graph.node_count();

        let err = align_and_merge(&mut graph, b"ACATA").unwrap_err();
        assert!(matches!(err, PoaError::CapacityExceeded { capacity: Capacity::AlignedNodes, limit: 1 }));
        assert_eq!(graph.node_count(), nodes);
    }

    #[test]
    fn test_invalid_traceback() {
        let mut graph = chain(config().limits, b"ACGT");
        let order = topological_sort(&graph).unwrap();

        let traceback = vec![AlignedPair::new(Some(0), Some(4))];
        assert!(matches!(graph.add_alignment(&order, b"ACGT", &traceback), Err(PoaError::InvalidTraceback)));

        let traceback = vec![AlignedPair::new(Some(9), Some(0))];
        assert!(matches!(graph.add_alignment(&order, b"ACGT", &traceback), Err(PoaError::InvalidNode(9))));

        assert_eq!(graph.edge_count(), 3);
    }
}
