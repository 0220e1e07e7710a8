use smallvec::SmallVec;
use tracing::debug;

use crate::errors::PoaError;
use crate::graphs::{AlignableGraph, NodeIndexType};

/// A linear order of all graph nodes consistent with the edge directions,
/// together with the reverse lookup from node to its position (rank) in that order.
///
/// This is derived data: it is only valid for the graph state it was computed
/// from and has to be recomputed after each mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologicalOrder<N> {
    order: Vec<N>,
    ranks: Vec<usize>,
}

impl<N> TopologicalOrder<N>
where
    N: NodeIndexType,
{
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Nodes in topological order
    pub fn nodes(&self) -> &[N] {
        &self.order
    }

    /// Node ranks indexed by node index
    pub fn ranks(&self) -> &[usize] {
        &self.ranks
    }

    #[inline(always)]
    pub fn rank(&self, node: N) -> usize {
        self.ranks[node.index()]
    }

    #[inline(always)]
    pub fn node_at(&self, rank: usize) -> N {
        self.order[rank]
    }

    /// Check whether this order was computed for a graph with the given number of nodes
    pub fn check_matches<G>(&self, graph: &G) -> Result<(), PoaError>
    where
        G: AlignableGraph<NodeIndex=N>,
    {
        if self.order.len() != graph.node_count() {
            return Err(PoaError::StaleOrder {
                order_len: self.order.len(),
                node_count: graph.node_count(),
            });
        }

        Ok(())
    }
}

type Wave<N> = SmallVec<[N; 32]>;

/// Sort the graph nodes with Kahn's algorithm.
///
/// Ties between simultaneously ready nodes are broken first-in first-out: the
/// initial sources are taken in ascending node index order, and nodes becoming
/// ready later are emitted in the order their last incoming edge was relaxed.
/// The nodes are processed in waves, where each wave holds all nodes that became
/// ready while relaxing the edges of the previous wave. Processing a whole wave
/// before the next one yields exactly the order of a single FIFO queue.
///
/// Returns [`PoaError::MalformedGraph`] if not all nodes could be ordered, i.e.,
/// the graph contains a cycle or its edge lists are inconsistent.
pub fn topological_sort<G>(graph: &G) -> Result<TopologicalOrder<G::NodeIndex>, PoaError>
where
    G: AlignableGraph,
{
    let node_count = graph.node_count();
    let malformed = |sorted: usize| PoaError::MalformedGraph { sorted, node_count };

    let mut in_degree = vec![0usize; node_count];
    let mut wave = Wave::new();
    for node in graph.all_nodes() {
        let degree = graph.in_degree(node);
        *in_degree.get_mut(node.index()).ok_or_else(|| malformed(0))? = degree;

        if degree == 0 {
            wave.push(node);
        }
    }

    let mut order = Vec::with_capacity(node_count);
    let mut ranks = vec![usize::MAX; node_count];
    let mut num_waves = 0usize;

    while !wave.is_empty() {
        for node in &wave {
            ranks[node.index()] = order.len();
            order.push(*node);
        }

        let mut next_wave = Wave::new();
        for node in &wave {
            for succ in graph.successors(*node) {
                let degree = in_degree.get_mut(succ.index())
                    .ok_or_else(|| malformed(order.len()))?;

                // A successor that was already released points to an edge the
                // in-degree bookkeeping doesn't know about.
                *degree = degree.checked_sub(1)
                    .ok_or_else(|| malformed(order.len()))?;

                if *degree == 0 {
                    next_wave.push(succ);
                }
            }
        }

        wave = next_wave;
        num_waves += 1;
    }

    if order.len() < node_count {
        return Err(malformed(order.len()));
    }

    debug!(nodes = node_count, waves = num_waves, "topological_sort");

    Ok(TopologicalOrder { order, ranks })
}
