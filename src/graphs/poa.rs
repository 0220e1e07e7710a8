use std::iter::Copied;
use std::ops::Range;
use std::slice;

use serde::{Deserialize, Serialize, Serializer};
use tracing::trace;

use crate::config::WindowLimits;
use crate::errors::{Capacity, PoaError};
use crate::graphs::{AlignableGraph, NodeId};

/// The partial order alignment graph of a single window.
///
/// All storage is allocated up front from the window limits: node symbols and
/// counters live in arrays indexed by node id, and the adjacency lists are flat
/// arrays with a fixed number of slots per node. Nodes are append-only, so a node
/// id is simply the slot index and never changes. Running out of slots is reported
/// as [`PoaError::CapacityExceeded`], and a failed call leaves the graph untouched.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "GraphRecord")]
pub struct POAGraph {
    limits: WindowLimits,
    node_count: usize,
    edge_count: usize,

    symbols: Vec<u8>,
    coverage: Vec<u32>,

    out_edges: Vec<NodeId>,
    out_weights: Vec<u32>,
    out_count: Vec<u32>,

    in_edges: Vec<NodeId>,
    in_count: Vec<u32>,

    aligned_nodes: Vec<NodeId>,
    aligned_count: Vec<u32>,
}

impl POAGraph {
    pub fn new(limits: WindowLimits) -> Self {
        let n = limits.max_nodes;

        POAGraph {
            limits,
            node_count: 0,
            edge_count: 0,
            symbols: vec![0; n],
            coverage: vec![0; n],
            out_edges: vec![0; n * limits.max_out_edges],
            out_weights: vec![0; n * limits.max_out_edges],
            out_count: vec![0; n],
            in_edges: vec![0; n * limits.max_in_edges],
            in_count: vec![0; n],
            aligned_nodes: vec![0; n * limits.max_aligned_nodes],
            aligned_count: vec![0; n],
        }
    }

    /// Build a graph from a list of symbols and edges, in the given insertion order.
    pub fn from_edges(limits: WindowLimits, symbols: &[u8], edges: &[(NodeId, NodeId)]) -> Result<Self, PoaError> {
        let mut graph = Self::new(limits);
        for symbol in symbols {
            graph.add_node(*symbol)?;
        }

        for (s, t) in edges {
            graph.add_edge(*s, *t)?;
        }

        Ok(graph)
    }

    pub fn limits(&self) -> &WindowLimits {
        &self.limits
    }

    pub fn is_empty(&self) -> bool {
        self.node_count == 0
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Drop all nodes and edges, keeping the allocated storage for the next window.
    pub fn reset(&mut self) {
        let n = self.node_count;
        self.out_count[..n].fill(0);
        self.in_count[..n].fill(0);
        self.aligned_count[..n].fill(0);
        self.coverage[..n].fill(0);

        self.node_count = 0;
        self.edge_count = 0;
    }

    #[inline]
    pub(crate) fn check_node(&self, node: NodeId) -> Result<usize, PoaError> {
        let ix = node as usize;
        if ix >= self.node_count {
            return Err(PoaError::InvalidNode(ix));
        }

        Ok(ix)
    }

    pub fn add_node(&mut self, symbol: u8) -> Result<NodeId, PoaError> {
        if self.node_count >= self.limits.max_nodes {
            return Err(PoaError::capacity(Capacity::Nodes, self.limits.max_nodes));
        }

        let ix = self.node_count;
        self.symbols[ix] = symbol;
        self.coverage[ix] = 0;
        self.out_count[ix] = 0;
        self.in_count[ix] = 0;
        self.aligned_count[ix] = 0;
        self.node_count += 1;

        Ok(ix as NodeId)
    }

    #[inline]
    pub fn symbol(&self, node: NodeId) -> u8 {
        self.symbols[node as usize]
    }

    /// Number of reads that were resolved onto this node
    #[inline]
    pub fn coverage(&self, node: NodeId) -> u32 {
        self.coverage[node as usize]
    }

    pub(crate) fn increment_coverage(&mut self, node: NodeId) {
        self.coverage[node as usize] += 1;
    }

    #[inline]
    fn out_range(&self, ix: usize) -> Range<usize> {
        let start = ix * self.limits.max_out_edges;
        start..start + self.out_count[ix] as usize
    }

    #[inline]
    fn in_range(&self, ix: usize) -> Range<usize> {
        let start = ix * self.limits.max_in_edges;
        start..start + self.in_count[ix] as usize
    }

    #[inline]
    fn aligned_range(&self, ix: usize) -> Range<usize> {
        let start = ix * self.limits.max_aligned_nodes;
        start..start + self.aligned_count[ix] as usize
    }

    /// Outgoing neighbors, in the order the edges were added
    pub fn out_neighbors(&self, node: NodeId) -> &[NodeId] {
        &self.out_edges[self.out_range(node as usize)]
    }

    /// Incoming neighbors, in the order the edges were added
    pub fn in_neighbors(&self, node: NodeId) -> &[NodeId] {
        &self.in_edges[self.in_range(node as usize)]
    }

    pub fn out_degree(&self, node: NodeId) -> usize {
        self.out_count[node as usize] as usize
    }

    /// The other nodes in the same alignment column as `node`
    pub fn aligned_nodes(&self, node: NodeId) -> &[NodeId] {
        &self.aligned_nodes[self.aligned_range(node as usize)]
    }

    fn find_edge_slot(&self, s: NodeId, t: NodeId) -> Option<usize> {
        let range = self.out_range(s as usize);
        let start = range.start;

        self.out_edges[range].iter()
            .position(|v| *v == t)
            .map(|pos| start + pos)
    }

    pub fn has_edge(&self, s: NodeId, t: NodeId) -> bool {
        self.find_edge_slot(s, t).is_some()
    }

    /// Number of times the edge `s -> t` was observed, or `None` if there's no such edge.
    pub fn edge_weight(&self, s: NodeId, t: NodeId) -> Option<u32> {
        self.find_edge_slot(s, t).map(|slot| self.out_weights[slot])
    }

    /// Add the edge `s -> t`. Adding an edge that already exists is a no-op.
    pub fn add_edge(&mut self, s: NodeId, t: NodeId) -> Result<(), PoaError> {
        self.insert_edge(s, t).map(|_| ())
    }

    /// Add the edge `s -> t`, or increase its weight by one if it already exists.
    pub fn reinforce_edge(&mut self, s: NodeId, t: NodeId) -> Result<(), PoaError> {
        if let Some(slot) = self.insert_edge(s, t)? {
            self.out_weights[slot] += 1;
        }

        Ok(())
    }

    /// Returns the slot of the edge if it already existed
    fn insert_edge(&mut self, s: NodeId, t: NodeId) -> Result<Option<usize>, PoaError> {
        let si = self.check_node(s)?;
        let ti = self.check_node(t)?;

        if si == ti {
            return Err(PoaError::InvalidEdge(si, ti));
        }

        if let Some(slot) = self.find_edge_slot(s, t) {
            return Ok(Some(slot));
        }

        if self.out_count[si] as usize >= self.limits.max_out_edges {
            return Err(PoaError::capacity(Capacity::OutEdges, self.limits.max_out_edges));
        }

        if self.in_count[ti] as usize >= self.limits.max_in_edges {
            return Err(PoaError::capacity(Capacity::InEdges, self.limits.max_in_edges));
        }

        let out_slot = self.out_range(si).end;
        self.out_edges[out_slot] = t;
        self.out_weights[out_slot] = 1;
        self.out_count[si] += 1;

        let in_slot = self.in_range(ti).end;
        self.in_edges[in_slot] = s;
        self.in_count[ti] += 1;

        self.edge_count += 1;
        trace!(source = s, target = t, "add_edge");

        Ok(None)
    }

    pub fn is_aligned(&self, a: NodeId, b: NodeId) -> bool {
        self.aligned_nodes(a).contains(&b)
    }

    /// Record that `a` and `b` occupy the same alignment column. The link is stored
    /// on both nodes; linking an already linked pair is a no-op.
    pub fn link_aligned(&mut self, a: NodeId, b: NodeId) -> Result<(), PoaError> {
        let ai = self.check_node(a)?;
        let bi = self.check_node(b)?;

        if ai == bi {
            return Err(PoaError::InvalidEdge(ai, bi));
        }

        if self.is_aligned(a, b) {
            return Ok(());
        }

        let max = self.limits.max_aligned_nodes;
        if self.aligned_count[ai] as usize >= max || self.aligned_count[bi] as usize >= max {
            return Err(PoaError::capacity(Capacity::AlignedNodes, max));
        }

        self.push_aligned(ai, b);
        self.push_aligned(bi, a);

        Ok(())
    }

    fn push_aligned(&mut self, ix: usize, other: NodeId) {
        let slot = self.aligned_range(ix).end;
        self.aligned_nodes[slot] = other;
        self.aligned_count[ix] += 1;
    }

    /// Make `node` a member of the alignment group of `anchor`, i.e., link it to
    /// `anchor` and to every node already aligned to `anchor`.
    ///
    /// All group sizes are checked before any link is written.
    pub fn join_alignment_group(&mut self, node: NodeId, anchor: NodeId) -> Result<(), PoaError> {
        let ni = self.check_node(node)?;
        self.check_node(anchor)?;

        let max = self.limits.max_aligned_nodes;
        let members: Vec<NodeId> = std::iter::once(anchor)
            .chain(self.aligned_nodes(anchor).iter().copied())
            .filter(|m| *m != node && !self.is_aligned(node, *m))
            .collect();

        if self.aligned_count[ni] as usize + members.len() > max
            || members.iter().any(|m| self.aligned_count[*m as usize] as usize >= max)
        {
            return Err(PoaError::capacity(Capacity::AlignedNodes, max));
        }

        for m in members {
            self.push_aligned(ni, m);
            self.push_aligned(m as usize, node);
        }

        Ok(())
    }

    /// Space left in the alignment group of `anchor` for one more member
    pub(crate) fn can_join_alignment_group(&self, anchor: NodeId) -> bool {
        let max = self.limits.max_aligned_nodes;
        let group = self.aligned_nodes(anchor);

        group.len() < max && group.iter().all(|m| (self.aligned_count[*m as usize] as usize) < max)
    }

    /// Check that the storage matches the limits and all stored ids point to existing
    /// nodes. Graphs built through this API always pass; deserialized ones may not.
    pub(crate) fn check_consistency(&self) -> Result<(), PoaError> {
        self.limits.validate()?;
        self.check_storage().map_err(corrupt)
    }

    fn check_storage(&self) -> Result<(), String> {
        let l = &self.limits;
        let n = l.max_nodes;

        if self.node_count > n {
            return Err(format!("{} nodes exceed the limit of {n}", self.node_count));
        }

        let lengths = [
            ("symbols", self.symbols.len(), n),
            ("coverage", self.coverage.len(), n),
            ("out_edges", self.out_edges.len(), n * l.max_out_edges),
            ("out_weights", self.out_weights.len(), n * l.max_out_edges),
            ("out_count", self.out_count.len(), n),
            ("in_edges", self.in_edges.len(), n * l.max_in_edges),
            ("in_count", self.in_count.len(), n),
            ("aligned_nodes", self.aligned_nodes.len(), n * l.max_aligned_nodes),
            ("aligned_count", self.aligned_count.len(), n),
        ];

        if let Some((name, len, expected)) = lengths.iter().find(|(_, len, expected)| len != expected) {
            return Err(format!("{name} holds {len} entries instead of {expected}"));
        }

        let counts = [
            ("out_count", &self.out_count, l.max_out_edges),
            ("in_count", &self.in_count, l.max_in_edges),
            ("aligned_count", &self.aligned_count, l.max_aligned_nodes),
        ];

        for (name, values, max) in counts {
            if let Some(ix) = values[..self.node_count].iter().position(|c| *c as usize > max) {
                return Err(format!("{name} of node {ix} exceeds the limit of {max}"));
            }
        }

        let total_out: usize = self.out_count[..self.node_count].iter().map(|c| *c as usize).sum();
        let total_in: usize = self.in_count[..self.node_count].iter().map(|c| *c as usize).sum();
        if total_out != self.edge_count || total_in != self.edge_count {
            return Err(format!("edge count {} does not match the adjacency lists", self.edge_count));
        }

        for node in 0..self.node_count as NodeId {
            let neighbors = self.out_neighbors(node).iter()
                .chain(self.in_neighbors(node))
                .chain(self.aligned_nodes(node));

            if let Some(other) = neighbors.copied().find(|v| *v as usize >= self.node_count || *v == node) {
                return Err(format!("node {node} links to invalid node {other}"));
            }
        }

        Ok(())
    }
}

/// On-disk form of a [`POAGraph`]: only the entries of live nodes and their used
/// adjacency slots are stored, each adjacency list packed after the previous one.
#[derive(Serialize, Deserialize)]
struct GraphRecord {
    limits: WindowLimits,
    node_count: usize,
    edge_count: usize,

    symbols: Vec<u8>,
    coverage: Vec<u32>,
    out_count: Vec<u32>,
    in_count: Vec<u32>,
    aligned_count: Vec<u32>,

    out_edges: Vec<NodeId>,
    out_weights: Vec<u32>,
    in_edges: Vec<NodeId>,
    aligned_nodes: Vec<NodeId>,
}

fn corrupt(msg: String) -> PoaError {
    PoaError::Serialization(Box::new(bincode::ErrorKind::Custom(msg)))
}

fn pack<T: Copy>(slots: &[T], width: usize, counts: &[u32]) -> Vec<T> {
    counts.iter()
        .enumerate()
        .flat_map(|(ix, count)| &slots[ix * width..ix * width + *count as usize])
        .copied()
        .collect()
}

fn unpack<T: Copy>(slots: &mut [T], width: usize, counts: &[u32], packed: &[T]) -> Result<(), PoaError> {
    let mut cursor = 0;
    for (ix, count) in counts.iter().enumerate() {
        let count = *count as usize;
        let Some(entries) = packed.get(cursor..cursor + count).filter(|_| count <= width) else {
            return Err(corrupt(format!("adjacency list of node {ix} is out of range")));
        };

        slots[ix * width..ix * width + count].copy_from_slice(entries);
        cursor += count;
    }

    if cursor != packed.len() {
        return Err(corrupt(format!("{} unused adjacency entries", packed.len() - cursor)));
    }

    Ok(())
}

impl From<&POAGraph> for GraphRecord {
    fn from(graph: &POAGraph) -> Self {
        let n = graph.node_count;
        let l = &graph.limits;

        GraphRecord {
            limits: graph.limits,
            node_count: n,
            edge_count: graph.edge_count,
            symbols: graph.symbols[..n].to_vec(),
            coverage: graph.coverage[..n].to_vec(),
            out_count: graph.out_count[..n].to_vec(),
            in_count: graph.in_count[..n].to_vec(),
            aligned_count: graph.aligned_count[..n].to_vec(),
            out_edges: pack(&graph.out_edges, l.max_out_edges, &graph.out_count[..n]),
            out_weights: pack(&graph.out_weights, l.max_out_edges, &graph.out_count[..n]),
            in_edges: pack(&graph.in_edges, l.max_in_edges, &graph.in_count[..n]),
            aligned_nodes: pack(&graph.aligned_nodes, l.max_aligned_nodes, &graph.aligned_count[..n]),
        }
    }
}

impl TryFrom<GraphRecord> for POAGraph {
    type Error = PoaError;

    fn try_from(record: GraphRecord) -> Result<Self, PoaError> {
        record.limits.validate()?;

        let n = record.node_count;
        if n > record.limits.max_nodes {
            return Err(corrupt(format!("{n} nodes exceed the limit of {}", record.limits.max_nodes)));
        }

        let per_node = [
            ("symbols", record.symbols.len()),
            ("coverage", record.coverage.len()),
            ("out_count", record.out_count.len()),
            ("in_count", record.in_count.len()),
            ("aligned_count", record.aligned_count.len()),
        ];

        if let Some((name, len)) = per_node.iter().find(|(_, len)| *len != n) {
            return Err(corrupt(format!("{name} holds {len} entries for {n} nodes")));
        }

        if record.out_weights.len() != record.out_edges.len() {
            return Err(corrupt("edge weights don't match the outgoing edges".to_string()));
        }

        let mut graph = POAGraph::new(record.limits);
        let l = record.limits;

        graph.node_count = n;
        graph.edge_count = record.edge_count;
        graph.symbols[..n].copy_from_slice(&record.symbols);
        graph.coverage[..n].copy_from_slice(&record.coverage);
        graph.out_count[..n].copy_from_slice(&record.out_count);
        graph.in_count[..n].copy_from_slice(&record.in_count);
        graph.aligned_count[..n].copy_from_slice(&record.aligned_count);

        unpack(&mut graph.out_edges, l.max_out_edges, &record.out_count, &record.out_edges)?;
        unpack(&mut graph.out_weights, l.max_out_edges, &record.out_count, &record.out_weights)?;
        unpack(&mut graph.in_edges, l.max_in_edges, &record.in_count, &record.in_edges)?;
        unpack(&mut graph.aligned_nodes, l.max_aligned_nodes, &record.aligned_count, &record.aligned_nodes)?;

        graph.check_consistency()?;

        Ok(graph)
    }
}

impl Serialize for POAGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        GraphRecord::from(self).serialize(serializer)
    }
}

impl AlignableGraph for POAGraph {
    type NodeIndex = NodeId;
    type NodeIterator<'a> = Range<NodeId>;
    type PredecessorIterator<'a> = Copied<slice::Iter<'a, NodeId>>;
    type SuccessorIterator<'a> = Copied<slice::Iter<'a, NodeId>>;

    fn all_nodes(&self) -> Self::NodeIterator<'_> {
        0..self.node_count as NodeId
    }

    fn node_count(&self) -> usize {
        self.node_count
    }

    fn in_degree(&self, node: NodeId) -> usize {
        self.in_count[node as usize] as usize
    }

    fn predecessors(&self, node: NodeId) -> Self::PredecessorIterator<'_> {
        self.in_neighbors(node).iter().copied()
    }

    fn successors(&self, node: NodeId) -> Self::SuccessorIterator<'_> {
        self.out_neighbors(node).iter().copied()
    }

    fn is_end(&self, node: NodeId) -> bool {
        self.out_count[node as usize] == 0
    }

    fn get_symbol(&self, node: NodeId) -> u8 {
        self.symbol(node)
    }
}
