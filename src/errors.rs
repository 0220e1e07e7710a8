use std::fmt::{Display, Formatter};
use std::io;

use thiserror::Error;

/// The fixed-size structures of a window that can run out of room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    /// Number of nodes in the graph
    Nodes,

    /// Outgoing edges of a single node
    OutEdges,

    /// Incoming edges of a single node
    InEdges,

    /// Alignment group of a single node
    AlignedNodes,

    /// Length of a read, bounded by the aligner scratch buffers
    ReadLength,
}

impl Display for Capacity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nodes => write!(f, "nodes per window"),
            Self::OutEdges => write!(f, "outgoing edges per node"),
            Self::InEdges => write!(f, "incoming edges per node"),
            Self::AlignedNodes => write!(f, "aligned nodes per node"),
            Self::ReadLength => write!(f, "read length"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PoaError {
    /// A fixed-capacity structure would overflow
    #[error("Capacity exceeded: at most {limit} {capacity} allowed.")]
    CapacityExceeded { capacity: Capacity, limit: usize },

    /// Topological sorting could not linearize all nodes
    #[error("The graph is malformed: only {sorted} of {node_count} nodes could be ordered (cycle?).")]
    MalformedGraph { sorted: usize, node_count: usize },

    /// A node id outside of the graph was referenced
    #[error("Node {0} does not exist in the graph.")]
    InvalidNode(usize),

    /// An edge from a node to itself was requested
    #[error("Invalid edge {0} -> {1}.")]
    InvalidEdge(usize, usize),

    /// The topological order was computed for a different state of the graph
    #[error("Topological order covers {order_len} nodes, but the graph has {node_count}.")]
    StaleOrder { order_len: usize, node_count: usize },

    /// The traceback does not fit the read it is merged with
    #[error("The traceback references positions outside of the read.")]
    InvalidTraceback,

    /// The score matrix does not support a valid traceback
    #[error("Something went wrong with the alignment traceback!")]
    AlignmentError,

    /// A previous merge into this window failed half-way
    #[error("The window graph is contaminated by an earlier failed merge.")]
    WindowContaminated,

    /// Configuration values out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO errors
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Error variant when the graph could not be (de)serialized
    #[error("Could not (de)serialize the graph!")]
    Serialization(#[from] bincode::Error),
}

impl PoaError {
    pub(crate) fn capacity(capacity: Capacity, limit: usize) -> Self {
        Self::CapacityExceeded { capacity, limit }
    }
}
