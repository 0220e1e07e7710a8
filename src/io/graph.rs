//! Graph serialization to disk using serde

use std::fmt;
use std::io::{Read, Write};

use petgraph::dot::Dot;
use petgraph::graph::DiGraph;
use petgraph::visit::EdgeRef;

use crate::errors::PoaError;
use crate::graphs::poa::POAGraph;
use crate::graphs::AlignableGraph;

pub fn save_graph(graph: &POAGraph, out: impl Write) -> Result<(), PoaError> {
    bincode::serialize_into(out, graph)?;

    Ok(())
}

/// Load a graph written by [`save_graph`]. Data that doesn't describe a consistent
/// graph, including invalid limits, is reported as [`PoaError::Serialization`].
pub fn load_graph(reader: impl Read) -> Result<POAGraph, PoaError> {
    let graph: POAGraph = bincode::deserialize_from(reader)?;

    Ok(graph)
}

enum DotEdge {
    /// Number of reads that traversed the edge
    Weight(u32),

    /// Both nodes are in the same alignment column
    Aligned,
}

impl fmt::Display for DotEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weight(w) => write!(f, "{w}"),
            Self::Aligned => Ok(()),
        }
    }
}

/// Write the graph in graphviz format. Nodes are labeled with their symbol, id and
/// coverage, edges with their weight. Alignment group links are drawn as dashed lines.
pub fn graph_to_dot(writer: &mut impl fmt::Write, graph: &POAGraph) -> fmt::Result {
    let mut transformed: DiGraph<String, DotEdge, u32> = DiGraph::with_capacity(graph.node_count(), graph.edge_count());

    for node in graph.all_nodes() {
        transformed.add_node(format!("{:?} ({}) cov={}", char::from(graph.symbol(node)), node, graph.coverage(node)));
    }

    for node in graph.all_nodes() {
        for succ in graph.successors(node) {
            let weight = graph.edge_weight(node, succ).unwrap_or_default();
            transformed.add_edge(node.into(), succ.into(), DotEdge::Weight(weight));
        }

        for other in graph.aligned_nodes(node) {
            if node < *other {
                transformed.add_edge(node.into(), (*other).into(), DotEdge::Aligned);
            }
        }
    }

    let dot = Dot::with_attr_getters(
        &transformed,
        &[],
        &|_, e| match e.weight() {
            DotEdge::Aligned => "style=dashed, arrowhead=none, constraint=false".to_string(),
            DotEdge::Weight(_) => String::new(),
        },
        &|_, _| String::new(),
    );

    writeln!(writer, "{}", dot)?;

    Ok(())
}
