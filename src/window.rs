use tracing::{debug, warn};

use crate::aligner::{AlignmentResult, PoaAligner};
use crate::config::WindowConfig;
use crate::errors::{Capacity, PoaError};
use crate::graphs::poa::POAGraph;
use crate::graphs::toposort::{topological_sort, TopologicalOrder};
use crate::graphs::NodeId;

/// A single graph-building session: reads are added one at a time, each one
/// sorted, aligned and merged into the window's graph.
pub struct Window {
    config: WindowConfig,
    graph: POAGraph,
    aligner: PoaAligner,

    /// Valid until the next merge that adds nodes or edges
    order: Option<TopologicalOrder<NodeId>>,

    contaminated: bool,
    num_reads: usize,
}

impl Window {
    pub fn new(config: WindowConfig) -> Result<Self, PoaError> {
        config.validate()?;

        Ok(Self {
            config,
            graph: POAGraph::new(config.limits),
            aligner: PoaAligner::new(&config),
            order: None,
            contaminated: false,
            num_reads: 0,
        })
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn graph(&self) -> &POAGraph {
        &self.graph
    }

    /// Consume the window, keeping only its graph
    pub fn into_graph(self) -> POAGraph {
        self.graph
    }

    /// Number of reads successfully merged
    pub fn num_reads(&self) -> usize {
        self.num_reads
    }

    pub fn is_contaminated(&self) -> bool {
        self.contaminated
    }

    /// Align a read to the current graph and merge it.
    ///
    /// Errors before the merge step (e.g., a read that is too long) leave the window
    /// untouched. A failed merge marks the window as contaminated, after which every
    /// call fails with [`PoaError::WindowContaminated`] until [`Window::reset`].
    pub fn add_read(&mut self, seq: &[u8]) -> Result<AlignmentResult<NodeId>, PoaError> {
        if self.contaminated {
            return Err(PoaError::WindowContaminated);
        }

        let max_len = self.config.limits.max_read_length;
        if seq.len() > max_len {
            return Err(PoaError::capacity(Capacity::ReadLength, max_len));
        }

        let order = match self.order.take() {
            Some(order) => order,
            None => topological_sort(&self.graph)?,
        };

        let result = self.aligner.align(&self.graph, &order, seq)?;

        let (nodes, edges) = (self.graph.node_count(), self.graph.edge_count());
        if let Err(e) = self.graph.add_alignment(&order, seq, &result.traceback) {
            warn!(read = self.num_reads, error = %e, "Merge failed, window is contaminated.");
            self.contaminated = true;

            return Err(e);
        }

        // Reads that only followed existing edges keep the order valid
        if nodes == self.graph.node_count() && edges == self.graph.edge_count() {
            self.order = Some(order);
        }

        self.num_reads += 1;
        debug!(read = self.num_reads, score = result.score, nodes = self.graph.node_count(), "add_read");

        Ok(result)
    }

    /// Clear the graph for a new window, keeping the allocated buffers.
    pub fn reset(&mut self) {
        self.graph.reset();
        self.order = None;
        self.contaminated = false;
        self.num_reads = 0;
    }
}
