pub mod alignment;
pub mod scoring;
pub(crate) mod matrix;

use smallvec::SmallVec;
use tracing::{debug, debug_span};

use crate::config::{WindowConfig, WindowLimits};
use crate::errors::{Capacity, PoaError};
use crate::graphs::toposort::TopologicalOrder;
use crate::graphs::AlignableGraph;

pub use alignment::{AlignedPair, AlignmentResult, print_alignment};
use matrix::ScoreMatrix;
use scoring::Scoring;

type PredRows = SmallVec<[usize; 8]>;

/// Global aligner of reads to a DAG, using the Needleman-Wunsch recurrence
/// generalized to graphs.
///
/// Row `r + 1` of the score matrix belongs to the node with topological rank `r`,
/// row 0 is the virtual start that precedes every source node. Column `j` holds
/// the score of aligning the first `j` read symbols. A cell takes the best of
///
/// * the diagonal move from any predecessor row at column `j - 1`, aligning the node to `read[j - 1]`,
/// * the vertical move from any predecessor row at column `j`, skipping the node,
/// * the horizontal move from the same row at column `j - 1`, inserting `read[j - 1]`.
///
/// Rows are filled in topological order, so all predecessor rows are complete
/// before a node's row is computed.
pub struct PoaAligner {
    scoring: Scoring,
    limits: WindowLimits,
    matrix: ScoreMatrix,
}

impl PoaAligner {
    /// Create an aligner with scratch buffers sized for the window limits.
    pub fn new(config: &WindowConfig) -> Self {
        let limits = config.limits;

        Self {
            scoring: config.scoring,
            limits,
            matrix: ScoreMatrix::new(limits.max_nodes + 1, limits.max_read_length + 1),
        }
    }

    pub fn scoring(&self) -> &Scoring {
        &self.scoring
    }

    /// Align `seq` to `graph`, whose nodes have been sorted into `order`.
    ///
    /// Fails with [`PoaError::CapacityExceeded`] if the read or the graph are larger
    /// than the scratch buffers, and with [`PoaError::StaleOrder`] if `order` was not
    /// computed for the current state of the graph.
    pub fn align<G, Seq>(
        &mut self,
        graph: &G,
        order: &TopologicalOrder<G::NodeIndex>,
        seq: &Seq,
    ) -> Result<AlignmentResult<G::NodeIndex>, PoaError>
    where
        G: AlignableGraph,
        Seq: AsRef<[u8]> + ?Sized,
    {
        self.align_u8(graph, order, seq.as_ref())
    }

    fn align_u8<G>(
        &mut self,
        graph: &G,
        order: &TopologicalOrder<G::NodeIndex>,
        seq: &[u8],
    ) -> Result<AlignmentResult<G::NodeIndex>, PoaError>
    where
        G: AlignableGraph,
    {
        let span = debug_span!("align", read_len = seq.len(), nodes = graph.node_count());
        let _enter = span.enter();

        if seq.len() > self.limits.max_read_length {
            return Err(PoaError::capacity(Capacity::ReadLength, self.limits.max_read_length));
        }

        if graph.node_count() > self.limits.max_nodes {
            return Err(PoaError::capacity(Capacity::Nodes, self.limits.max_nodes));
        }

        order.check_matches(graph)?;
        debug_assert!(self.matrix.fits(graph.node_count() + 1, seq.len() + 1));

        self.fill(graph, order, seq)?;
        let (end_row, score) = self.best_end(graph, order, seq.len());
        let traceback = self.traceback(graph, order, seq, end_row)?;

        debug!(score, aln_len = traceback.len(), "alignment done");

        Ok(AlignmentResult { score, traceback })
    }

    /// Matrix rows of the predecessors of the node at `rank`, or the start row for source nodes
    fn pred_rows<G>(graph: &G, order: &TopologicalOrder<G::NodeIndex>, rank: usize) -> Result<PredRows, PoaError>
    where
        G: AlignableGraph,
    {
        let mut rows = PredRows::new();
        for pred in graph.predecessors(order.node_at(rank)) {
            let pred_rank = order.rank(pred);
            if pred_rank >= rank {
                return Err(PoaError::MalformedGraph { sorted: rank, node_count: graph.node_count() });
            }

            rows.push(pred_rank + 1);
        }

        if rows.is_empty() {
            rows.push(0);
        }

        Ok(rows)
    }

    fn fill<G>(&mut self, graph: &G, order: &TopologicalOrder<G::NodeIndex>, seq: &[u8]) -> Result<(), PoaError>
    where
        G: AlignableGraph,
    {
        let gap = self.scoring.gap();

        for (j, cell) in self.matrix.row_mut(0)[..=seq.len()].iter_mut().enumerate() {
            *cell = j as i32 * gap;
        }

        for (rank, node) in order.nodes().iter().enumerate() {
            let row = rank + 1;
            let symbol = graph.get_symbol(*node);
            let pred_rows = Self::pred_rows(graph, order, rank)?;

            let first = pred_rows.iter()
                .map(|p| self.matrix.get(*p, 0))
                .max()
                .unwrap_or(0);
            self.matrix.set(row, 0, first + gap);

            for j in 1..=seq.len() {
                let substitution = self.scoring.substitution(symbol, seq[j - 1]);

                let mut best = self.matrix.get(row, j - 1) + gap;
                for p in &pred_rows {
                    best = best
                        .max(self.matrix.get(*p, j - 1) + substitution)
                        .max(self.matrix.get(*p, j) + gap);
                }

                self.matrix.set(row, j, best);
            }
        }

        Ok(())
    }

    /// The best scoring exit node row in the last column. Ties are resolved in favor of
    /// the exit node that comes first in topological order.
    fn best_end<G>(&self, graph: &G, order: &TopologicalOrder<G::NodeIndex>, seq_len: usize) -> (usize, i32)
    where
        G: AlignableGraph,
    {
        let mut best: Option<(usize, i32)> = None;
        for (rank, node) in order.nodes().iter().enumerate() {
            if !graph.is_end(*node) {
                continue;
            }

            let score = self.matrix.get(rank + 1, seq_len);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((rank + 1, score));
            }
        }

        // An empty graph only has the start row
        best.unwrap_or((0, self.matrix.get(0, seq_len)))
    }

    /// Walk back from `end_row` to the start of the matrix. At each cell the first move
    /// that reproduces the cell's score is taken, preferring diagonal over horizontal
    /// (read symbol without graph node) over vertical (graph node without read symbol),
    /// and among predecessors the one whose edge was added first.
    fn traceback<G>(
        &self,
        graph: &G,
        order: &TopologicalOrder<G::NodeIndex>,
        seq: &[u8],
        end_row: usize,
    ) -> Result<Vec<AlignedPair<G::NodeIndex>>, PoaError>
    where
        G: AlignableGraph,
    {
        let gap = self.scoring.gap();
        let mut pairs = Vec::with_capacity(end_row + seq.len());
        let (mut row, mut j) = (end_row, seq.len());

        while row > 0 || j > 0 {
            let score = self.matrix.get(row, j);

            let node_preds = if row > 0 {
                let rank = row - 1;
                Some((order.node_at(rank), Self::pred_rows(graph, order, rank)?))
            } else {
                None
            };

            if let Some((node, preds)) = node_preds.as_ref().filter(|_| j > 0) {
                let substitution = self.scoring.substitution(graph.get_symbol(*node), seq[j - 1]);

                if let Some(p) = preds.iter().find(|p| self.matrix.get(**p, j - 1) + substitution == score) {
                    pairs.push(AlignedPair::new(Some(*node), Some(j - 1)));
                    row = *p;
                    j -= 1;
                    continue;
                }
            }

            if j > 0 && self.matrix.get(row, j - 1) + gap == score {
                pairs.push(AlignedPair::new(None, Some(j - 1)));
                j -= 1;
                continue;
            }

            if let Some((node, preds)) = &node_preds {
                if let Some(p) = preds.iter().find(|p| self.matrix.get(**p, j) + gap == score) {
                    pairs.push(AlignedPair::new(Some(*node), None));
                    row = *p;
                    continue;
                }
            }

            return Err(PoaError::AlignmentError);
        }

        Ok(pairs)
    }
}
