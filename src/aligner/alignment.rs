use crate::graphs::{AlignableGraph, NodeIndexType};

/// One column of an alignment between the graph and a read.
///
/// When both positions are set the node is aligned to the read symbol (match or
/// mismatch). A missing read position means the node was skipped (deletion), a
/// missing node means the read symbol has no counterpart in the graph (insertion).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlignedPair<N>
where
    N: NodeIndexType
{
    /// Graph node
    pub node: Option<N>,

    /// Read position
    pub qpos: Option<usize>
}

impl<N> AlignedPair<N>
where
    N: NodeIndexType
{
    pub fn new(node: Option<N>, qpos: Option<usize>) -> Self {
        Self { node, qpos }
    }

    pub fn is_aligned(&self) -> bool {
        matches!((self.node, self.qpos), (Some(_), Some(_)))
    }

    pub fn is_insertion(&self) -> bool {
        self.node.is_none() && self.qpos.is_some()
    }

    pub fn is_deletion(&self) -> bool {
        self.node.is_some() && self.qpos.is_none()
    }

    pub fn is_indel(&self) -> bool {
        !self.is_aligned()
    }
}

/// The optimal alignment of a read to the graph.
///
/// The traceback is stored as it was reconstructed, i.e., from the end of the
/// alignment back to its start. Use [`AlignmentResult::forward`] for the natural order.
#[derive(Clone, Debug)]
pub struct AlignmentResult<N>
where
    N: NodeIndexType
{
    pub score: i32,
    pub traceback: Vec<AlignedPair<N>>,
}

impl<N> AlignmentResult<N>
where
    N: NodeIndexType
{
    pub fn forward(&self) -> impl DoubleEndedIterator<Item=&AlignedPair<N>> + '_ {
        self.traceback.iter().rev()
    }

    pub fn num_matches<G>(&self, graph: &G, seq: &[u8]) -> usize
    where
        G: AlignableGraph<NodeIndex=N>
    {
        self.traceback.iter()
            .filter(|p| match (p.node, p.qpos) {
                (Some(n), Some(q)) => graph.get_symbol(n) == seq[q],
                _ => false
            })
            .count()
    }
}

/// Render a forward alignment as three rows: graph symbols, match markers and read symbols.
pub fn print_alignment<'a, G>(
    graph: &G,
    seq: &[u8],
    aln: impl IntoIterator<Item=&'a AlignedPair<G::NodeIndex>>
) -> String
where
    G: AlignableGraph,
    G::NodeIndex: 'a,
{
    let mut graph_chars = Vec::new();
    let mut aln_chars = Vec::new();
    let mut query_chars = Vec::new();

    for pair in aln {
        match (pair.node, pair.qpos) {
            (Some(node), Some(qpos)) => {
                let (gsym, qsym) = (graph.get_symbol(node), seq[qpos]);
                graph_chars.push(gsym);
                aln_chars.push(if gsym == qsym { b'|' } else { b'*' });
                query_chars.push(qsym);
            },
            (Some(node), None) => {
                graph_chars.push(graph.get_symbol(node));
                aln_chars.push(b' ');
                query_chars.push(b'-');
            },
            (None, Some(qpos)) => {
                graph_chars.push(b'-');
                aln_chars.push(b' ');
                query_chars.push(seq[qpos]);
            },
            (None, None) => ()
        }
    }

    format!(
        "{}\n{}\n{}",
        String::from_utf8_lossy(&graph_chars),
        String::from_utf8_lossy(&aln_chars),
        String::from_utf8_lossy(&query_chars),
    )
}
