pub mod graph;
pub mod fasta;

pub use graph::{save_graph, load_graph, graph_to_dot};
pub use fasta::{read_fasta, read_fasta_file, SequenceRecord};
