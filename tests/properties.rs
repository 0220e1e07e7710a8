//! Property-based tests for the graph engine.
//!
//! Random DAGs for the topological sorter, and random read sets for the
//! sort, align and merge cycle of a window.

use proptest::prelude::*;

use batchpoa::aligner::PoaAligner;
use batchpoa::graphs::poa::POAGraph;
use batchpoa::graphs::toposort::topological_sort;
use batchpoa::graphs::{AlignableGraph, NodeId};
use batchpoa::{Window, WindowConfig, WindowLimits};

fn dag_limits() -> WindowLimits {
    WindowLimits { max_nodes: 64, max_out_edges: 128, max_in_edges: 128, ..WindowLimits::default() }
}

/// A DAG on `n` nodes whose node ids are shuffled with respect to a valid order,
/// so the sorter can't rely on ids being sorted already.
fn random_dag() -> impl Strategy<Value = POAGraph> {
    (1usize..40)
        .prop_flat_map(|n| {
            let perm = Just((0..n as NodeId).collect::<Vec<_>>()).prop_shuffle();
            let edges = prop::collection::vec((0..n, 0..n), 0..80);
            (Just(n), perm, edges)
        })
        .prop_map(|(n, perm, edges)| {
            let symbols = vec![b'A'; n];
            let edges: Vec<_> = edges.into_iter()
                .filter(|(a, b)| a != b)
                .map(|(a, b)| (perm[a.min(b)], perm[a.max(b)]))
                .collect();

            POAGraph::from_edges(dag_limits(), &symbols, &edges).unwrap()
        })
}

fn read() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(b"ACGT".to_vec()), 1..24)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every edge points forward in the order, and the rank map is the inverse of the order.
    #[test]
    fn topological_order_is_valid(graph in random_dag()) {
        let order = topological_sort(&graph).unwrap();
        prop_assert_eq!(order.len(), graph.node_count());

        for node in graph.all_nodes() {
            prop_assert_eq!(order.node_at(order.rank(node)), node);

            for succ in graph.successors(node) {
                prop_assert!(order.rank(node) < order.rank(succ));
            }
        }
    }

    /// Sorting the same graph, or an identical copy of it, gives the same order.
    #[test]
    fn topological_order_is_deterministic(graph in random_dag()) {
        let first = topological_sort(&graph).unwrap();
        let second = topological_sort(&graph.clone()).unwrap();

        prop_assert_eq!(first, second);
    }

    /// The traceback visits every read position once, in order, and the graph
    /// nodes along it in increasing rank. Merging keeps the graph acyclic.
    #[test]
    fn merged_reads_keep_graph_valid(reads in prop::collection::vec(read(), 1..8)) {
        let config = WindowConfig::default();
        let mut graph = POAGraph::new(config.limits);
        let mut aligner = PoaAligner::new(&config);

        for read in &reads {
            let order = topological_sort(&graph).unwrap();
            let result = aligner.align(&graph, &order, read).unwrap();

            prop_assert!(result.score <= 8 * read.len() as i32);

            let qpos: Vec<_> = result.forward().filter_map(|p| p.qpos).collect();
            prop_assert_eq!(qpos, (0..read.len()).collect::<Vec<_>>());

            let ranks: Vec<_> = result.forward().filter_map(|p| p.node).map(|n| order.rank(n)).collect();
            prop_assert!(ranks.windows(2).all(|w| w[0] < w[1]));

            let nodes_before = graph.node_count();
            graph.add_alignment(&order, read, &result.traceback).unwrap();
            prop_assert!(graph.node_count() <= nodes_before + read.len());
        }

        let order = topological_sort(&graph).unwrap();
        prop_assert_eq!(order.len(), graph.node_count());

        for node in graph.all_nodes() {
            for other in graph.aligned_nodes(node) {
                prop_assert!(graph.is_aligned(*other, node));
                prop_assert_ne!(*other, node);
            }
        }
    }

    /// A read that is already fully represented adds no nodes.
    #[test]
    fn repeated_read_is_absorbed(read in read(), copies in 2usize..6) {
        let mut window = Window::new(WindowConfig::default()).unwrap();

        window.add_read(&read).unwrap();
        for _ in 1..copies {
            let result = window.add_read(&read).unwrap();
            prop_assert_eq!(result.score, 8 * read.len() as i32);
        }

        prop_assert_eq!(window.graph().node_count(), read.len());
        prop_assert_eq!(window.num_reads(), copies);
        for node in window.graph().all_nodes() {
            prop_assert_eq!(window.graph().coverage(node), copies as u32);
        }
    }
}
