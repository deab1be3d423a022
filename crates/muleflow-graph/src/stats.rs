//! Graph-level statistics for embedding services.

use serde::Serialize;

use crate::graph::{round2, TransactionGraph};

/// High-level statistics about a transaction graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    /// Number of accounts.
    pub total_nodes: usize,
    /// Number of aggregated edges.
    pub total_edges: usize,
    /// Sum of all edge amounts.
    pub total_volume: f64,
    /// Mean aggregated edge amount.
    pub avg_edge_amount: f64,
    /// Edge count over the maximum possible for the node count.
    pub density: f64,
    /// Number of weakly connected components.
    pub weakly_connected_components: usize,
}

impl GraphStats {
    /// Compute statistics for a graph.
    #[must_use]
    pub fn compute(graph: &TransactionGraph) -> Self {
        let n = graph.node_count();
        let e = graph.edge_count();
        let total_volume: f64 = graph.edges().iter().map(|edge| edge.total_amount).sum();

        let density = if n > 1 {
            e as f64 / (n as f64 * (n - 1) as f64)
        } else {
            0.0
        };

        Self {
            total_nodes: n,
            total_edges: e,
            total_volume: round2(total_volume),
            avg_edge_amount: if e > 0 { round2(total_volume / e as f64) } else { 0.0 },
            density,
            weakly_connected_components: weak_components(graph),
        }
    }
}

/// Count weakly connected components with a union-find over all edges.
fn weak_components(graph: &TransactionGraph) -> usize {
    let n = graph.node_count();
    let mut parent: Vec<usize> = (0..n).collect();

    fn find(parent: &mut [usize], x: usize) -> usize {
        let mut root = x;
        while parent[root] != root {
            root = parent[root];
        }
        let mut cursor = x;
        while parent[cursor] != root {
            let next = parent[cursor];
            parent[cursor] = root;
            cursor = next;
        }
        root
    }

    for edge in graph.edges() {
        let a = find(&mut parent, edge.source);
        let b = find(&mut parent, edge.target);
        if a != b {
            parent[a.max(b)] = a.min(b);
        }
    }

    (0..n).filter(|&x| find(&mut parent, x) == x).count()
}
