//! Bounded simple-cycle enumeration.
//!
//! Cycles of length 3 up to the configured bound are enumerated by a DFS
//! rooted at each node in ascending index order, restricted to nodes with an
//! index at or above the root. Every cycle is therefore discovered exactly
//! once, already rotated so its minimum-index member comes first; the
//! reverse orientation of a cycle is a distinct member tuple and a distinct
//! cycle. Self-loops and 2-cycles never count.

use muleflow_core::config::DetectionConfig;

use crate::graph::TransactionGraph;

/// One enumerated cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleRecord {
    /// Arena index, used as the cycle identifier.
    pub id: usize,
    /// Member node indices, minimum-index member first, following edge
    /// direction.
    pub members: Vec<usize>,
    /// Largest aggregated amount on any edge of the cycle.
    pub max_edge_amount: f64,
}

/// All enumerated cycles plus per-node membership.
#[derive(Debug, Clone, Default)]
pub struct CycleSet {
    /// Cycle arena in discovery order.
    pub cycles: Vec<CycleRecord>,
    /// Cycle ids per node index.
    pub memberships: Vec<Vec<usize>>,
    /// True when enumeration stopped at the global cap.
    pub truncated: bool,
}

impl CycleSet {
    /// Whether a node participates in any cycle.
    #[must_use]
    pub fn in_cycle(&self, node: usize) -> bool {
        !self.memberships[node].is_empty()
    }

    /// Largest edge amount over all cycles a node participates in.
    #[must_use]
    pub fn max_edge_amount(&self, node: usize) -> f64 {
        self.memberships[node]
            .iter()
            .map(|&id| self.cycles[id].max_edge_amount)
            .fold(0.0, f64::max)
    }
}

/// Enumerate simple directed cycles up to the configured length bound,
/// stopping at the global cap.
#[must_use]
pub fn enumerate_cycles(graph: &TransactionGraph, config: &DetectionConfig) -> CycleSet {
    let n = graph.node_count();
    let mut set = CycleSet {
        cycles: Vec::new(),
        memberships: vec![Vec::new(); n],
        truncated: false,
    };

    let mut path = Vec::with_capacity(config.cycle_length_bound);
    let mut on_path = vec![false; n];

    for root in 0..n {
        if set.truncated {
            break;
        }
        path.push(root);
        on_path[root] = true;
        dfs(graph, config, root, root, &mut path, &mut on_path, &mut set);
        on_path[root] = false;
        path.pop();
    }

    if set.truncated {
        tracing::warn!(cap = config.cycle_cap, "cycle enumeration cap reached");
    } else {
        tracing::debug!(cycles = set.cycles.len(), "cycle enumeration complete");
    }
    set
}

fn dfs(
    graph: &TransactionGraph,
    config: &DetectionConfig,
    root: usize,
    node: usize,
    path: &mut Vec<usize>,
    on_path: &mut [bool],
    set: &mut CycleSet,
) {
    for &(next, _) in graph.out_neighbors(node) {
        if set.truncated {
            return;
        }
        if next == node {
            continue;
        }
        if next == root {
            if path.len() >= 3 {
                record_cycle(graph, path, set);
                if set.cycles.len() >= config.cycle_cap {
                    set.truncated = true;
                    return;
                }
            }
            continue;
        }
        if next > root && !on_path[next] && path.len() < config.cycle_length_bound {
            path.push(next);
            on_path[next] = true;
            dfs(graph, config, root, next, path, on_path, set);
            on_path[next] = false;
            path.pop();
        }
    }
}

fn record_cycle(graph: &TransactionGraph, path: &[usize], set: &mut CycleSet) {
    let id = set.cycles.len();
    let mut max_edge_amount = 0.0f64;
    for i in 0..path.len() {
        let u = path[i];
        let v = path[(i + 1) % path.len()];
        if let Some(edge) = graph.edge_between(u, v) {
            max_edge_amount = max_edge_amount.max(edge.total_amount);
        }
    }
    for &member in path {
        set.memberships[member].push(id);
    }
    set.cycles.push(CycleRecord {
        id,
        members: path.to_vec(),
        max_edge_amount,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use muleflow_core::model::Transaction;

    fn tx(sender: &str, receiver: &str, amount: f64, offset: i64) -> Transaction {
        Transaction::new(
            sender,
            receiver,
            amount,
            Utc.timestamp_opt(1_700_000_000 + offset, 0).unwrap(),
        )
    }

    fn build(rows: &[Transaction]) -> TransactionGraph {
        TransactionGraph::build(rows).unwrap()
    }

    #[test]
    fn test_triangle_found_once_min_rotated() {
        let graph = build(&[
            tx("B", "C", 500.0, 0),
            tx("C", "A", 500.0, 1),
            tx("A", "B", 500.0, 2),
        ]);
        let set = enumerate_cycles(&graph, &DetectionConfig::default());

        assert_eq!(set.cycles.len(), 1);
        let a = graph.node_index("A").unwrap();
        assert_eq!(set.cycles[0].members[0], a, "rotation starts at minimum id");
        assert_eq!(set.cycles[0].max_edge_amount, 500.0);
        assert!(set.in_cycle(a));
        assert!(!set.truncated);
    }

    #[test]
    fn test_reverse_cycle_is_distinct() {
        let graph = build(&[
            tx("A", "B", 100.0, 0),
            tx("B", "C", 100.0, 1),
            tx("C", "A", 100.0, 2),
            tx("A", "C", 100.0, 3),
            tx("C", "B", 100.0, 4),
            tx("B", "A", 100.0, 5),
        ]);
        let set = enumerate_cycles(&graph, &DetectionConfig::default());
        let three_cycles: Vec<_> = set.cycles.iter().filter(|c| c.members.len() == 3).collect();
        assert_eq!(three_cycles.len(), 2);
        assert_ne!(three_cycles[0].members, three_cycles[1].members);
    }

    #[test]
    fn test_two_cycles_and_self_loops_ignored() {
        let graph = build(&[
            tx("A", "B", 100.0, 0),
            tx("B", "A", 100.0, 1),
            tx("A", "A", 100.0, 2),
        ]);
        let set = enumerate_cycles(&graph, &DetectionConfig::default());
        assert!(set.cycles.is_empty());
    }

    #[test]
    fn test_length_bound_respected() {
        // Single 6-cycle, above the default bound of 5.
        let ids = ["A", "B", "C", "D", "E", "F"];
        let rows: Vec<Transaction> = (0..6)
            .map(|i| tx(ids[i], ids[(i + 1) % 6], 100.0, i as i64))
            .collect();
        let graph = build(&rows);

        let set = enumerate_cycles(&graph, &DetectionConfig::default());
        assert!(set.cycles.is_empty());

        let set = enumerate_cycles(
            &graph,
            &DetectionConfig::default().with_cycle_bounds(6, 500),
        );
        assert_eq!(set.cycles.len(), 1);
    }

    #[test]
    fn test_cap_sets_truncated() {
        // Complete directed graph on 6 nodes has far more than 4 cycles.
        let ids = ["A", "B", "C", "D", "E", "F"];
        let mut rows = Vec::new();
        let mut offset = 0;
        for u in ids {
            for v in ids {
                if u != v {
                    rows.push(tx(u, v, 100.0, offset));
                    offset += 1;
                }
            }
        }
        let graph = build(&rows);
        let set = enumerate_cycles(
            &graph,
            &DetectionConfig::default().with_cycle_bounds(5, 4),
        );
        assert!(set.truncated);
        assert_eq!(set.cycles.len(), 4);
    }

    #[test]
    fn test_shared_member_accumulates_memberships() {
        let graph = build(&[
            tx("A", "B", 5_000.0, 0),
            tx("B", "C", 5_000.0, 1),
            tx("C", "A", 5_000.0, 2),
            tx("A", "D", 5_000.0, 3),
            tx("D", "E", 5_000.0, 4),
            tx("E", "A", 5_000.0, 5),
        ]);
        let set = enumerate_cycles(&graph, &DetectionConfig::default());
        assert_eq!(set.cycles.len(), 2);
        let a = graph.node_index("A").unwrap();
        assert_eq!(set.memberships[a].len(), 2);
        let b = graph.node_index("B").unwrap();
        assert_eq!(set.memberships[b].len(), 1);
        assert_eq!(set.max_edge_amount(a), 5_000.0);
    }
}
