//! Shell-chain detection.
//!
//! A shell candidate is a pass-through account with a total distinct degree
//! between 2 and the configured maximum and at least one edge in each
//! direction. The candidate is flagged when a forwarding chain of the
//! configured minimum depth runs through it; the walk extends through other
//! low-degree candidates only, while chain endpoints may be any account.

use muleflow_core::config::DetectionConfig;

use crate::graph::TransactionGraph;

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

/// Flag shell-chain intermediaries.
#[must_use]
pub fn detect_shell_accounts(graph: &TransactionGraph, config: &DetectionConfig) -> Vec<bool> {
    let n = graph.node_count();

    let candidate: Vec<bool> = (0..n)
        .map(|node| {
            let in_deg = graph.in_degree(node);
            let out_deg = graph.out_degree(node);
            let total = in_deg + out_deg;
            (2..=config.shell_max_degree).contains(&total) && in_deg >= 1 && out_deg >= 1
        })
        .collect();

    let limit = config.shell_min_chain_depth;
    let mut flags = vec![false; n];
    let mut visited = vec![false; n];

    for node in 0..n {
        if !candidate[node] {
            continue;
        }
        visited[node] = true;
        let forward = walk_depth(graph, &candidate, node, Direction::Forward, limit, &mut visited);
        let backward = walk_depth(
            graph,
            &candidate,
            node,
            Direction::Backward,
            limit,
            &mut visited,
        );
        visited[node] = false;

        flags[node] = forward + backward >= config.shell_min_chain_depth;
    }

    let flagged = flags.iter().filter(|&&f| f).count();
    tracing::debug!(shell_accounts = flagged, "shell chain detection complete");
    flags
}

/// Longest chain (in edges) leaving `node` in one direction, passing only
/// through candidate intermediaries, capped at `remaining`.
fn walk_depth(
    graph: &TransactionGraph,
    candidate: &[bool],
    node: usize,
    direction: Direction,
    remaining: usize,
    visited: &mut [bool],
) -> usize {
    if remaining == 0 {
        return 0;
    }
    let neighbors = match direction {
        Direction::Forward => graph.out_neighbors(node),
        Direction::Backward => graph.in_neighbors(node),
    };

    let mut best = 0;
    for &(next, _) in neighbors {
        if next == node || visited[next] {
            continue;
        }
        let mut depth = 1;
        if candidate[next] {
            visited[next] = true;
            depth += walk_depth(graph, candidate, next, direction, remaining - 1, visited);
            visited[next] = false;
        }
        best = best.max(depth.min(remaining));
    }
    best
}
