//! Centrality measures.
//!
//! - Amount-weighted PageRank (power iteration with teleport)
//! - Weighted betweenness centrality (Brandes with Dijkstra), sampled for
//!   large graphs

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use muleflow_core::config::DetectionConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::graph::TransactionGraph;

// ============================================================================
// PageRank
// ============================================================================

/// Outcome of a PageRank run.
#[derive(Debug, Clone)]
pub struct PagerankResult {
    /// Stationary probability per node, summing to 1.
    pub scores: Vec<f64>,
    /// Iterations performed.
    pub iterations: u32,
    /// Whether the max per-node delta fell below tolerance.
    pub converged: bool,
}

/// PageRank of a random walk following out-edges with probability
/// proportional to edge amount.
///
/// Dangling nodes (no outgoing amount) redistribute uniformly. When the
/// iteration cap is hit first the last iterate is returned with
/// `converged = false`.
#[must_use]
pub fn pagerank(graph: &TransactionGraph, config: &DetectionConfig) -> PagerankResult {
    let n = graph.node_count();
    if n == 0 {
        return PagerankResult {
            scores: Vec::new(),
            iterations: 0,
            converged: true,
        };
    }

    let damping = config.pagerank_damping;
    let teleport = (1.0 - damping) / n as f64;

    let mut out_weight = vec![0.0f64; n];
    for edge in graph.edges() {
        out_weight[edge.source] += edge.total_amount;
    }

    let mut scores = vec![1.0 / n as f64; n];
    let mut next = vec![0.0f64; n];
    let mut iterations = 0;
    let mut converged = false;

    for _ in 0..config.pagerank_max_iter {
        iterations += 1;

        let dangling_mass: f64 = (0..n)
            .filter(|&u| out_weight[u] <= 0.0)
            .map(|u| scores[u])
            .sum();
        let base = teleport + damping * dangling_mass / n as f64;
        next.iter_mut().for_each(|x| *x = base);

        for edge in graph.edges() {
            if out_weight[edge.source] > 0.0 {
                next[edge.target] +=
                    damping * scores[edge.source] * edge.total_amount / out_weight[edge.source];
            }
        }

        let max_delta = scores
            .iter()
            .zip(next.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f64, f64::max);

        std::mem::swap(&mut scores, &mut next);

        if max_delta < config.pagerank_tol {
            converged = true;
            break;
        }
    }

    PagerankResult {
        scores,
        iterations,
        converged,
    }
}

// ============================================================================
// Betweenness centrality
// ============================================================================

#[derive(Debug, PartialEq)]
struct HeapEntry {
    dist: f64,
    node: usize,
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on distance, then node index for determinism.
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Weighted betweenness centrality with edge length `1 / total_amount`, so
/// higher-value edges are shorter.
///
/// Above the configured node threshold the computation samples source nodes
/// from a seeded generator and rescales. Unreachable pairs contribute zero.
#[must_use]
pub fn betweenness(graph: &TransactionGraph, config: &DetectionConfig) -> Vec<f64> {
    let n = graph.node_count();
    let mut centrality = vec![0.0f64; n];
    if n <= 2 {
        return centrality;
    }

    let sampled = n > config.betweenness_sample_threshold_nodes;
    let sources: Vec<usize> = if sampled {
        let k = config.betweenness_sample_k.min(n);
        let mut rng = StdRng::seed_from_u64(config.betweenness_seed);
        let mut picked = rand::seq::index::sample(&mut rng, n, k).into_vec();
        picked.sort_unstable();
        picked
    } else {
        (0..n).collect()
    };
    let source_count = sources.len();

    for &s in &sources {
        single_source_accumulate(graph, s, &mut centrality);
    }

    // Rescale sampled estimates, then normalize like the exact computation.
    let sample_scale = if sampled {
        n as f64 / source_count as f64
    } else {
        1.0
    };
    let normalize = 1.0 / ((n - 1) as f64 * (n - 2) as f64);
    for value in &mut centrality {
        *value *= sample_scale * normalize;
    }

    centrality
}

/// One Brandes source: Dijkstra forward pass, dependency accumulation back.
fn single_source_accumulate(graph: &TransactionGraph, s: usize, centrality: &mut [f64]) {
    let n = graph.node_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut sigma = vec![0.0f64; n];
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut settled = Vec::with_capacity(n);
    let mut done = vec![false; n];

    dist[s] = 0.0;
    sigma[s] = 1.0;

    let mut heap = BinaryHeap::new();
    heap.push(HeapEntry { dist: 0.0, node: s });

    while let Some(HeapEntry { dist: d, node: v }) = heap.pop() {
        if done[v] {
            continue;
        }
        done[v] = true;
        settled.push(v);

        for &(w, edge_idx) in graph.out_neighbors(v) {
            if w == v {
                continue;
            }
            let amount = graph.edge(edge_idx).total_amount;
            if amount <= 0.0 {
                continue;
            }
            let length = 1.0 / amount;
            let candidate = d + length;

            if candidate < dist[w] {
                dist[w] = candidate;
                sigma[w] = sigma[v];
                preds[w].clear();
                preds[w].push(v);
                heap.push(HeapEntry {
                    dist: candidate,
                    node: w,
                });
            } else if candidate == dist[w] {
                sigma[w] += sigma[v];
                preds[w].push(v);
            }
        }
    }

    let mut delta = vec![0.0f64; n];
    for &w in settled.iter().rev() {
        for &v in &preds[w] {
            delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
        }
        if w != s {
            centrality[w] += delta[w];
        }
    }
}
