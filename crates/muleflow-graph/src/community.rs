//! Louvain community detection.
//!
//! The directed graph is projected to an undirected one (antiparallel edges
//! collapse to a single edge carrying the sum of both directions), then
//! modularity is greedily maximized with the usual two phases: local moves
//! in ascending node order, followed by community aggregation. A pass whose
//! total modularity gain falls below `GAIN_THRESHOLD` ends the level.
//! Singleton communities are reported as `None` to avoid false grouping.

use std::collections::BTreeMap;

use crate::graph::TransactionGraph;

/// Minimum modularity gain for a pass to keep optimizing.
const GAIN_THRESHOLD: f64 = 1e-4;

/// Undirected weighted graph for one Louvain level.
struct LevelGraph {
    /// Neighbor lists without self entries, ascending by neighbor.
    adj: Vec<Vec<(usize, f64)>>,
    /// Self-loop weight per node.
    loops: Vec<f64>,
    /// Weighted degree per node (self-loops count twice).
    degree: Vec<f64>,
    /// Total edge weight (self-loops count once).
    total_weight: f64,
}

impl LevelGraph {
    fn from_edges(n: usize, edges: &BTreeMap<(usize, usize), f64>) -> Self {
        let mut adj = vec![Vec::new(); n];
        let mut loops = vec![0.0; n];
        for (&(u, v), &w) in edges {
            if u == v {
                loops[u] += w;
            } else {
                adj[u].push((v, w));
                adj[v].push((u, w));
            }
        }
        for list in &mut adj {
            list.sort_unstable_by_key(|&(v, _)| v);
        }
        let degree: Vec<f64> = (0..n)
            .map(|u| adj[u].iter().map(|&(_, w)| w).sum::<f64>() + 2.0 * loops[u])
            .collect();
        let total_weight = edges.values().sum();
        Self {
            adj,
            loops,
            degree,
            total_weight,
        }
    }

    fn node_count(&self) -> usize {
        self.adj.len()
    }
}

/// Assign a community id to every node, `None` for singletons.
#[must_use]
pub fn louvain_communities(graph: &TransactionGraph) -> Vec<Option<usize>> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }

    let mut projected: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for edge in graph.edges() {
        let key = if edge.source <= edge.target {
            (edge.source, edge.target)
        } else {
            (edge.target, edge.source)
        };
        *projected.entry(key).or_insert(0.0) += edge.total_amount;
    }

    let mut level = LevelGraph::from_edges(n, &projected);
    if level.total_weight <= 0.0 {
        return vec![None; n];
    }

    // assignment[v] = community of original node v at the current level.
    let mut assignment: Vec<usize> = (0..n).collect();

    loop {
        let (membership, moved) = local_phase(&level);
        if !moved {
            break;
        }

        let (renumbered, community_count) = compact(&membership);
        for slot in &mut assignment {
            *slot = renumbered[*slot];
        }
        if community_count == level.node_count() {
            break;
        }
        level = aggregate(&level, &renumbered, community_count);
    }

    finalize(&assignment)
}

/// Greedy local moves until a full pass gains less than the threshold.
/// Returns the membership and whether any node moved at all.
fn local_phase(level: &LevelGraph) -> (Vec<usize>, bool) {
    let n = level.node_count();
    let m = level.total_weight;
    let two_m_sq = 2.0 * m * m;

    let mut community: Vec<usize> = (0..n).collect();
    let mut tot: Vec<f64> = level.degree.clone();
    let mut moved_any = false;

    loop {
        let mut pass_gain = 0.0;

        for i in 0..n {
            let current = community[i];
            let k_i = level.degree[i];

            let mut links: BTreeMap<usize, f64> = BTreeMap::new();
            for &(j, w) in &level.adj[i] {
                *links.entry(community[j]).or_insert(0.0) += w;
            }

            tot[current] -= k_i;
            let stay_gain =
                links.get(&current).copied().unwrap_or(0.0) / m - tot[current] * k_i / two_m_sq;

            let mut best_community = current;
            let mut best_gain = stay_gain;
            for (&candidate, &w_ic) in &links {
                if candidate == current {
                    continue;
                }
                let gain = w_ic / m - tot[candidate] * k_i / two_m_sq;
                if gain > best_gain {
                    best_gain = gain;
                    best_community = candidate;
                }
            }

            if best_community != current {
                pass_gain += best_gain - stay_gain;
                moved_any = true;
            }
            community[i] = best_community;
            tot[best_community] += k_i;
        }

        if pass_gain < GAIN_THRESHOLD {
            break;
        }
    }

    (community, moved_any)
}

/// Renumber community labels densely, in order of first appearance over
/// ascending node index. Returns the mapping and the community count.
fn compact(membership: &[usize]) -> (Vec<usize>, usize) {
    let mut remap: BTreeMap<usize, usize> = BTreeMap::new();
    let mut next = 0;
    let mut renumbered = vec![0; membership.len()];
    for (i, &label) in membership.iter().enumerate() {
        let id = *remap.entry(label).or_insert_with(|| {
            let id = next;
            next += 1;
            id
        });
        renumbered[i] = id;
    }
    (renumbered, next)
}

/// Collapse communities into super-nodes for the next level.
fn aggregate(level: &LevelGraph, membership: &[usize], community_count: usize) -> LevelGraph {
    let mut edges: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for u in 0..level.node_count() {
        let cu = membership[u];
        if level.loops[u] > 0.0 {
            *edges.entry((cu, cu)).or_insert(0.0) += level.loops[u];
        }
        for &(v, w) in &level.adj[u] {
            if v < u {
                continue;
            }
            let cv = membership[v];
            let key = if cu <= cv { (cu, cv) } else { (cv, cu) };
            *edges.entry(key).or_insert(0.0) += w;
        }
    }
    LevelGraph::from_edges(community_count, &edges)
}

/// Compact final labels over ascending node index; singletons become `None`.
fn finalize(assignment: &[usize]) -> Vec<Option<usize>> {
    let mut sizes: BTreeMap<usize, usize> = BTreeMap::new();
    for &label in assignment {
        *sizes.entry(label).or_insert(0) += 1;
    }

    let mut remap: BTreeMap<usize, usize> = BTreeMap::new();
    let mut next = 0;
    assignment
        .iter()
        .map(|label| {
            if sizes[label] <= 1 {
                return None;
            }
            let id = *remap.entry(*label).or_insert_with(|| {
                let id = next;
                next += 1;
                id
            });
            Some(id)
        })
        .collect()
}
