//! Fraud-ring assembly.
//!
//! Flagged accounts are grouped into rings two ways: cycles that share a
//! flagged member merge into a single cycle ring (union-find), and each
//! community with at least two leftover flagged members becomes a community
//! ring. Cycle membership wins over community membership. Ring identifiers
//! are assigned in emission order, cycle rings first, each category ordered
//! by its minimum member identifier.

use std::collections::BTreeMap;

use muleflow_core::model::{AccountScore, FraudRing, RingPatternType};
use muleflow_graph::features::FeatureBundle;
use muleflow_graph::graph::TransactionGraph;

/// Round to two decimal places for serialized aggregates.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cursor = x;
        while self.parent[cursor] != root {
            let next = self.parent[cursor];
            self.parent[cursor] = root;
            cursor = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            // Smaller index wins so group roots are order-stable.
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}

/// Assemble rings and write `ring_id` back onto the member scores.
///
/// `scores` must be indexed like the graph's nodes.
#[must_use]
pub fn assemble_rings(
    graph: &TransactionGraph,
    bundle: &FeatureBundle,
    scores: &mut [AccountScore],
    flag_threshold: f64,
) -> Vec<FraudRing> {
    let n = graph.node_count();
    let flagged: Vec<bool> = scores
        .iter()
        .map(|score| score.suspicion_score >= flag_threshold)
        .collect();

    // Overlapping cycles collapse into one ring.
    let mut uf = UnionFind::new(n);
    let mut in_cycle_ring = vec![false; n];
    for cycle in &bundle.cycles {
        let members: Vec<usize> = cycle
            .members
            .iter()
            .copied()
            .filter(|&m| flagged[m])
            .collect();
        if members.len() < 2 {
            continue;
        }
        for &member in &members {
            in_cycle_ring[member] = true;
            uf.union(members[0], member);
        }
    }

    let mut cycle_groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for node in 0..n {
        if in_cycle_ring[node] {
            cycle_groups.entry(uf.find(node)).or_default().push(node);
        }
    }

    // Communities pick up flagged accounts not already in a cycle ring.
    let mut community_groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for node in 0..n {
        if !flagged[node] || in_cycle_ring[node] {
            continue;
        }
        if let Some(community) = bundle.nodes[node].community_id {
            community_groups.entry(community).or_default().push(node);
        }
    }

    let mut rings = Vec::new();
    let mut counter = 0;

    // BTreeMap keys are group minima (union-find roots point to the smallest
    // member), so emission order is already stable by minimum member id.
    for members in cycle_groups.into_values() {
        counter += 1;
        rings.push(build_ring(
            graph,
            scores,
            members,
            RingPatternType::Cycle,
            counter,
        ));
    }

    let mut community_rings: Vec<Vec<usize>> = community_groups
        .into_values()
        .filter(|members| members.len() >= 2)
        .collect();
    community_rings.sort_by_key(|members| members[0]);
    for members in community_rings {
        counter += 1;
        rings.push(build_ring(
            graph,
            scores,
            members,
            RingPatternType::Community,
            counter,
        ));
    }

    tracing::info!(rings = rings.len(), "fraud ring assembly complete");
    rings
}

fn build_ring(
    graph: &TransactionGraph,
    scores: &mut [AccountScore],
    members: Vec<usize>,
    pattern_type: RingPatternType,
    counter: usize,
) -> FraudRing {
    let ring_id = format!("RING_{counter:03}");

    let mean_score =
        members.iter().map(|&m| scores[m].suspicion_score).sum::<f64>() / members.len() as f64;

    let total_amount: f64 = graph
        .edges()
        .iter()
        .filter(|edge| members.contains(&edge.source) && members.contains(&edge.target))
        .map(|edge| edge.total_amount)
        .sum();

    for &member in &members {
        scores[member].ring_id = Some(ring_id.clone());
    }

    FraudRing {
        ring_id,
        member_accounts: members
            .iter()
            .map(|&m| graph.node_id(m).to_string())
            .collect(),
        pattern_type,
        risk_score: round2(mean_score),
        total_amount: round2(total_amount),
    }
}
