//! Per-node feature records and the extraction entry point.
//!
//! Every account gets a fully populated [`NodeFeatures`] record after
//! extraction; no feature is optional except community membership, which is
//! `None` for singletons.

use muleflow_core::config::DetectionConfig;

use crate::centrality::{betweenness, pagerank};
use crate::community::louvain_communities;
use crate::cycles::{enumerate_cycles, CycleRecord};
use crate::graph::TransactionGraph;
use crate::shell::detect_shell_accounts;
use crate::temporal::detect_temporal;

/// All extracted features for one account.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeFeatures {
    /// Distinct in-counterparties.
    pub in_degree: usize,
    /// Distinct out-counterparties.
    pub out_degree: usize,
    /// Sum of incoming edge amounts.
    pub total_in_amount: f64,
    /// Sum of outgoing edge amounts.
    pub total_out_amount: f64,
    /// Amount-weighted PageRank.
    pub pagerank: f64,
    /// Weighted betweenness centrality.
    pub betweenness: f64,
    /// Community id, `None` for singletons.
    pub community_id: Option<usize>,
    /// Whether the account participates in any enumerated cycle.
    pub in_cycle: bool,
    /// Ids of the cycles the account participates in.
    pub cycle_memberships: Vec<usize>,
    /// Largest edge amount over the account's cycles.
    pub max_cycle_edge_amount: f64,
    /// Many distinct senders, few distinct receivers.
    pub fan_in_flag: bool,
    /// Many distinct receivers, few distinct senders.
    pub fan_out_flag: bool,
    /// Distinct-counterparty window threshold reached.
    pub smurf_flag: bool,
    /// Low-degree forwarding-chain intermediary.
    pub shell_flag: bool,
    /// Transaction burst above the per-window threshold.
    pub velocity_flag: bool,
    /// Fraction of recipients that forward funds onward.
    pub forwarding_ratio: f64,
}

/// Feature extraction output for a whole graph.
#[derive(Debug, Clone)]
pub struct FeatureBundle {
    /// Per-node features, indexed like the graph's nodes.
    pub nodes: Vec<NodeFeatures>,
    /// Enumerated cycle arena.
    pub cycles: Vec<CycleRecord>,
    /// True when cycle enumeration hit its cap.
    pub cycles_truncated: bool,
    /// False when PageRank returned its last iterate without converging.
    pub pagerank_converged: bool,
    /// Network mean PageRank.
    pub pagerank_mean: f64,
    /// Network mean betweenness.
    pub betweenness_mean: f64,
}

/// Run every extractor and assemble the feature bundle.
#[must_use]
pub fn extract_features(graph: &TransactionGraph, config: &DetectionConfig) -> FeatureBundle {
    let n = graph.node_count();
    tracing::info!(
        nodes = n,
        edges = graph.edge_count(),
        "extracting graph features"
    );

    let pr = pagerank(graph, config);
    if !pr.converged {
        tracing::warn!(
            iterations = pr.iterations,
            "pagerank did not converge; using last iterate"
        );
    }
    let bt = betweenness(graph, config);
    let cycles = enumerate_cycles(graph, config);
    let communities = louvain_communities(graph);
    let temporal = detect_temporal(graph, config);
    let shell = detect_shell_accounts(graph, config);

    let mut nodes = Vec::with_capacity(n);
    for node in 0..n {
        let in_degree = graph.in_degree(node);
        let out_degree = graph.out_degree(node);

        let total_in_amount: f64 = graph
            .in_neighbors(node)
            .iter()
            .map(|&(_, e)| graph.edge(e).total_amount)
            .sum();
        let total_out_amount: f64 = graph
            .out_neighbors(node)
            .iter()
            .map(|&(_, e)| graph.edge(e).total_amount)
            .sum();

        let forwarding_ratio = forwarding_ratio(graph, node);

        nodes.push(NodeFeatures {
            in_degree,
            out_degree,
            total_in_amount,
            total_out_amount,
            pagerank: pr.scores[node],
            betweenness: bt[node],
            community_id: communities[node],
            in_cycle: cycles.in_cycle(node),
            cycle_memberships: cycles.memberships[node].clone(),
            max_cycle_edge_amount: cycles.max_edge_amount(node),
            fan_in_flag: in_degree >= config.fan_in_min_in && out_degree <= config.fan_in_max_out,
            fan_out_flag: out_degree >= config.fan_out_min_out
                && in_degree <= config.fan_out_max_in,
            smurf_flag: temporal.smurf[node],
            shell_flag: shell[node],
            velocity_flag: temporal.velocity[node],
            forwarding_ratio,
        });
    }

    let pagerank_mean = mean(nodes.iter().map(|f| f.pagerank));
    let betweenness_mean = mean(nodes.iter().map(|f| f.betweenness));

    tracing::info!(
        fan_in = nodes.iter().filter(|f| f.fan_in_flag).count(),
        fan_out = nodes.iter().filter(|f| f.fan_out_flag).count(),
        cycles = cycles.cycles.len(),
        smurfing = nodes.iter().filter(|f| f.smurf_flag).count(),
        shells = nodes.iter().filter(|f| f.shell_flag).count(),
        "feature extraction complete"
    );

    FeatureBundle {
        nodes,
        cycles: cycles.cycles,
        cycles_truncated: cycles.truncated,
        pagerank_converged: pr.converged,
        pagerank_mean,
        betweenness_mean,
    }
}

/// Fraction of a node's distinct recipients that forward funds onward.
fn forwarding_ratio(graph: &TransactionGraph, node: usize) -> f64 {
    let recipients: Vec<usize> = graph
        .out_neighbors(node)
        .iter()
        .map(|&(next, _)| next)
        .filter(|&next| next != node)
        .collect();
    if recipients.is_empty() {
        return 0.0;
    }
    let forwarding = recipients
        .iter()
        .filter(|&&next| graph.out_degree(next) > 0)
        .count();
    forwarding as f64 / recipients.len() as f64
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
