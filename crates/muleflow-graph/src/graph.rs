//! Transaction graph construction.
//!
//! The builder aggregates raw transfers into one [`EdgeAggregate`] per
//! ordered `(sender, receiver)` pair and indexes nodes in ascending
//! identifier order, so identical batches produce identical graphs
//! regardless of input row order.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use muleflow_core::error::{DetectError, Result};
use muleflow_core::model::{GraphSnapshot, SnapshotLink, SnapshotNode, Transaction};

/// Round to two decimal places for serialized monetary totals.
#[must_use]
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// All transfers between one ordered account pair, coalesced.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeAggregate {
    /// Sender node index.
    pub source: usize,
    /// Receiver node index.
    pub target: usize,
    /// Sum of transfer amounts.
    pub total_amount: f64,
    /// Number of coalesced transfer rows.
    pub transaction_count: u32,
    /// Transfer instants in ascending order.
    pub timestamps: Vec<DateTime<Utc>>,
}

impl EdgeAggregate {
    /// Whether this edge connects an account to itself.
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Directed weighted multigraph of accounts, aggregated per ordered pair.
///
/// Nodes are indexed in ascending identifier order; adjacency lists are
/// ordered by neighbor index. Immutable after construction.
#[derive(Debug, Clone)]
pub struct TransactionGraph {
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    edges: Vec<EdgeAggregate>,
    out_adj: Vec<Vec<(usize, usize)>>,
    in_adj: Vec<Vec<(usize, usize)>>,
}

impl TransactionGraph {
    /// Build a graph from a transaction batch.
    ///
    /// Rejects the whole batch when any record carries an empty account
    /// identifier or a non-finite or negative amount. Self-loops are kept
    /// as edges.
    pub fn build(transactions: &[Transaction]) -> Result<Self> {
        let mut aggregates: BTreeMap<(String, String), (f64, u32, Vec<DateTime<Utc>>)> =
            BTreeMap::new();

        for (row, tx) in transactions.iter().enumerate() {
            let sender = tx.sender.trim();
            let receiver = tx.receiver.trim();
            if sender.is_empty() {
                return Err(DetectError::input(format!("row {row}: missing sender")));
            }
            if receiver.is_empty() {
                return Err(DetectError::input(format!("row {row}: missing receiver")));
            }
            if !tx.amount.is_finite() {
                return Err(DetectError::input(format!(
                    "row {row}: non-finite amount {}",
                    tx.amount
                )));
            }
            if tx.amount < 0.0 {
                return Err(DetectError::input(format!(
                    "row {row}: negative amount {}",
                    tx.amount
                )));
            }

            let entry = aggregates
                .entry((sender.to_string(), receiver.to_string()))
                .or_insert_with(|| (0.0, 0, Vec::new()));
            entry.0 += tx.amount;
            entry.1 += 1;
            entry.2.push(tx.timestamp);
        }

        let mut ids: BTreeSet<&str> = BTreeSet::new();
        for (sender, receiver) in aggregates.keys() {
            ids.insert(sender.as_str());
            ids.insert(receiver.as_str());
        }
        let nodes: Vec<String> = ids.into_iter().map(str::to_string).collect();
        let index: HashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let mut edges = Vec::with_capacity(aggregates.len());
        let mut out_adj = vec![Vec::new(); nodes.len()];
        let mut in_adj = vec![Vec::new(); nodes.len()];

        // BTreeMap iteration is ordered by (sender, receiver), which matches
        // ascending (source, target) index order; adjacency lists come out
        // sorted without a second pass.
        for ((sender, receiver), (total, count, mut timestamps)) in aggregates {
            timestamps.sort_unstable();
            let source = index[&sender];
            let target = index[&receiver];
            let edge_idx = edges.len();
            edges.push(EdgeAggregate {
                source,
                target,
                total_amount: total,
                transaction_count: count,
                timestamps,
            });
            out_adj[source].push((target, edge_idx));
            in_adj[target].push((source, edge_idx));
        }

        Ok(Self {
            nodes,
            index,
            edges,
            out_adj,
            in_adj,
        })
    }

    /// Number of accounts with at least one incident edge.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of aggregated edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Account identifier for a node index.
    #[must_use]
    pub fn node_id(&self, node: usize) -> &str {
        &self.nodes[node]
    }

    /// Node index for an account identifier, if present.
    #[must_use]
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// All node identifiers in ascending order.
    #[must_use]
    pub fn node_ids(&self) -> &[String] {
        &self.nodes
    }

    /// All aggregated edges in ascending (source, target) order.
    #[must_use]
    pub fn edges(&self) -> &[EdgeAggregate] {
        &self.edges
    }

    /// One aggregated edge by index.
    #[must_use]
    pub fn edge(&self, edge_idx: usize) -> &EdgeAggregate {
        &self.edges[edge_idx]
    }

    /// Out-neighbors of a node as `(neighbor, edge index)` pairs, ascending
    /// by neighbor. Includes a self-loop entry when present.
    #[must_use]
    pub fn out_neighbors(&self, node: usize) -> &[(usize, usize)] {
        &self.out_adj[node]
    }

    /// In-neighbors of a node as `(neighbor, edge index)` pairs, ascending
    /// by neighbor. Includes a self-loop entry when present.
    #[must_use]
    pub fn in_neighbors(&self, node: usize) -> &[(usize, usize)] {
        &self.in_adj[node]
    }

    /// Distinct out-counterparties, self-loops excluded.
    #[must_use]
    pub fn out_degree(&self, node: usize) -> usize {
        self.out_adj[node].iter().filter(|(n, _)| *n != node).count()
    }

    /// Distinct in-counterparties, self-loops excluded.
    #[must_use]
    pub fn in_degree(&self, node: usize) -> usize {
        self.in_adj[node].iter().filter(|(n, _)| *n != node).count()
    }

    /// The aggregated edge from `source` to `target`, if any.
    #[must_use]
    pub fn edge_between(&self, source: usize, target: usize) -> Option<&EdgeAggregate> {
        self.out_adj[source]
            .binary_search_by_key(&target, |(n, _)| *n)
            .ok()
            .map(|pos| &self.edges[self.out_adj[source][pos].1])
    }

    /// Serialize the node and edge lists for visualization consumers.
    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self
                .nodes
                .iter()
                .map(|id| SnapshotNode { id: id.clone() })
                .collect(),
            links: self
                .edges
                .iter()
                .map(|edge| SnapshotLink {
                    source: self.nodes[edge.source].clone(),
                    target: self.nodes[edge.target].clone(),
                    total_amount: round2(edge.total_amount),
                    transaction_count: edge.transaction_count,
                })
                .collect(),
        }
    }
}
