//! Suspicion scoring.
//!
//! Additive primary signals, supporting signals that only count alongside a
//! primary signal, then subtractive suppression of payroll, merchant, and
//! gateway shapes. The final score is clamped to [0, 100] and discretized
//! into a risk tier.

use muleflow_core::model::{AccountScore, PatternTag, RiskLevel};
use muleflow_graph::features::{FeatureBundle, NodeFeatures};
use muleflow_graph::graph::TransactionGraph;

use crate::explain;

// ============================================================================
// Weights
// ============================================================================

const W_VALIDATED_CYCLE: f64 = 40.0;
const W_SINGLE_LOW_CYCLE: f64 = 10.0;
const W_FAN_IN: f64 = 25.0;
const W_FAN_OUT: f64 = 25.0;
const W_SMURFING: f64 = 25.0;
const W_SHELL: f64 = 30.0;
const W_VELOCITY: f64 = 20.0;
const W_HIGH_PAGERANK: f64 = 5.0;
const W_HIGH_BETWEENNESS: f64 = 5.0;
const W_COMMUNITY: f64 = 10.0;

const S_PAYROLL: f64 = 30.0;
const S_MERCHANT: f64 = 40.0;
const S_GATEWAY: f64 = 40.0;
const S_LOW_ACTIVITY: f64 = 20.0;
const S_LOW_AMOUNT_CYCLE: f64 = 15.0;

/// Multiplier over the network mean for the centrality supporting signals.
const SUPPORT_MEAN_MULT: f64 = 2.0;
/// Cycle-edge amount above which a single cycle is validated.
const CYCLE_AMOUNT_FLOOR: f64 = 1_000.0;

const PAYROLL_MIN_OUT: usize = 10;
const PAYROLL_MAX_FORWARDING: f64 = 0.20;
const MERCHANT_MIN_IN: usize = 10;
const MERCHANT_MAX_OUT: usize = 1;
const GATEWAY_MIN_IN: usize = 50;
const GATEWAY_MIN_OUT: usize = 50;
const LOW_ACTIVITY_MAX_OUT: usize = 2;

// ============================================================================
// Scoring
// ============================================================================

/// Score every account in the graph, in node index order.
#[must_use]
pub fn score_accounts(graph: &TransactionGraph, bundle: &FeatureBundle) -> Vec<AccountScore> {
    let scores: Vec<AccountScore> = bundle
        .nodes
        .iter()
        .enumerate()
        .map(|(node, features)| score_one(graph.node_id(node), features, bundle))
        .collect();

    let tally = |level: RiskLevel| {
        scores
            .iter()
            .filter(|score| score.risk_level == level)
            .count()
    };
    tracing::info!(
        accounts = scores.len(),
        critical = tally(RiskLevel::Critical),
        high = tally(RiskLevel::High),
        medium = tally(RiskLevel::Medium),
        "scoring complete"
    );
    scores
}

fn score_one(account_id: &str, features: &NodeFeatures, bundle: &FeatureBundle) -> AccountScore {
    let mut score = 0.0;
    let mut has_primary = false;

    // Primary signals.
    let cycle_count = features.cycle_memberships.len();
    let validated_cycle =
        cycle_count >= 2 || (cycle_count >= 1 && features.max_cycle_edge_amount > CYCLE_AMOUNT_FLOOR);
    if features.in_cycle {
        if validated_cycle {
            score += W_VALIDATED_CYCLE;
            has_primary = true;
        } else {
            score += W_SINGLE_LOW_CYCLE;
        }
    }
    if features.fan_in_flag {
        score += W_FAN_IN;
        has_primary = true;
    }
    if features.fan_out_flag {
        score += W_FAN_OUT;
        has_primary = true;
    }
    if features.smurf_flag {
        score += W_SMURFING;
        has_primary = true;
    }
    if features.shell_flag {
        score += W_SHELL;
        has_primary = true;
    }
    if features.velocity_flag {
        score += W_VELOCITY;
        has_primary = true;
    }

    // Supporting signals, armed only by a primary signal.
    let high_pagerank =
        has_primary && features.pagerank > SUPPORT_MEAN_MULT * bundle.pagerank_mean;
    let high_betweenness =
        has_primary && features.betweenness > SUPPORT_MEAN_MULT * bundle.betweenness_mean;
    let community = has_primary && features.community_id.is_some();
    if high_pagerank {
        score += W_HIGH_PAGERANK;
    }
    if high_betweenness {
        score += W_HIGH_BETWEENNESS;
    }
    if community {
        score += W_COMMUNITY;
    }

    // Suppressions.
    if is_likely_payroll(features) {
        score -= S_PAYROLL;
    }
    if is_likely_merchant(features) {
        score -= S_MERCHANT;
    }
    if is_likely_gateway(features) {
        score -= S_GATEWAY;
    }
    if !has_primary && features.out_degree <= LOW_ACTIVITY_MAX_OUT {
        score -= S_LOW_ACTIVITY;
    }
    if features.in_cycle && cycle_count <= 1 && features.max_cycle_edge_amount < CYCLE_AMOUNT_FLOOR {
        score -= S_LOW_AMOUNT_CYCLE;
    }

    let score = score.clamp(0.0, 100.0);

    let mut detected_patterns = Vec::new();
    for tag in PatternTag::CANONICAL {
        let fired = match tag {
            PatternTag::Cycle => features.in_cycle,
            PatternTag::FanIn => features.fan_in_flag,
            PatternTag::FanOut => features.fan_out_flag,
            PatternTag::Smurfing => features.smurf_flag,
            PatternTag::Shell => features.shell_flag,
            PatternTag::Velocity => features.velocity_flag,
            PatternTag::Community => community,
            PatternTag::HighPagerank => high_pagerank,
            PatternTag::HighBetweenness => high_betweenness,
        };
        if fired {
            detected_patterns.push(tag);
        }
    }

    let primary_reason = explain::primary_reason(&detected_patterns, has_primary);

    AccountScore {
        account_id: account_id.to_string(),
        suspicion_score: score,
        risk_level: RiskLevel::from_score(score),
        detected_patterns,
        primary_reason,
        ring_id: None,
    }
}

// ============================================================================
// Suppression shapes
// ============================================================================

/// Batch disbursement hub: many recipients, almost none forwarding onward.
fn is_likely_payroll(features: &NodeFeatures) -> bool {
    features.out_degree >= PAYROLL_MIN_OUT
        && features.forwarding_ratio < PAYROLL_MAX_FORWARDING
        && !features.in_cycle
}

/// Collection endpoint: many senders, near-zero outgoing.
fn is_likely_merchant(features: &NodeFeatures) -> bool {
    features.in_degree >= MERCHANT_MIN_IN
        && features.out_degree <= MERCHANT_MAX_OUT
        && !features.in_cycle
}

/// Routing hub: very high degree in both directions.
fn is_likely_gateway(features: &NodeFeatures) -> bool {
    features.in_degree >= GATEWAY_MIN_IN
        && features.out_degree >= GATEWAY_MIN_OUT
        && !features.in_cycle
}
