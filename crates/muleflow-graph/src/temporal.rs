//! Sliding-window temporal analysis.
//!
//! Each account gets an event timeline built from the union of its incoming
//! and outgoing transfer timestamps (self-loops excluded). Two windows run
//! over that timeline with a two-pointer scan:
//!
//! - the smurfing window flags accounts reaching the distinct-counterparty
//!   threshold inside the configured window
//! - the velocity window flags accounts whose raw transaction count inside
//!   one window exceeds the configured threshold

use std::collections::HashMap;

use muleflow_core::config::DetectionConfig;

use crate::graph::TransactionGraph;

/// Per-node temporal flags.
#[derive(Debug, Clone, Default)]
pub struct TemporalFlags {
    /// Distinct-counterparty smurfing flag per node.
    pub smurf: Vec<bool>,
    /// Burst velocity flag per node.
    pub velocity: Vec<bool>,
}

/// Run both sliding windows over every account's timeline.
#[must_use]
pub fn detect_temporal(graph: &TransactionGraph, config: &DetectionConfig) -> TemporalFlags {
    let n = graph.node_count();

    // (timestamp, counterparty) per node, deduplicated for the counterparty
    // window; raw timestamps per node for the velocity window.
    let mut events: Vec<Vec<(i64, usize)>> = vec![Vec::new(); n];
    let mut raw: Vec<Vec<i64>> = vec![Vec::new(); n];

    for edge in graph.edges() {
        if edge.is_self_loop() {
            continue;
        }
        for ts in &edge.timestamps {
            let secs = ts.timestamp();
            events[edge.source].push((secs, edge.target));
            events[edge.target].push((secs, edge.source));
            raw[edge.source].push(secs);
            raw[edge.target].push(secs);
        }
    }

    let smurf_window = config.smurfing_window_hours * 3_600;
    let velocity_window = config.velocity_window_hours * 3_600;

    let mut flags = TemporalFlags {
        smurf: vec![false; n],
        velocity: vec![false; n],
    };

    for node in 0..n {
        let timeline = &mut events[node];
        timeline.sort_unstable();
        timeline.dedup();
        flags.smurf[node] =
            max_distinct_in_window(timeline, smurf_window) >= config.smurfing_min_counterparties;

        let ts = &mut raw[node];
        ts.sort_unstable();
        flags.velocity[node] = max_count_in_window(ts, velocity_window) > config.velocity_threshold;
    }

    flags
}

/// Largest number of distinct counterparties inside any inclusive window.
fn max_distinct_in_window(events: &[(i64, usize)], window_secs: i64) -> usize {
    let mut counts: HashMap<usize, u32> = HashMap::new();
    let mut distinct = 0;
    let mut best = 0;
    let mut left = 0;

    for right in 0..events.len() {
        let (ts, counterparty) = events[right];
        let slot = counts.entry(counterparty).or_insert(0);
        if *slot == 0 {
            distinct += 1;
        }
        *slot += 1;

        while ts - events[left].0 > window_secs {
            let out = counts.get_mut(&events[left].1).expect("tracked entry");
            *out -= 1;
            if *out == 0 {
                distinct -= 1;
            }
            left += 1;
        }

        best = best.max(distinct);
    }
    best
}

/// Largest event count inside any inclusive window.
fn max_count_in_window(timestamps: &[i64], window_secs: i64) -> usize {
    let mut best = 0;
    let mut left = 0;
    for right in 0..timestamps.len() {
        while timestamps[right] - timestamps[left] > window_secs {
            left += 1;
        }
        best = best.max(right - left + 1);
    }
    best
}
