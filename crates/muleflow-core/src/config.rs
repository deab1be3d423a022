//! Pipeline configuration.
//!
//! All detection thresholds flow through [`DetectionConfig`]. The orchestrator
//! receives the configuration once and threads it into every extractor; there
//! are no process-wide mutable defaults.

use crate::error::{DetectError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for a detection run.
///
/// Every field has a production default; construct with `Default` and
/// override individual thresholds with the `with_*` methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum distinct in-neighbors for the fan-in flag.
    pub fan_in_min_in: usize,
    /// Maximum distinct out-neighbors allowed by the fan-in flag.
    pub fan_in_max_out: usize,
    /// Minimum distinct out-neighbors for the fan-out flag.
    pub fan_out_min_out: usize,
    /// Maximum distinct in-neighbors allowed by the fan-out flag.
    pub fan_out_max_in: usize,

    /// Maximum length of enumerated simple cycles.
    pub cycle_length_bound: usize,
    /// Global cap on enumerated cycles; hitting it sets the truncation flag.
    pub cycle_cap: usize,

    /// Sliding-window width for smurfing detection, in hours.
    pub smurfing_window_hours: i64,
    /// Distinct counterparties inside one window that trigger the smurf flag.
    pub smurfing_min_counterparties: usize,

    /// Sliding-window width for velocity detection, in hours.
    pub velocity_window_hours: i64,
    /// Transaction count a window must exceed to trigger the velocity flag.
    pub velocity_threshold: usize,

    /// Maximum total degree of a shell-chain intermediary.
    pub shell_max_degree: usize,
    /// Minimum chain depth (in edges) through a shell intermediary.
    pub shell_min_chain_depth: usize,

    /// Number of source nodes sampled for approximate betweenness.
    pub betweenness_sample_k: usize,
    /// Node count above which betweenness switches to sampling.
    pub betweenness_sample_threshold_nodes: usize,
    /// Seed for the betweenness source sampler.
    pub betweenness_seed: u64,

    /// PageRank damping factor.
    pub pagerank_damping: f64,
    /// PageRank convergence tolerance (max per-node delta).
    pub pagerank_tol: f64,
    /// PageRank iteration cap.
    pub pagerank_max_iter: u32,

    /// Suspicion score at or above which an account is flagged.
    pub flag_threshold: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            fan_in_min_in: 10,
            fan_in_max_out: 2,
            fan_out_min_out: 10,
            fan_out_max_in: 2,
            cycle_length_bound: 5,
            cycle_cap: 500,
            smurfing_window_hours: 72,
            smurfing_min_counterparties: 10,
            velocity_window_hours: 24,
            velocity_threshold: 10,
            shell_max_degree: 3,
            shell_min_chain_depth: 3,
            betweenness_sample_k: 200,
            betweenness_sample_threshold_nodes: 5_000,
            betweenness_seed: 0x00C0_FFEE,
            pagerank_damping: 0.85,
            pagerank_tol: 1e-6,
            pagerank_max_iter: 100,
            flag_threshold: 40.0,
        }
    }
}

impl DetectionConfig {
    /// Set the fan-in thresholds.
    #[must_use]
    pub fn with_fan_in(mut self, min_in: usize, max_out: usize) -> Self {
        self.fan_in_min_in = min_in;
        self.fan_in_max_out = max_out;
        self
    }

    /// Set the fan-out thresholds.
    #[must_use]
    pub fn with_fan_out(mut self, min_out: usize, max_in: usize) -> Self {
        self.fan_out_min_out = min_out;
        self.fan_out_max_in = max_in;
        self
    }

    /// Set the cycle enumeration bounds.
    #[must_use]
    pub fn with_cycle_bounds(mut self, length_bound: usize, cap: usize) -> Self {
        self.cycle_length_bound = length_bound;
        self.cycle_cap = cap;
        self
    }

    /// Set the smurfing window parameters.
    #[must_use]
    pub fn with_smurfing_window(mut self, hours: i64, min_counterparties: usize) -> Self {
        self.smurfing_window_hours = hours;
        self.smurfing_min_counterparties = min_counterparties;
        self
    }

    /// Set the velocity window parameters.
    #[must_use]
    pub fn with_velocity_window(mut self, hours: i64, threshold: usize) -> Self {
        self.velocity_window_hours = hours;
        self.velocity_threshold = threshold;
        self
    }

    /// Set the betweenness sampling parameters.
    #[must_use]
    pub fn with_betweenness_sampling(mut self, k: usize, threshold_nodes: usize, seed: u64) -> Self {
        self.betweenness_sample_k = k;
        self.betweenness_sample_threshold_nodes = threshold_nodes;
        self.betweenness_seed = seed;
        self
    }

    /// Set the PageRank parameters.
    #[must_use]
    pub fn with_pagerank(mut self, damping: f64, tol: f64, max_iter: u32) -> Self {
        self.pagerank_damping = damping;
        self.pagerank_tol = tol;
        self.pagerank_max_iter = max_iter;
        self
    }

    /// Set the flagging threshold.
    #[must_use]
    pub fn with_flag_threshold(mut self, threshold: f64) -> Self {
        self.flag_threshold = threshold;
        self
    }

    /// Validate threshold consistency.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.pagerank_damping) {
            return Err(DetectError::input(format!(
                "config: pagerank_damping must be in [0, 1), got {}",
                self.pagerank_damping
            )));
        }
        if self.pagerank_tol <= 0.0 {
            return Err(DetectError::input("config: pagerank_tol must be positive"));
        }
        if self.pagerank_max_iter == 0 {
            return Err(DetectError::input("config: pagerank_max_iter must be >= 1"));
        }
        if self.cycle_length_bound < 3 {
            return Err(DetectError::input(
                "config: cycle_length_bound must be >= 3 (shorter cycles are never counted)",
            ));
        }
        if self.cycle_cap == 0 {
            return Err(DetectError::input("config: cycle_cap must be >= 1"));
        }
        if self.smurfing_window_hours <= 0 || self.velocity_window_hours <= 0 {
            return Err(DetectError::input("config: window widths must be positive"));
        }
        if self.betweenness_sample_k == 0 {
            return Err(DetectError::input(
                "config: betweenness_sample_k must be >= 1",
            ));
        }
        if self.shell_max_degree < 2 {
            return Err(DetectError::input("config: shell_max_degree must be >= 2"));
        }
        if !(0.0..=100.0).contains(&self.flag_threshold) {
            return Err(DetectError::input(
                "config: flag_threshold must be in [0, 100]",
            ));
        }
        Ok(())
    }
}
