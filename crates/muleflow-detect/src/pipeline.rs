//! End-to-end pipeline orchestration.
//!
//! Stages run strictly in order on a single batch: graph construction,
//! feature extraction, scoring, ring assembly, bundle assembly. A caller's
//! cancellation token is polled between stages only.

use std::time::Instant;

use muleflow_core::cancel::CancelToken;
use muleflow_core::config::DetectionConfig;
use muleflow_core::error::{DetectError, Result};
use muleflow_core::model::{ResultBundle, Summary, Transaction};
use muleflow_graph::features::extract_features;
use muleflow_graph::graph::TransactionGraph;

use crate::rings::assemble_rings;
use crate::scoring::score_accounts;

/// The detection pipeline, configured once and reusable across batches.
#[derive(Debug, Clone, Default)]
pub struct DetectionPipeline {
    config: DetectionConfig,
}

impl DetectionPipeline {
    /// Create a pipeline with the given configuration.
    #[must_use]
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    /// The pipeline's configuration.
    #[must_use]
    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Run the pipeline on one transaction batch.
    pub fn run(&self, transactions: &[Transaction]) -> Result<ResultBundle> {
        self.run_cancellable(transactions, &CancelToken::new())
    }

    /// Run the pipeline, polling the token between stages.
    pub fn run_cancellable(
        &self,
        transactions: &[Transaction],
        cancel: &CancelToken,
    ) -> Result<ResultBundle> {
        self.config.validate()?;
        let started = Instant::now();

        if transactions.is_empty() {
            return Err(DetectError::EmptyInput);
        }
        tracing::info!(rows = transactions.len(), "starting detection pipeline");

        let graph = TransactionGraph::build(transactions)?;
        if graph.edge_count() == 0 {
            return Err(DetectError::EmptyInput);
        }
        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph built"
        );
        check(cancel)?;

        let bundle = extract_features(&graph, &self.config);
        check(cancel)?;

        let mut scores = score_accounts(&graph, &bundle);
        check(cancel)?;

        let fraud_rings = assemble_rings(&graph, &bundle, &mut scores, self.config.flag_threshold);
        check(cancel)?;

        let mut suspicious_accounts: Vec<_> = scores
            .into_iter()
            .filter(|score| score.suspicion_score >= self.config.flag_threshold)
            .collect();
        suspicious_accounts.sort_by(|a, b| {
            b.suspicion_score
                .total_cmp(&a.suspicion_score)
                .then_with(|| a.account_id.cmp(&b.account_id))
        });

        let mut fraud_rings = fraud_rings;
        fraud_rings.sort_by(|a, b| {
            b.risk_score
                .total_cmp(&a.risk_score)
                .then_with(|| a.ring_id.cmp(&b.ring_id))
        });

        let elapsed = started.elapsed().as_secs_f64();
        let summary = Summary {
            total_accounts_analyzed: graph.node_count(),
            suspicious_accounts_flagged: suspicious_accounts.len(),
            fraud_rings_detected: fraud_rings.len(),
            processing_time_seconds: (elapsed * 1_000.0).round() / 1_000.0,
            cycles_truncated: bundle.cycles_truncated,
        };

        tracing::info!(
            elapsed_secs = summary.processing_time_seconds,
            suspicious = summary.suspicious_accounts_flagged,
            rings = summary.fraud_rings_detected,
            "pipeline complete"
        );

        Ok(ResultBundle {
            suspicious_accounts,
            fraud_rings,
            graph_snapshot: graph.snapshot(),
            summary,
        })
    }
}

fn check(cancel: &CancelToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(DetectError::Cancelled)
    } else {
        Ok(())
    }
}

/// Run the pipeline once with the given configuration.
pub fn run_pipeline(transactions: &[Transaction], config: &DetectionConfig) -> Result<ResultBundle> {
    DetectionPipeline::new(config.clone()).run(transactions)
}
