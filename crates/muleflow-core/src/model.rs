//! Data model for transactions, account scores, fraud rings, and the
//! pipeline result bundle.
//!
//! Serialized field order on the outward-facing types is part of the output
//! contract consumed verbatim by embedding services.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DetectError, Result};

// ============================================================================
// Transactions
// ============================================================================

/// A single directed monetary transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sending account identifier.
    pub sender: String,
    /// Receiving account identifier.
    pub receiver: String,
    /// Transferred amount. Must be finite and non-negative.
    pub amount: f64,
    /// Instant of the transfer.
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Create a transaction. Identifiers are stored as given; the graph
    /// builder trims surrounding whitespace during validation.
    #[must_use]
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
            timestamp,
        }
    }

    /// Create a transaction from a raw timestamp string.
    ///
    /// Accepts RFC 3339 (`2024-03-01T10:00:00Z`) and the common
    /// `YYYY-MM-DD HH:MM:SS` form. A malformed timestamp rejects the record.
    pub fn parse(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: f64,
        raw_timestamp: &str,
    ) -> Result<Self> {
        Ok(Self::new(
            sender,
            receiver,
            amount,
            parse_timestamp(raw_timestamp)?,
        ))
    }
}

/// Parse a timestamp string into a UTC instant.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    Err(DetectError::input(format!("malformed timestamp: {raw:?}")))
}

// ============================================================================
// Risk levels and pattern tags
// ============================================================================

/// Discretized risk tier for an account score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// Score below 40.
    Low,
    /// Score in [40, 60).
    Medium,
    /// Score in [60, 80).
    High,
    /// Score of 80 and above.
    Critical,
}

impl RiskLevel {
    /// Classify a suspicion score into a tier.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            RiskLevel::Critical
        } else if score >= 60.0 {
            RiskLevel::High
        } else if score >= 40.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Stable string form, matching the serialized representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detected pattern tags.
///
/// The declaration order is the canonical emission order in
/// `detected_patterns` and is part of the output contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternTag {
    /// Membership in a directed transaction cycle.
    Cycle,
    /// Many distinct senders, few distinct receivers.
    FanIn,
    /// Many distinct receivers, few distinct senders.
    FanOut,
    /// Many distinct counterparties inside one sliding window.
    Smurfing,
    /// Low-degree pass-through intermediary on a forwarding chain.
    Shell,
    /// Transaction burst above the per-day threshold.
    Velocity,
    /// Member of a detected community.
    Community,
    /// PageRank above twice the network mean.
    HighPagerank,
    /// Betweenness above twice the network mean.
    HighBetweenness,
}

impl PatternTag {
    /// All tags in canonical emission order.
    pub const CANONICAL: [PatternTag; 9] = [
        PatternTag::Cycle,
        PatternTag::FanIn,
        PatternTag::FanOut,
        PatternTag::Smurfing,
        PatternTag::Shell,
        PatternTag::Velocity,
        PatternTag::Community,
        PatternTag::HighPagerank,
        PatternTag::HighBetweenness,
    ];

    /// Stable string form, matching the serialized representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternTag::Cycle => "cycle",
            PatternTag::FanIn => "fan_in",
            PatternTag::FanOut => "fan_out",
            PatternTag::Smurfing => "smurfing",
            PatternTag::Shell => "shell",
            PatternTag::Velocity => "velocity",
            PatternTag::Community => "community",
            PatternTag::HighPagerank => "high_pagerank",
            PatternTag::HighBetweenness => "high_betweenness",
        }
    }
}

impl std::fmt::Display for PatternTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Scores and rings
// ============================================================================

/// Per-account scoring outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountScore {
    /// Account identifier.
    pub account_id: String,
    /// Suspicion score in [0, 100].
    pub suspicion_score: f64,
    /// Discretized risk tier.
    pub risk_level: RiskLevel,
    /// Fired pattern tags in canonical order.
    pub detected_patterns: Vec<PatternTag>,
    /// Short human-readable explanation built from the leading patterns.
    pub primary_reason: String,
    /// Ring the account was assigned to, if any.
    pub ring_id: Option<String>,
}

/// Type of evidence a fraud ring was assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RingPatternType {
    /// Ring formed from overlapping transaction cycles.
    Cycle,
    /// Ring formed from a detected community.
    Community,
}

/// A group of flagged accounts connected by shared cycle or community
/// membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudRing {
    /// Stable ring identifier (`RING_001`, `RING_002`, ...).
    pub ring_id: String,
    /// Flagged member accounts, ascending by identifier.
    pub member_accounts: Vec<String>,
    /// Evidence type the ring was assembled from.
    pub pattern_type: RingPatternType,
    /// Mean member suspicion score, rounded to two decimals.
    pub risk_score: f64,
    /// Sum of amounts on directed edges between ring members.
    pub total_amount: f64,
}

// ============================================================================
// Graph snapshot
// ============================================================================

/// A node in the serialized graph snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    /// Account identifier.
    pub id: String,
}

/// An aggregated directed edge in the serialized graph snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotLink {
    /// Sending account identifier.
    pub source: String,
    /// Receiving account identifier.
    pub target: String,
    /// Sum of amounts over the aggregated transfers.
    pub total_amount: f64,
    /// Number of aggregated transfers.
    pub transaction_count: u32,
}

/// Node and edge lists handed to downstream visualization consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Nodes in ascending identifier order.
    pub nodes: Vec<SnapshotNode>,
    /// Links in ascending (source, target) order.
    pub links: Vec<SnapshotLink>,
}

// ============================================================================
// Result bundle
// ============================================================================

/// Aggregate statistics for a detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of accounts with at least one incident edge.
    pub total_accounts_analyzed: usize,
    /// Number of accounts at or above the flag threshold.
    pub suspicious_accounts_flagged: usize,
    /// Number of assembled fraud rings.
    pub fraud_rings_detected: usize,
    /// Wall-clock pipeline duration, rounded to milliseconds.
    pub processing_time_seconds: f64,
    /// True when cycle enumeration hit the global cap.
    pub cycles_truncated: bool,
}

/// Complete output of one detection run. Constructed once per run and not
/// mutated after return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultBundle {
    /// Flagged accounts, descending by score then ascending by identifier.
    pub suspicious_accounts: Vec<AccountScore>,
    /// Assembled rings, descending by risk score then ascending by identifier.
    pub fraud_rings: Vec<FraudRing>,
    /// Graph snapshot for visualization consumers.
    #[serde(rename = "graph")]
    pub graph_snapshot: GraphSnapshot,
    /// Run statistics.
    pub summary: Summary,
}

impl ResultBundle {
    /// Serialize the bundle to the canonical JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| DetectError::internal(e.to_string()))
    }

    /// Serialize the bundle to a JSON value.
    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| DetectError::internal(e.to_string()))
    }
}
