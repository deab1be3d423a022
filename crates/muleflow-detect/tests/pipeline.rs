//! End-to-end pipeline tests over the public API.

use chrono::{DateTime, TimeZone, Utc};
use muleflow_core::config::DetectionConfig;
use muleflow_core::model::{PatternTag, ResultBundle, RiskLevel, Transaction};
use muleflow_detect::{run_pipeline, DetectionPipeline};

const HOUR: i64 = 3_600;

fn ts(offset_secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + offset_secs, 0).unwrap()
}

fn tx(sender: &str, receiver: &str, amount: f64, offset_secs: i64) -> Transaction {
    Transaction::new(sender, receiver, amount, ts(offset_secs))
}

fn run(rows: &[Transaction]) -> ResultBundle {
    run_pipeline(rows, &DetectionConfig::default()).unwrap()
}

fn flagged<'a>(bundle: &'a ResultBundle, id: &str) -> Option<&'a muleflow_core::model::AccountScore> {
    bundle
        .suspicious_accounts
        .iter()
        .find(|score| score.account_id == id)
}

// ============================================================================
// Seed scenarios
// ============================================================================

#[test]
fn test_trivial_low_amount_cycle_not_flagged() {
    let bundle = run(&[
        tx("A", "B", 500.0, 0),
        tx("B", "C", 500.0, HOUR),
        tx("C", "A", 500.0, 2 * HOUR),
    ]);

    assert!(bundle.suspicious_accounts.is_empty());
    assert!(bundle.fraud_rings.is_empty());
    assert_eq!(bundle.summary.total_accounts_analyzed, 3);
    assert_eq!(bundle.summary.suspicious_accounts_flagged, 0);
}

#[test]
fn test_validated_ring_merges_shared_cycles() {
    // Two high-value 3-cycles sharing account A.
    let bundle = run(&[
        tx("A", "B", 5_000.0, 0),
        tx("B", "C", 5_000.0, HOUR),
        tx("C", "A", 5_000.0, 2 * HOUR),
        tx("A", "D", 5_000.0, 3 * HOUR),
        tx("D", "E", 5_000.0, 4 * HOUR),
        tx("E", "A", 5_000.0, 5 * HOUR),
    ]);

    assert_eq!(bundle.suspicious_accounts.len(), 5);
    for score in &bundle.suspicious_accounts {
        assert!(score.suspicion_score >= 40.0);
        assert!(score.detected_patterns.contains(&PatternTag::Cycle));
        assert_eq!(score.ring_id.as_deref(), Some("RING_001"));
    }
    let a = flagged(&bundle, "A").unwrap();
    let b = flagged(&bundle, "B").unwrap();
    assert!(a.suspicion_score >= b.suspicion_score);

    assert_eq!(bundle.fraud_rings.len(), 1);
    let ring = &bundle.fraud_rings[0];
    assert_eq!(ring.ring_id, "RING_001");
    assert_eq!(ring.member_accounts, vec!["A", "B", "C", "D", "E"]);
    assert_eq!(ring.total_amount, 30_000.0);
}

#[test]
fn test_collector_mule_flagged_high() {
    // M receives from 15 distinct senders inside one day, forwards to two.
    let mut rows: Vec<Transaction> = (0..15)
        .map(|i| tx(&format!("S{i:02}"), "M", 100.0, i * HOUR))
        .collect();
    rows.push(tx("M", "OUT1", 750.0, 16 * HOUR));
    rows.push(tx("M", "OUT2", 750.0, 17 * HOUR));

    let bundle = run(&rows);
    let m = flagged(&bundle, "M").expect("collector mule must be flagged");

    assert!(m.suspicion_score >= 70.0, "score was {}", m.suspicion_score);
    assert!(m.risk_level >= RiskLevel::High);
    assert!(m.detected_patterns.contains(&PatternTag::FanIn));
    assert!(m.detected_patterns.contains(&PatternTag::Smurfing));
    assert!(m.detected_patterns.contains(&PatternTag::Velocity));
    assert!(!m.detected_patterns.contains(&PatternTag::Cycle));
}

#[test]
fn test_payroll_hub_suppressed() {
    // P pays 30 recipients; none of them forward funds.
    let rows: Vec<Transaction> = (0..30)
        .map(|i| tx("P", &format!("EMP{i:02}"), 2_500.0, i * 24 * HOUR))
        .collect();

    let bundle = run(&rows);
    assert!(flagged(&bundle, "P").is_none(), "payroll hub must not be flagged");
    assert_eq!(bundle.summary.suspicious_accounts_flagged, 0);
}

#[test]
fn test_shell_chain_intermediaries_flagged_medium() {
    let bundle = run(&[
        tx("A", "B", 10_000.0, 0),
        tx("B", "C", 10_000.0, HOUR),
        tx("C", "D", 10_000.0, 2 * HOUR),
        tx("D", "E", 10_000.0, 3 * HOUR),
    ]);

    for id in ["B", "C", "D"] {
        let score = flagged(&bundle, id).unwrap_or_else(|| panic!("{id} must be flagged"));
        assert_eq!(score.risk_level, RiskLevel::Medium);
        assert!(score.detected_patterns.contains(&PatternTag::Shell));
    }
    assert!(flagged(&bundle, "A").is_none());
    assert!(flagged(&bundle, "E").is_none());
}

#[test]
fn test_payment_gateway_suppressed() {
    let mut rows: Vec<Transaction> = (0..80)
        .map(|i| tx(&format!("S{i:02}"), "GW", 200.0, i * 60))
        .collect();
    rows.extend((0..80).map(|i| tx("GW", &format!("R{i:02}"), 195.0, 6 * HOUR + i * 60)));

    let bundle = run(&rows);
    assert!(flagged(&bundle, "GW").is_none(), "gateway must not be flagged");
}

// ============================================================================
// Boundary behaviors
// ============================================================================

#[test]
fn test_empty_batch_is_an_error() {
    let err = run_pipeline(&[], &DetectionConfig::default()).unwrap_err();
    assert_eq!(err.kind(), "empty_input");
}

#[test]
fn test_single_self_loop() {
    let bundle = run(&[tx("A", "A", 999.0, 0)]);
    assert_eq!(bundle.summary.total_accounts_analyzed, 1);
    assert!(bundle.suspicious_accounts.is_empty());
    assert!(bundle.fraud_rings.is_empty());
    assert_eq!(bundle.graph_snapshot.links.len(), 1);
}

#[test]
fn test_two_accounts_one_transfer() {
    let bundle = run(&[tx("A", "B", 1_000.0, 0)]);
    assert!(bundle.suspicious_accounts.is_empty());
    assert!(bundle.fraud_rings.is_empty());
}

#[test]
fn test_malformed_record_rejects_batch() {
    let rows = vec![tx("A", "B", 100.0, 0), tx("B", "C", f64::NAN, HOUR)];
    let err = run_pipeline(&rows, &DetectionConfig::default()).unwrap_err();
    assert_eq!(err.kind(), "input_invalid");
}

// ============================================================================
// Universal invariants
// ============================================================================

fn mixed_batch() -> Vec<Transaction> {
    let mut rows = vec![
        // Validated double cycle.
        tx("A", "B", 5_000.0, 0),
        tx("B", "C", 5_000.0, HOUR),
        tx("C", "A", 5_000.0, 2 * HOUR),
        tx("A", "D", 5_000.0, 3 * HOUR),
        tx("D", "E", 5_000.0, 4 * HOUR),
        tx("E", "A", 5_000.0, 5 * HOUR),
        // Shell chain.
        tx("P1", "Q1", 9_000.0, 0),
        tx("Q1", "Q2", 9_000.0, HOUR),
        tx("Q2", "Q3", 9_000.0, 2 * HOUR),
        tx("Q3", "P2", 9_000.0, 3 * HOUR),
    ];
    // Collector mule.
    rows.extend((0..15).map(|i| tx(&format!("S{i:02}"), "M", 100.0, i * HOUR)));
    rows.push(tx("M", "OUT1", 700.0, 16 * HOUR));
    rows.push(tx("M", "OUT2", 800.0, 17 * HOUR));
    rows
}

#[test]
fn test_flag_threshold_and_score_range() {
    let bundle = run(&mixed_batch());
    assert_eq!(
        bundle.summary.suspicious_accounts_flagged,
        bundle.suspicious_accounts.len()
    );
    for score in &bundle.suspicious_accounts {
        assert!(score.suspicion_score >= 40.0);
        assert!(score.suspicion_score <= 100.0);
    }
}

#[test]
fn test_suspicious_accounts_sorted() {
    let bundle = run(&mixed_batch());
    for pair in bundle.suspicious_accounts.windows(2) {
        assert!(
            pair[0].suspicion_score > pair[1].suspicion_score
                || (pair[0].suspicion_score == pair[1].suspicion_score
                    && pair[0].account_id < pair[1].account_id)
        );
    }
}

#[test]
fn test_ring_references_are_consistent() {
    let bundle = run(&mixed_batch());
    for score in &bundle.suspicious_accounts {
        if let Some(ring_id) = &score.ring_id {
            let ring = bundle
                .fraud_rings
                .iter()
                .find(|r| &r.ring_id == ring_id)
                .expect("referenced ring must exist");
            assert!(ring.member_accounts.contains(&score.account_id));
        }
    }
    for ring in &bundle.fraud_rings {
        assert!(!ring.member_accounts.is_empty());
        for member in &ring.member_accounts {
            let score = flagged(&bundle, member).expect("ring member must be flagged");
            assert_eq!(score.ring_id.as_deref(), Some(ring.ring_id.as_str()));
        }
    }
}

#[test]
fn test_cycle_rings_are_disjoint() {
    let bundle = run(&mixed_batch());
    let mut seen = std::collections::HashSet::new();
    for ring in &bundle.fraud_rings {
        for member in &ring.member_accounts {
            assert!(seen.insert(member.clone()), "{member} appears in two rings");
        }
    }
}

fn canonical_json(bundle: &ResultBundle) -> String {
    let mut clone = bundle.clone();
    clone.summary.processing_time_seconds = 0.0;
    clone.to_json_string().unwrap()
}

#[test]
fn test_repeated_runs_are_byte_identical() {
    let rows = mixed_batch();
    let first = run(&rows);
    let second = run(&rows);
    assert_eq!(canonical_json(&first), canonical_json(&second));
}

#[test]
fn test_input_order_does_not_matter() {
    let rows = mixed_batch();
    let mut reversed = rows.clone();
    reversed.reverse();
    assert_eq!(canonical_json(&run(&rows)), canonical_json(&run(&reversed)));
}

#[test]
fn test_reusable_pipeline_instance() {
    let pipeline = DetectionPipeline::new(DetectionConfig::default());
    let rows = mixed_batch();
    let first = pipeline.run(&rows).unwrap();
    let second = pipeline.run(&rows).unwrap();
    assert_eq!(canonical_json(&first), canonical_json(&second));
}

// ============================================================================
// Output contract
// ============================================================================

#[test]
fn test_json_shape() {
    let bundle = run(&mixed_batch());
    let json = bundle.to_json_value().unwrap();

    assert!(json["suspicious_accounts"].is_array());
    assert!(json["fraud_rings"].is_array());
    assert!(json["graph"]["nodes"].is_array());
    assert!(json["graph"]["links"].is_array());

    let account = &json["suspicious_accounts"][0];
    assert!(account["account_id"].is_string());
    assert!(account["suspicion_score"].is_number());
    assert!(matches!(
        account["risk_level"].as_str().unwrap(),
        "LOW" | "MEDIUM" | "HIGH" | "CRITICAL"
    ));
    assert!(account["detected_patterns"].is_array());
    assert!(account["primary_reason"].is_string());

    let ring = &json["fraud_rings"][0];
    assert!(ring["ring_id"].as_str().unwrap().starts_with("RING_"));
    assert!(matches!(
        ring["pattern_type"].as_str().unwrap(),
        "cycle" | "community"
    ));

    let node = &json["graph"]["nodes"][0];
    assert_eq!(node.as_object().unwrap().len(), 1, "nodes carry id only");

    let link = &json["graph"]["links"][0];
    assert!(link["source"].is_string());
    assert!(link["target"].is_string());
    assert!(link["total_amount"].is_number());
    assert!(link["transaction_count"].is_u64());

    let summary = &json["summary"];
    assert!(summary["total_accounts_analyzed"].is_u64());
    assert!(summary["suspicious_accounts_flagged"].is_u64());
    assert!(summary["fraud_rings_detected"].is_u64());
    assert!(summary["processing_time_seconds"].is_number());
    assert!(summary["cycles_truncated"].is_boolean());
}

#[test]
fn test_primary_reason_uses_leading_patterns() {
    let bundle = run(&mixed_batch());
    for score in &bundle.suspicious_accounts {
        assert!(!score.primary_reason.is_empty());
        assert_ne!(score.primary_reason, "No primary suspicious pattern detected.");
    }
}

#[test]
fn test_cycle_cap_reported_in_summary() {
    // Dense graph with a tiny cap forces truncation.
    let ids = ["A", "B", "C", "D", "E", "F"];
    let mut rows = Vec::new();
    let mut offset = 0;
    for u in ids {
        for v in ids {
            if u != v {
                rows.push(tx(u, v, 5_000.0, offset));
                offset += HOUR;
            }
        }
    }
    let config = DetectionConfig::default().with_cycle_bounds(5, 10);
    let bundle = run_pipeline(&rows, &config).unwrap();
    assert!(bundle.summary.cycles_truncated);
}
