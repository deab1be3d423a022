//! Deterministic human-readable explanations.
//!
//! Each pattern tag maps to a fixed sentence; the primary reason is built
//! from the first three detected tags. Identical feature bundles always
//! produce byte-identical explanation strings.

use muleflow_core::model::PatternTag;

/// Explanation shown when no primary signal fired.
pub const NO_PRIMARY_REASON: &str = "No primary suspicious pattern detected.";

/// Fixed sentence for one pattern tag.
#[must_use]
pub fn tag_sentence(tag: PatternTag) -> &'static str {
    match tag {
        PatternTag::Cycle => {
            "This account participates in circular fund routing where money loops back toward its origin."
        }
        PatternTag::FanIn => {
            "This account aggregates funds from many distinct senders, a common collection pattern."
        }
        PatternTag::FanOut => {
            "This account distributes funds to many distinct receivers, consistent with dispersion."
        }
        PatternTag::Smurfing => {
            "This account transacts with an unusually high number of unique counterparties inside a short window."
        }
        PatternTag::Shell => {
            "This account acts as a low-activity intermediary in a multi-hop forwarding chain."
        }
        PatternTag::Velocity => {
            "This account shows a burst of transactions well above normal daily volume."
        }
        PatternTag::Community => {
            "This account belongs to a tightly connected cluster of related accounts."
        }
        PatternTag::HighPagerank => {
            "This account is structurally central to the flow of funds in the network."
        }
        PatternTag::HighBetweenness => {
            "This account bridges otherwise separate groups of accounts."
        }
    }
}

/// Build the primary reason from the leading detected patterns.
#[must_use]
pub fn primary_reason(patterns: &[PatternTag], has_primary: bool) -> String {
    if !has_primary {
        return NO_PRIMARY_REASON.to_string();
    }
    let sentences: Vec<&str> = patterns.iter().take(3).map(|&t| tag_sentence(t)).collect();
    if sentences.is_empty() {
        return NO_PRIMARY_REASON.to_string();
    }
    sentences.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_primary_fixed_string() {
        assert_eq!(
            primary_reason(&[PatternTag::Cycle], false),
            NO_PRIMARY_REASON
        );
        assert_eq!(primary_reason(&[], true), NO_PRIMARY_REASON);
    }

    #[test]
    fn test_first_three_patterns_only() {
        let patterns = [
            PatternTag::Cycle,
            PatternTag::FanIn,
            PatternTag::Smurfing,
            PatternTag::Community,
        ];
        let reason = primary_reason(&patterns, true);
        assert!(reason.contains("circular fund routing"));
        assert!(reason.contains("many distinct senders"));
        assert!(reason.contains("unique counterparties"));
        assert!(!reason.contains("tightly connected cluster"));
    }

    #[test]
    fn test_deterministic() {
        let patterns = [PatternTag::Shell, PatternTag::Velocity];
        assert_eq!(
            primary_reason(&patterns, true),
            primary_reason(&patterns, true)
        );
    }
}
