//! Fuzzy Advisory Engine
//!
//! Evaluates the fixed rule set against fuzzified inputs and defuzzifies
//! into a single recommendation. Stateless apart from the loaded rules;
//! every call is an independent evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::membership::{
    fuzzify_bandwidth, fuzzify_cpu, fuzzify_latency, fuzzify_packet_loss, fuzzify_traffic,
    FuzzyInput, Membership,
};
use super::rules::{default_rules, FuzzyRule, Level, RulePriority, Variable};

/// Normal-operation message when nothing fires
const ALL_CLEAR: &str = "All metrics within normal operating range";

// ============================================================================
// RESULTS
// ============================================================================

/// One fired rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleMatch {
    pub rule_id: String,
    pub recommendation: String,
    pub priority: RulePriority,
    /// min() of the rule's membership degrees
    pub strength: f64,
    /// round(strength * 100)
    pub confidence: u32,
}

/// Full advisory output: ranked matches plus the defuzzified text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryReport {
    pub matches: Vec<RuleMatch>,
    pub recommendation: String,
    pub evaluated_at: DateTime<Utc>,
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct FuzzyAdvisoryEngine {
    rules: Vec<FuzzyRule>,
}

impl FuzzyAdvisoryEngine {
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// Evaluate all rules and defuzzify. Matches are sorted by priority
    /// (critical first) then strength for display.
    pub fn evaluate(&self, input: &FuzzyInput) -> AdvisoryReport {
        let memberships = Fuzzified::from_input(input);

        let mut matches: Vec<RuleMatch> = Vec::new();
        for rule in &self.rules {
            let strength = rule
                .terms
                .iter()
                .map(|&(var, level)| memberships.degree(var, level))
                .fold(1.0f64, f64::min);

            if strength > rule.threshold {
                matches.push(RuleMatch {
                    rule_id: rule.id.to_string(),
                    recommendation: rule.recommendation.to_string(),
                    priority: rule.priority,
                    strength,
                    confidence: (strength * 100.0).round() as u32,
                });
            }
        }

        matches.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(b.strength.partial_cmp(&a.strength).unwrap_or(std::cmp::Ordering::Equal))
        });

        let recommendation = defuzzify(&matches);

        AdvisoryReport {
            matches,
            recommendation,
            evaluated_at: Utc::now(),
        }
    }
}

impl Default for FuzzyAdvisoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// DEFUZZIFICATION
// ============================================================================

/// Deterministic text selection: every critical recommendation concatenated,
/// else the strongest high, else the top match, else the all-clear message.
fn defuzzify(matches: &[RuleMatch]) -> String {
    let critical: Vec<&RuleMatch> = matches
        .iter()
        .filter(|m| m.priority == RulePriority::Critical)
        .collect();
    if !critical.is_empty() {
        return critical
            .iter()
            .map(|m| m.recommendation.as_str())
            .collect::<Vec<_>>()
            .join("; ");
    }

    if let Some(high) = matches.iter().find(|m| m.priority == RulePriority::High) {
        return high.recommendation.clone();
    }

    match matches.first() {
        Some(top) => top.recommendation.clone(),
        None => ALL_CLEAR.to_string(),
    }
}

// ============================================================================
// FUZZIFIED SNAPSHOT
// ============================================================================

struct Fuzzified {
    latency: Membership,
    traffic: Membership,
    cpu: Membership,
    bandwidth: Membership,
    packet_loss: Membership,
}

impl Fuzzified {
    fn from_input(input: &FuzzyInput) -> Self {
        Self {
            latency: fuzzify_latency(input.latency),
            traffic: fuzzify_traffic(input.traffic),
            cpu: fuzzify_cpu(input.cpu_usage),
            bandwidth: fuzzify_bandwidth(input.bandwidth),
            packet_loss: fuzzify_packet_loss(input.packet_loss),
        }
    }

    fn degree(&self, var: Variable, level: Level) -> f64 {
        let m = match var {
            Variable::Latency => self.latency,
            Variable::Traffic => self.traffic,
            Variable::Cpu => self.cpu,
            Variable::Bandwidth => self.bandwidth,
            Variable::PacketLoss => self.packet_loss,
        };
        match level {
            Level::Low => m.low,
            Level::Medium => m.medium,
            Level::High => m.high,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_input() -> FuzzyInput {
        FuzzyInput {
            latency: 10.0,
            traffic: 10.0,
            cpu_usage: 10.0,
            bandwidth: 10.0,
            packet_loss: 0.0,
        }
    }

    #[test]
    fn test_quiet_network_yields_low_priority_only() {
        let engine = FuzzyAdvisoryEngine::new();
        let report = engine.evaluate(&quiet_input());

        assert!(report
            .matches
            .iter()
            .all(|m| m.priority == RulePriority::Low));
        // FZ-10 (headroom) fires on all-low input, so the message is its
        // recommendation; with no matches at all it would be the all-clear.
        assert!(
            report.recommendation.contains("headroom")
                || report.recommendation == ALL_CLEAR
        );
    }

    #[test]
    fn test_critical_rules_concatenated() {
        let engine = FuzzyAdvisoryEngine::new();
        let report = engine.evaluate(&FuzzyInput {
            latency: 200.0,
            traffic: 95.0,
            cpu_usage: 95.0,
            bandwidth: 900.0,
            packet_loss: 10.0,
        });

        // FZ-01 and FZ-02 both fire at full strength
        let criticals: Vec<_> = report
            .matches
            .iter()
            .filter(|m| m.priority == RulePriority::Critical)
            .collect();
        assert_eq!(criticals.len(), 2);
        assert!(report.recommendation.contains("; "));
        assert!(report.recommendation.contains("reroute"));
        assert!(report.recommendation.contains("saturated"));
    }

    #[test]
    fn test_match_confidence_is_rounded_strength() {
        let engine = FuzzyAdvisoryEngine::new();
        let report = engine.evaluate(&FuzzyInput {
            latency: 150.0, // high degree = (150-100)/80 = 0.625
            traffic: 10.0,
            cpu_usage: 10.0,
            bandwidth: 10.0,
            packet_loss: 0.0,
        });
        // No critical/high pair fires; latency alone doesn't hit FZ-01..05
        for m in &report.matches {
            assert_eq!(m.confidence, (m.strength * 100.0).round() as u32);
        }
    }

    #[test]
    fn test_matches_sorted_critical_first() {
        let engine = FuzzyAdvisoryEngine::new();
        let report = engine.evaluate(&FuzzyInput {
            latency: 200.0,
            traffic: 95.0,
            cpu_usage: 95.0,
            bandwidth: 900.0,
            packet_loss: 10.0,
        });
        for pair in report.matches.windows(2) {
            assert!(pair[0].priority >= pair[1].priority);
        }
    }

    #[test]
    fn test_single_high_rule_surfaces_directly() {
        let engine = FuzzyAdvisoryEngine::new();
        // Only packet loss is bad: FZ-04 (high) should drive the message
        let report = engine.evaluate(&FuzzyInput {
            latency: 10.0,
            traffic: 10.0,
            cpu_usage: 10.0,
            bandwidth: 10.0,
            packet_loss: 9.0,
        });
        assert!(report.recommendation.contains("error counters"));
    }
}
