//! Fuzzy Rule Set
//!
//! Ten fixed advisory rules. Each combines at most two membership degrees
//! with min() AND-semantics and only fires when its strength clears the
//! rule-specific threshold.

use serde::{Deserialize, Serialize};

// ============================================================================
// RULE VOCABULARY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    Latency,
    Traffic,
    Cpu,
    Bandwidth,
    PacketLoss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    Medium,
    High,
}

/// Display/defuzzification ordering: critical > high > medium > low
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RulePriority {
    Low,
    Medium,
    High,
    Critical,
}

impl RulePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            RulePriority::Low => "low",
            RulePriority::Medium => "medium",
            RulePriority::High => "high",
            RulePriority::Critical => "critical",
        }
    }
}

// ============================================================================
// RULE DEFINITION
// ============================================================================

/// One advisory rule: antecedent terms (ANDed), firing threshold,
/// recommendation text and display priority. Static, loaded once.
#[derive(Debug, Clone, Serialize)]
pub struct FuzzyRule {
    pub id: &'static str,
    /// One or two (variable, level) terms; strength is their min()
    pub terms: &'static [(Variable, Level)],
    /// Rule fires only when strength exceeds this
    pub threshold: f64,
    pub priority: RulePriority,
    pub recommendation: &'static str,
}

/// The fixed advisory rule set
pub fn default_rules() -> Vec<FuzzyRule> {
    use Level::*;
    use RulePriority as P;
    use Variable::*;

    vec![
        FuzzyRule {
            id: "FZ-01",
            terms: &[(Latency, High), (PacketLoss, High)],
            threshold: 0.4,
            priority: P::Critical,
            recommendation:
                "Severe path degradation: reroute latency-sensitive traffic and inspect link health",
        },
        FuzzyRule {
            id: "FZ-02",
            terms: &[(Cpu, High), (Traffic, High)],
            threshold: 0.4,
            priority: P::Critical,
            recommendation: "Device saturated: offload traffic or scale forwarding capacity now",
        },
        FuzzyRule {
            id: "FZ-03",
            terms: &[(Latency, High), (Traffic, High)],
            threshold: 0.4,
            priority: P::High,
            recommendation: "Congestion building: apply QoS prioritization for interactive flows",
        },
        FuzzyRule {
            id: "FZ-04",
            terms: &[(PacketLoss, High)],
            threshold: 0.35,
            priority: P::High,
            recommendation: "Sustained packet loss: check physical links and interface error counters",
        },
        FuzzyRule {
            id: "FZ-05",
            terms: &[(Bandwidth, High), (Cpu, Medium)],
            threshold: 0.4,
            priority: P::High,
            recommendation: "Bandwidth nearing capacity: enable traffic shaping before peak load",
        },
        FuzzyRule {
            id: "FZ-06",
            terms: &[(Traffic, Medium), (Latency, Medium)],
            threshold: 0.35,
            priority: P::Medium,
            recommendation: "Moderate congestion trend: consider load balancing across paths",
        },
        FuzzyRule {
            id: "FZ-07",
            terms: &[(Cpu, High)],
            threshold: 0.5,
            priority: P::Medium,
            recommendation: "Elevated CPU: investigate control-plane load on the device",
        },
        FuzzyRule {
            id: "FZ-08",
            terms: &[(Bandwidth, High)],
            threshold: 0.45,
            priority: P::Medium,
            recommendation: "High bandwidth consumption: review top talkers and allocations",
        },
        FuzzyRule {
            id: "FZ-09",
            terms: &[(Latency, Medium)],
            threshold: 0.3,
            priority: P::Low,
            recommendation: "Minor latency drift: no action required yet, keep monitoring",
        },
        FuzzyRule {
            id: "FZ-10",
            terms: &[(Traffic, Low), (Cpu, Low)],
            threshold: 0.3,
            priority: P::Low,
            recommendation: "Capacity headroom available: safe window for maintenance tasks",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_set_shape() {
        let rules = default_rules();
        assert_eq!(rules.len(), 10);
        for r in &rules {
            assert!(!r.terms.is_empty() && r.terms.len() <= 2);
            assert!((0.3..=0.5).contains(&r.threshold), "{} threshold", r.id);
        }
    }
}
