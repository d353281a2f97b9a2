//! Diagnostic Rule Base
//!
//! Static network-diagnosis rules loaded once at engine construction.
//! Fact vocabulary: latency (ms), packet_loss (%), cpu (%), memory (%),
//! bandwidth (Mbps), interface_errors (bool), config_changed (bool),
//! device_role (string).

use super::types::{Condition, ExpertRule, Operator};

pub fn default_rules() -> Vec<ExpertRule> {
    use Operator::*;

    vec![
        ExpertRule {
            id: "EX-01".into(),
            name: "Uplink congestion".into(),
            conditions: vec![
                Condition::new("latency", GreaterThan, 100.0),
                Condition::new("packet_loss", GreaterThan, 3.0),
            ],
            diagnosis: "Network congestion on uplink path".into(),
            recommendation: "Reroute bulk traffic and verify QoS policy on the uplink".into(),
            priority: 90,
            confidence: 0.9,
        },
        ExpertRule {
            id: "EX-02".into(),
            name: "Device resource exhaustion".into(),
            conditions: vec![
                Condition::new("cpu", GreaterThan, 85.0),
                Condition::new("memory", GreaterThan, 80.0),
            ],
            diagnosis: "Device control plane starved of resources".into(),
            recommendation: "Shed non-essential services and plan a capacity upgrade".into(),
            priority: 85,
            confidence: 0.88,
        },
        ExpertRule {
            id: "EX-03".into(),
            name: "Faulty physical link".into(),
            conditions: vec![
                Condition::new("packet_loss", GreaterThan, 5.0),
                Condition::new("interface_errors", Equals, true),
            ],
            diagnosis: "Physical layer fault on an attached link".into(),
            recommendation: "Inspect cabling and SFP modules; check interface error counters".into(),
            priority: 80,
            confidence: 0.92,
        },
        ExpertRule {
            id: "EX-04".into(),
            name: "Recent misconfiguration".into(),
            conditions: vec![
                Condition::new("config_changed", Equals, true),
                Condition::new("latency", GreaterThan, 80.0),
            ],
            diagnosis: "Performance regression after configuration change".into(),
            recommendation: "Diff the last configuration change and consider rollback".into(),
            priority: 75,
            confidence: 0.8,
        },
        ExpertRule {
            id: "EX-05".into(),
            name: "Bandwidth saturation".into(),
            conditions: vec![Condition::new("bandwidth", GreaterThan, 800.0)],
            diagnosis: "Link approaching full bandwidth utilization".into(),
            recommendation: "Enable shaping for bulk classes or add link capacity".into(),
            priority: 60,
            confidence: 0.78,
        },
        ExpertRule {
            id: "EX-06".into(),
            name: "Core device under load".into(),
            conditions: vec![
                Condition::new("device_role", Contains, "core"),
                Condition::new("cpu", GreaterThan, 70.0),
            ],
            diagnosis: "Core device load endangers downstream segments".into(),
            recommendation: "Drain traffic to a peer core device before intervening".into(),
            priority: 70,
            confidence: 0.82,
        },
        ExpertRule {
            id: "EX-07".into(),
            name: "Latency without loss".into(),
            conditions: vec![
                Condition::new("latency", GreaterThan, 120.0),
                Condition::new("packet_loss", LessThan, 1.0),
            ],
            diagnosis: "Queueing delay without drops, likely buffer bloat".into(),
            recommendation: "Review queue depths and active queue management settings".into(),
            priority: 55,
            confidence: 0.72,
        },
        ExpertRule {
            id: "EX-08".into(),
            name: "Healthy but changed".into(),
            conditions: vec![
                Condition::new("config_changed", Equals, true),
                Condition::new("latency", LessThan, 50.0),
            ],
            diagnosis: "Recent change with no observable regression".into(),
            recommendation: "Keep the change under observation for one more window".into(),
            priority: 20,
            confidence: 0.6,
        },
    ]
}
