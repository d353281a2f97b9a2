//! Threat Types
//!
//! Data structures only - matching and neutralization logic lives in
//! `engine.rs`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::anomaly::Severity;

use super::firewall::FirewallAction;

// ============================================================================
// THREAT RECORD
// ============================================================================

/// Lifecycle of a threat. One-way progression: active -> neutralized.
/// Traffic blocked by a pre-existing rule never becomes a threat at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatStatus {
    Active,
    Neutralized,
    Blocked,
    Monitored,
}

impl ThreatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatStatus::Active => "active",
            ThreatStatus::Neutralized => "neutralized",
            ThreatStatus::Blocked => "blocked",
            ThreatStatus::Monitored => "monitored",
        }
    }
}

/// One detected threat. Descriptive fields are fixed at creation; only
/// status and neutralized_at ever change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Threat {
    pub id: String,
    pub threat_type: String,
    pub severity: Severity,
    pub status: ThreatStatus,
    pub source_ip: String,
    pub target_ip: String,
    /// 0.0 - 1.0
    pub confidence: f64,
    pub detected_at: DateTime<Utc>,
    pub neutralized_at: Option<DateTime<Utc>>,
}

// ============================================================================
// RULE TRIGGER EVENTS
// ============================================================================

/// Record of a firewall rule deciding inbound traffic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTriggerEvent {
    pub id: String,
    pub rule_id: String,
    pub action: FirewallAction,
    pub source_ip: String,
    pub target_ip: String,
    pub port: Option<u16>,
    pub occurred_at: DateTime<Utc>,
}

// ============================================================================
// QUERY FILTER & STATISTICS
// ============================================================================

/// All-None matches everything
#[derive(Debug, Clone, Default)]
pub struct ThreatFilter {
    pub status: Option<ThreatStatus>,
    pub severity: Option<Severity>,
    pub threat_type: Option<String>,
}

impl ThreatFilter {
    pub fn matches(&self, threat: &Threat) -> bool {
        self.status.map_or(true, |s| threat.status == s)
            && self.severity.map_or(true, |s| threat.severity == s)
            && self
                .threat_type
                .as_deref()
                .map_or(true, |t| threat.threat_type == t)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreatStatistics {
    pub total: usize,
    pub active: usize,
    pub neutralized: usize,
    pub by_severity: HashMap<String, usize>,
    pub by_type: HashMap<String, usize>,
    pub firewall_rules: usize,
    pub rule_events: usize,
}
