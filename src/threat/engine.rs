//! Threat Engine
//!
//! Firewall evaluation first (a block suppresses threat creation entirely),
//! then signature scoring, then automatic neutralization of high-severity
//! threats by inserting a top-priority block rule for the source.

use std::net::Ipv4Addr;

use chrono::Utc;
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::events::{EngineEvent, EventBus};
use crate::metrics::BoundedHistory;

use super::firewall::{Cidr, FirewallAction, FirewallRule, FirewallTable};
use super::signatures;
use super::types::{RuleTriggerEvent, Threat, ThreatFilter, ThreatStatistics, ThreatStatus};

const RULE_EVENT_CAP: usize = 500;

/// Oldest threat records are evicted beyond this
const THREAT_STORE_CAP: usize = 1000;

pub struct ThreatEngine {
    firewall: RwLock<FirewallTable>,
    threats: RwLock<BoundedHistory<Threat>>,
    rule_events: RwLock<BoundedHistory<RuleTriggerEvent>>,
    rng: RwLock<StdRng>,
    bus: EventBus,
}

impl ThreatEngine {
    pub fn new(config: &PipelineConfig) -> Self {
        let rng = match config.rng_seed {
            // Offset so the threat engine gets its own stream
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        Self {
            firewall: RwLock::new(FirewallTable::new()),
            threats: RwLock::new(BoundedHistory::new(THREAT_STORE_CAP)),
            rule_events: RwLock::new(BoundedHistory::new(RULE_EVENT_CAP)),
            rng: RwLock::new(rng),
            bus: EventBus::new(),
        }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EngineEvent> {
        self.bus.subscribe()
    }

    // ------------------------------------------------------------------
    // Detection
    // ------------------------------------------------------------------

    /// Inspect one traffic event. Returns the created threat, or None when a
    /// firewall rule blocked the traffic (only a rule-trigger event is
    /// recorded) or the source IP is unparseable.
    pub fn detect_threat(
        &self,
        threat_type: &str,
        source_ip: &str,
        target_ip: &str,
        port: Option<u16>,
        payload: Option<&str>,
    ) -> Option<Threat> {
        let source: Ipv4Addr = match source_ip.parse() {
            Ok(a) => a,
            Err(_) => {
                log::warn!("unparseable source ip '{}' - traffic ignored", source_ip);
                return None;
            }
        };

        // Firewall first: an explicit block means no threat record at all
        if let Some(rule) = self
            .firewall
            .read()
            .evaluate(source, port, "tcp")
            .cloned()
        {
            self.record_rule_event(&rule, source_ip, target_ip, port);
            if rule.action == FirewallAction::Block {
                log::info!(
                    "traffic from {} blocked by rule {} - no threat created",
                    source_ip,
                    rule.id
                );
                return None;
            }
        }

        let (resolved_type, confidence) =
            signatures::score(threat_type, payload, &mut self.rng.write());
        let severity = signatures::severity(&resolved_type, confidence);

        let mut threat = Threat {
            id: Uuid::new_v4().to_string(),
            threat_type: resolved_type,
            severity,
            status: ThreatStatus::Active,
            source_ip: source_ip.to_string(),
            target_ip: target_ip.to_string(),
            confidence,
            detected_at: Utc::now(),
            neutralized_at: None,
        };

        self.bus.emit(EngineEvent::ThreatDetected {
            threat_id: threat.id.clone(),
            threat_type: threat.threat_type.clone(),
            severity: threat.severity.as_str().to_string(),
        });
        log::warn!(
            "threat detected: {} from {} (severity {}, confidence {:.2})",
            threat.threat_type,
            threat.source_ip,
            threat.severity,
            threat.confidence
        );

        // Critical/high severity is neutralized on the spot
        if threat.severity.is_high() {
            self.block_source(&threat.source_ip);
            threat.status = ThreatStatus::Neutralized;
            threat.neutralized_at = Some(Utc::now());
            self.bus.emit(EngineEvent::ThreatNeutralized {
                threat_id: threat.id.clone(),
            });
        }

        self.threats.write().push(threat.clone());
        Some(threat)
    }

    /// Manually neutralize an active threat. Returns false for unknown ids
    /// or threats that are not active (idempotence via status check).
    pub fn neutralize_threat(&self, threat_id: &str) -> bool {
        let source_ip = {
            let mut threats = self.threats.write();
            let threat = match threats.iter_mut().find(|t| t.id == threat_id) {
                Some(t) => t,
                None => return false,
            };
            if threat.status != ThreatStatus::Active {
                return false;
            }
            threat.status = ThreatStatus::Neutralized;
            threat.neutralized_at = Some(Utc::now());
            threat.source_ip.clone()
        };

        self.block_source(&source_ip);
        self.bus.emit(EngineEvent::ThreatNeutralized {
            threat_id: threat_id.to_string(),
        });
        true
    }

    /// Insert a highest-priority block rule for one source host. Used by
    /// neutralization and by the remediation executor's block_ip action.
    pub fn block_source(&self, source_ip: &str) -> Option<FirewallRule> {
        let source: Cidr = source_ip.parse().ok()?;
        let mut firewall = self.firewall.write();
        let rule = FirewallRule {
            id: Uuid::new_v4().to_string(),
            action: FirewallAction::Block,
            source,
            port: None,
            protocol: "any".into(),
            priority: firewall.top_priority(),
            enabled: true,
        };
        firewall.insert(rule.clone());
        drop(firewall);

        log::info!("block rule {} inserted for {}", rule.id, source_ip);
        self.bus.emit(EngineEvent::FirewallChanged {
            rule_id: rule.id.clone(),
        });
        Some(rule)
    }

    fn record_rule_event(
        &self,
        rule: &FirewallRule,
        source_ip: &str,
        target_ip: &str,
        port: Option<u16>,
    ) {
        let event = RuleTriggerEvent {
            id: Uuid::new_v4().to_string(),
            rule_id: rule.id.clone(),
            action: rule.action,
            source_ip: source_ip.to_string(),
            target_ip: target_ip.to_string(),
            port,
            occurred_at: Utc::now(),
        };
        self.rule_events.write().push(event);
        self.bus.emit(EngineEvent::RuleTriggered {
            rule_id: rule.id.clone(),
            action: rule.action.as_str().to_string(),
            source_ip: source_ip.to_string(),
        });
    }

    // ------------------------------------------------------------------
    // Firewall administration
    // ------------------------------------------------------------------

    pub fn add_firewall_rule(
        &self,
        action: FirewallAction,
        source: &str,
        port: Option<u16>,
        protocol: &str,
        priority: i32,
    ) -> Option<FirewallRule> {
        let source: Cidr = match source.parse() {
            Ok(c) => c,
            Err(e) => {
                log::warn!("rejected firewall rule: {}", e);
                return None;
            }
        };
        let rule = FirewallRule {
            id: Uuid::new_v4().to_string(),
            action,
            source,
            port,
            protocol: protocol.to_string(),
            priority,
            enabled: true,
        };
        self.firewall.write().insert(rule.clone());
        self.bus.emit(EngineEvent::FirewallChanged {
            rule_id: rule.id.clone(),
        });
        Some(rule)
    }

    /// Update priority and/or enabled flag. Unknown id -> false.
    pub fn update_firewall_rule(
        &self,
        rule_id: &str,
        priority: Option<i32>,
        enabled: Option<bool>,
    ) -> bool {
        let mut firewall = self.firewall.write();
        let rule = match firewall.get_mut(rule_id) {
            Some(r) => r,
            None => return false,
        };
        if let Some(p) = priority {
            rule.priority = p;
        }
        if let Some(e) = enabled {
            rule.enabled = e;
        }
        firewall.resort();
        drop(firewall);
        self.bus.emit(EngineEvent::FirewallChanged {
            rule_id: rule_id.to_string(),
        });
        true
    }

    pub fn remove_firewall_rule(&self, rule_id: &str) -> bool {
        let removed = self.firewall.write().remove(rule_id);
        if removed {
            self.bus.emit(EngineEvent::FirewallChanged {
                rule_id: rule_id.to_string(),
            });
        }
        removed
    }

    // ------------------------------------------------------------------
    // Query surface (defensive copies)
    // ------------------------------------------------------------------

    pub fn get_threats(&self, filter: &ThreatFilter) -> Vec<Threat> {
        self.threats
            .read()
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect()
    }

    pub fn get_firewall_rules(&self) -> Vec<FirewallRule> {
        self.firewall.read().snapshot()
    }

    pub fn get_rule_events(&self, limit: usize) -> Vec<RuleTriggerEvent> {
        self.rule_events.read().tail(limit)
    }

    pub fn get_statistics(&self) -> ThreatStatistics {
        let threats = self.threats.read();
        let mut stats = ThreatStatistics {
            total: threats.len(),
            firewall_rules: self.firewall.read().len(),
            rule_events: self.rule_events.read().len(),
            ..Default::default()
        };
        for t in threats.iter() {
            match t.status {
                ThreatStatus::Active => stats.active += 1,
                ThreatStatus::Neutralized => stats.neutralized += 1,
                _ => {}
            }
            *stats
                .by_severity
                .entry(t.severity.as_str().to_string())
                .or_insert(0) += 1;
            *stats.by_type.entry(t.threat_type.clone()).or_insert(0) += 1;
        }
        stats
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::Severity;

    fn engine() -> ThreatEngine {
        ThreatEngine::new(&PipelineConfig::deterministic(3))
    }

    #[test]
    fn test_preexisting_block_suppresses_threat() {
        let e = engine();
        e.add_firewall_rule(FirewallAction::Block, "203.0.113.0/24", None, "any", 1);

        let result = e.detect_threat("ddos", "203.0.113.9", "10.0.0.1", Some(80), None);
        assert!(result.is_none());
        assert!(e.get_threats(&ThreatFilter::default()).is_empty());

        // Only the rule-trigger event remains
        let events = e.get_rule_events(10);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, FirewallAction::Block);
    }

    #[test]
    fn test_critical_threat_auto_neutralized() {
        let e = engine();
        let threat = e
            .detect_threat("ddos", "198.51.100.7", "10.0.0.1", Some(443), None)
            .expect("threat expected");

        assert_eq!(threat.severity, Severity::Critical);
        assert_eq!(threat.status, ThreatStatus::Neutralized);
        assert!(threat.neutralized_at.is_some());

        // A block rule for the source now exists and wins future evaluation
        let rules = e.get_firewall_rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].action, FirewallAction::Block);
        assert!(e
            .detect_threat("ddos", "198.51.100.7", "10.0.0.1", Some(443), None)
            .is_none());
    }

    #[test]
    fn test_unknown_type_is_medium_or_high_and_stays_active() {
        let e = engine();
        let threat = e
            .detect_threat("odd_probe", "192.0.2.4", "10.0.0.2", None, None)
            .expect("threat expected");
        assert!((0.6..0.9).contains(&threat.confidence));
        // [0.6, 0.9) maps to medium or high, never critical
        assert_ne!(threat.severity, Severity::Critical);
    }

    #[test]
    fn test_neutralize_unknown_and_double() {
        let e = engine();
        assert!(!e.neutralize_threat("missing"));

        let threat = e
            .detect_threat("dns_poisoning", "192.0.2.8", "10.0.0.3", None, None)
            .expect("threat expected");
        if threat.status == ThreatStatus::Active {
            assert!(e.neutralize_threat(&threat.id));
            // Second neutralization is a no-op
            assert!(!e.neutralize_threat(&threat.id));
        } else {
            // Auto-neutralized at detection; manual call must refuse
            assert!(!e.neutralize_threat(&threat.id));
        }
    }

    #[test]
    fn test_sqli_payload_threat_typed_by_signature() {
        let e = engine();
        let threat = e
            .detect_threat(
                "web_attack",
                "192.0.2.20",
                "10.0.0.5",
                Some(443),
                Some("q=1' OR 1=1 --"),
            )
            .expect("threat expected");
        assert_eq!(threat.threat_type, "sql_injection");
        assert_eq!(threat.severity, Severity::Critical);
    }

    #[test]
    fn test_update_and_remove_rules() {
        let e = engine();
        let rule = e
            .add_firewall_rule(FirewallAction::Allow, "10.0.0.0/8", None, "tcp", 5)
            .unwrap();
        assert!(e.update_firewall_rule(&rule.id, Some(2), Some(false)));
        assert!(!e.update_firewall_rule("missing", Some(1), None));
        assert!(e.remove_firewall_rule(&rule.id));
        assert!(!e.remove_firewall_rule(&rule.id));
    }

    #[test]
    fn test_threat_store_is_bounded() {
        let e = engine();
        for i in 0..THREAT_STORE_CAP + 25 {
            // Distinct sources so earlier auto-blocks never suppress later traffic
            let source = format!("10.{}.{}.{}", (i >> 16) & 255, (i >> 8) & 255, i & 255);
            e.detect_threat("mitm", &source, "10.0.0.1", None, None);
        }
        assert_eq!(e.get_statistics().total, THREAT_STORE_CAP);
    }

    #[test]
    fn test_statistics() {
        let e = engine();
        e.detect_threat("ddos", "198.51.100.1", "10.0.0.1", None, None);
        e.detect_threat("odd_probe", "198.51.100.2", "10.0.0.1", None, None);

        let stats = e.get_statistics();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.neutralized + stats.active, 2);
        assert!(stats.by_type.contains_key("ddos"));
    }
}
