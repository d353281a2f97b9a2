//! Alert Threshold Engine
//!
//! Simple comparator rules over incoming samples producing alert records.
//! Also the entry point for alerts raised by the other engines (remediation
//! failures). Every alert is forwarded to the incident sink when one is
//! attached. History is bounded; thresholds are adjustable at runtime.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::anomaly::Severity;
use crate::events::{EngineEvent, EventBus};
use crate::incident::{log_incident, IncidentKind, IncidentSink};
use crate::metrics::{BoundedHistory, MetricSample};

const ALERT_HISTORY_CAP: usize = 500;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    GreaterThan,
    LessThan,
}

/// One comparator rule: fires when `sample[metric] <op> threshold`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub metric: String,
    pub comparator: Comparator,
    pub threshold: f64,
    pub severity: Severity,
    pub message: String,
}

/// Emitted alert record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub device_id: String,
    pub metric: String,
    pub severity: Severity,
    pub message: String,
    pub value: f64,
    pub threshold: f64,
    pub raised_at: DateTime<Utc>,
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct AlertEngine {
    rules: RwLock<Vec<ThresholdRule>>,
    history: RwLock<BoundedHistory<Alert>>,
    sink: Option<Arc<dyn IncidentSink>>,
    bus: EventBus,
}

impl AlertEngine {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Engine that forwards every alert to the given incident sink
    pub fn with_sink(sink: Arc<dyn IncidentSink>) -> Self {
        Self::build(Some(sink))
    }

    fn build(sink: Option<Arc<dyn IncidentSink>>) -> Self {
        Self {
            rules: RwLock::new(default_rules()),
            history: RwLock::new(BoundedHistory::new(ALERT_HISTORY_CAP)),
            sink,
            bus: EventBus::new(),
        }
    }

    fn forward(&self, alert: &Alert) {
        if let Some(sink) = &self.sink {
            log_incident(sink.as_ref(), IncidentKind::Alert, alert);
        }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EngineEvent> {
        self.bus.subscribe()
    }

    /// Evaluate every rule against one sample
    pub fn check(&self, device_id: &str, sample: &MetricSample) -> Vec<Alert> {
        let rules = self.rules.read();
        let mut fired = Vec::new();

        for rule in rules.iter() {
            let value = match sample.get(&rule.metric) {
                Some(v) => v,
                None => continue,
            };
            let hit = match rule.comparator {
                Comparator::GreaterThan => value > rule.threshold,
                Comparator::LessThan => value < rule.threshold,
            };
            if hit {
                fired.push(Alert {
                    id: Uuid::new_v4().to_string(),
                    device_id: device_id.to_string(),
                    metric: rule.metric.clone(),
                    severity: rule.severity,
                    message: rule.message.clone(),
                    value,
                    threshold: rule.threshold,
                    raised_at: Utc::now(),
                });
            }
        }
        drop(rules);

        let mut history = self.history.write();
        for alert in &fired {
            history.push(alert.clone());
            self.forward(alert);
            self.bus.emit(EngineEvent::AlertRaised {
                alert_id: alert.id.clone(),
                metric: alert.metric.clone(),
                severity: alert.severity.as_str().to_string(),
            });
        }

        fired
    }

    /// Raise an alert directly (used by the remediation engine on failure)
    pub fn raise(&self, device_id: &str, metric: &str, severity: Severity, message: &str) -> Alert {
        let alert = Alert {
            id: Uuid::new_v4().to_string(),
            device_id: device_id.to_string(),
            metric: metric.to_string(),
            severity,
            message: message.to_string(),
            value: 0.0,
            threshold: 0.0,
            raised_at: Utc::now(),
        };
        self.history.write().push(alert.clone());
        self.forward(&alert);
        self.bus.emit(EngineEvent::AlertRaised {
            alert_id: alert.id.clone(),
            metric: alert.metric.clone(),
            severity: alert.severity.as_str().to_string(),
        });
        log::warn!("alert [{}] {}: {}", severity, metric, message);
        alert
    }

    /// Adjust one rule's threshold. Unknown metric -> false.
    pub fn update_threshold(&self, metric: &str, threshold: f64) -> bool {
        let mut rules = self.rules.write();
        match rules.iter_mut().find(|r| r.metric == metric) {
            Some(rule) => {
                rule.threshold = threshold;
                true
            }
            None => false,
        }
    }

    pub fn get_rules(&self) -> Vec<ThresholdRule> {
        self.rules.read().clone()
    }

    pub fn get_alerts(&self, limit: usize) -> Vec<Alert> {
        self.history.read().tail(limit)
    }
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn default_rules() -> Vec<ThresholdRule> {
    vec![
        ThresholdRule {
            metric: "cpu".into(),
            comparator: Comparator::GreaterThan,
            threshold: 85.0,
            severity: Severity::High,
            message: "CPU utilization above alert threshold".into(),
        },
        ThresholdRule {
            metric: "memory".into(),
            comparator: Comparator::GreaterThan,
            threshold: 85.0,
            severity: Severity::High,
            message: "Memory utilization above alert threshold".into(),
        },
        ThresholdRule {
            metric: "latency".into(),
            comparator: Comparator::GreaterThan,
            threshold: 120.0,
            severity: Severity::Medium,
            message: "Latency above alert threshold".into(),
        },
        ThresholdRule {
            metric: "packet_loss".into(),
            comparator: Comparator::GreaterThan,
            threshold: 5.0,
            severity: Severity::High,
            message: "Packet loss above alert threshold".into(),
        },
        ThresholdRule {
            metric: "bandwidth".into(),
            comparator: Comparator::LessThan,
            threshold: 1.0,
            severity: Severity::Medium,
            message: "Throughput collapsed below alert floor".into(),
        },
    ]
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_fires_and_records() {
        let e = AlertEngine::new();
        let sample = MetricSample::new(95.0, 50.0, 20.0, 100.0, 0.2);
        let alerts = e.check("dev-1", &sample);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].metric, "cpu");
        assert_eq!(e.get_alerts(10).len(), 1);
    }

    #[test]
    fn test_update_threshold() {
        let e = AlertEngine::new();
        assert!(e.update_threshold("cpu", 50.0));
        assert!(!e.update_threshold("disk", 50.0));

        let sample = MetricSample::new(60.0, 50.0, 20.0, 100.0, 0.2);
        let alerts = e.check("dev-1", &sample);
        assert!(alerts.iter().any(|a| a.metric == "cpu"));
    }

    #[test]
    fn test_less_than_comparator() {
        let e = AlertEngine::new();
        let sample = MetricSample::new(10.0, 10.0, 10.0, 0.5, 0.0);
        let alerts = e.check("dev-1", &sample);
        assert!(alerts.iter().any(|a| a.metric == "bandwidth"));
    }

    #[test]
    fn test_direct_raise() {
        let e = AlertEngine::new();
        let alert = e.raise("dev-1", "remediation", Severity::High, "action failed");
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(e.get_alerts(10).len(), 1);
    }

    struct CapturingSink(Arc<parking_lot::Mutex<Vec<IncidentKind>>>);

    impl IncidentSink for CapturingSink {
        fn record(&self, kind: IncidentKind, _payload: &serde_json::Value) -> Result<(), String> {
            self.0.lock().push(kind);
            Ok(())
        }
    }

    #[test]
    fn test_every_alert_reaches_the_sink() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let e = AlertEngine::with_sink(Arc::new(CapturingSink(Arc::clone(&seen))));

        // One threshold alert, one directly raised alert
        e.check("dev-1", &MetricSample::new(95.0, 50.0, 20.0, 100.0, 0.2));
        e.raise("dev-1", "remediation", Severity::High, "action failed");

        let kinds = seen.lock().clone();
        assert_eq!(kinds.len(), 2);
        assert!(kinds.iter().all(|k| *k == IncidentKind::Alert));
    }
}
