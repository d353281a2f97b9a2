//! Engine Event Channels
//!
//! Each engine owns an `EventBus` and emits a typed `EngineEvent` after any
//! state-mutating operation completes. Consumers call `subscribe()` and
//! receive events over a broadcast channel; emitting with no subscribers is
//! a silent no-op so engines never depend on anyone listening.

use serde::Serialize;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

// ============================================================================
// EVENT TYPES
// ============================================================================

/// Change notification emitted by the engines
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    AnomalyDetected {
        anomaly_id: String,
        device_id: String,
        severity: String,
    },
    ThreatDetected {
        threat_id: String,
        threat_type: String,
        severity: String,
    },
    ThreatNeutralized {
        threat_id: String,
    },
    /// A firewall rule decided the fate of inbound traffic
    RuleTriggered {
        rule_id: String,
        action: String,
        source_ip: String,
    },
    FirewallChanged {
        rule_id: String,
    },
    ActionQueued {
        action_id: String,
        action_type: String,
    },
    ActionStarted {
        action_id: String,
    },
    ActionCompleted {
        action_id: String,
        success: bool,
    },
    ActionRolledBack {
        action_id: String,
    },
    PolicyChanged {
        policy_id: String,
    },
    AlertRaised {
        alert_id: String,
        metric: String,
        severity: String,
    },
    /// An inference run concluded with a primary diagnosis
    DiagnosisReached {
        rule_id: String,
        diagnosis: String,
        confidence: f64,
    },
}

// ============================================================================
// EVENT BUS
// ============================================================================

/// Broadcast channel wrapper owned by each engine
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe for change events. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    /// Emit to all current subscribers. No subscribers is not an error.
    pub fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
