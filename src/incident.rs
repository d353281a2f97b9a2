//! Incident Sink - Downstream Collaborator Boundary
//!
//! Every detected anomaly, threat, alert and remediation action is forwarded
//! to the incident log as a fire-and-forget call. The pipeline never depends
//! on the sink succeeding: failures are logged here and swallowed.

use serde::Serialize;
use serde_json::Value;

/// Incident categories the downstream store distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentKind {
    Anomaly,
    Threat,
    Alert,
    RemediationAction,
}

impl IncidentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentKind::Anomaly => "anomaly",
            IncidentKind::Threat => "threat",
            IncidentKind::Alert => "alert",
            IncidentKind::RemediationAction => "remediation_action",
        }
    }
}

/// Destination for incident records. Implementations may persist, forward
/// to a ticketing system, or drop records entirely.
pub trait IncidentSink: Send + Sync {
    /// Record one incident. Errors are the implementation's problem; the
    /// pipeline calls through [`log_incident`] which swallows them.
    fn record(&self, kind: IncidentKind, payload: &Value) -> Result<(), String>;
}

/// Forward a record to the sink, swallowing any failure at the boundary.
pub fn log_incident<S: Serialize>(sink: &dyn IncidentSink, kind: IncidentKind, record: &S) {
    let payload = match serde_json::to_value(record) {
        Ok(v) => v,
        Err(e) => {
            log::error!("incident serialization failed ({}): {}", kind.as_str(), e);
            return;
        }
    };
    if let Err(e) = sink.record(kind, &payload) {
        log::warn!("incident sink failed ({}): {} - record dropped", kind.as_str(), e);
    }
}

/// Default sink: writes incidents to the application log only
#[derive(Debug, Default)]
pub struct LogSink;

impl IncidentSink for LogSink {
    fn record(&self, kind: IncidentKind, payload: &Value) -> Result<(), String> {
        log::info!("[incident:{}] {}", kind.as_str(), payload);
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink;

    impl IncidentSink for FailingSink {
        fn record(&self, _kind: IncidentKind, _payload: &Value) -> Result<(), String> {
            Err("store unavailable".into())
        }
    }

    #[test]
    fn test_sink_failure_is_swallowed() {
        // Must not panic or propagate
        log_incident(&FailingSink, IncidentKind::Alert, &serde_json::json!({"x": 1}));
    }

    #[test]
    fn test_log_sink_accepts_records() {
        let sink = LogSink;
        assert!(sink
            .record(IncidentKind::Threat, &serde_json::json!({"id": "t-1"}))
            .is_ok());
    }
}
