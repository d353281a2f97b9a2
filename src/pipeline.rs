//! Pipeline Orchestration
//!
//! Owns one instance of every engine and drives the two entry points:
//! `ingest` for periodic device telemetry and `inspect_traffic` for
//! network events. Engines stay independently usable; the pipeline only
//! sequences them and forwards incidents to the configured sink.

use std::sync::Arc;

use crate::alerts::{Alert, AlertEngine};
use crate::anomaly::{Anomaly, AnomalyEngine};
use crate::config::PipelineConfig;
use crate::expert::{ExpertEngine, Fact, InferenceResult};
use crate::fuzzy::{AdvisoryReport, FuzzyAdvisoryEngine, FuzzyInput};
use crate::incident::{log_incident, IncidentKind, IncidentSink, LogSink};
use crate::metrics::MetricSample;
use crate::remediation::{
    spawn_worker, PredictedFault, RemediationAction, RemediationEngine,
};
use crate::threat::{Threat, ThreatEngine};

/// Everything one telemetry sample produced downstream
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub alerts: Vec<Alert>,
    pub anomalies: Vec<Anomaly>,
    pub advisory: AdvisoryReport,
    pub inference: InferenceResult,
    pub actions: Vec<RemediationAction>,
}

pub struct Pipeline {
    pub anomalies: Arc<AnomalyEngine>,
    pub fuzzy: FuzzyAdvisoryEngine,
    pub experts: ExpertEngine,
    pub threats: Arc<ThreatEngine>,
    pub alerts: Arc<AlertEngine>,
    pub remediation: Arc<RemediationEngine>,
    sink: Arc<dyn IncidentSink>,
}

impl Pipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        Self::with_sink(config, Arc::new(LogSink))
    }

    pub fn with_sink(config: &PipelineConfig, sink: Arc<dyn IncidentSink>) -> Self {
        let threats = Arc::new(ThreatEngine::new(config));
        // The alert engine forwards its own records, including alerts other
        // engines raise through it
        let alerts = Arc::new(AlertEngine::with_sink(Arc::clone(&sink)));
        let remediation = Arc::new(RemediationEngine::new(
            config,
            Arc::clone(&threats),
            Arc::clone(&alerts),
        ));
        Self {
            anomalies: Arc::new(AnomalyEngine::new(config)),
            fuzzy: FuzzyAdvisoryEngine::new(),
            experts: ExpertEngine::new(),
            threats,
            alerts,
            remediation,
            sink,
        }
    }

    /// Start the background queue worker for this pipeline's remediation
    /// engine. The returned handle stops when the pipeline is dropped.
    pub fn start_worker(&self) -> tokio::task::JoinHandle<()> {
        spawn_worker(&self.remediation)
    }

    // ------------------------------------------------------------------
    // Telemetry path
    // ------------------------------------------------------------------

    /// Feed one telemetry sample through the full detection chain:
    /// thresholds, anomaly detection, fuzzy advisory, expert inference and
    /// (for high/critical anomalies) remediation matching.
    pub fn ingest(&self, device_id: &str, device_name: &str, sample: MetricSample) -> IngestReport {
        self.anomalies.add_metrics(device_id, device_name, sample);

        let alerts = self.alerts.check(device_id, &sample);
        let anomalies = self.anomalies.detect_anomalies(device_id);
        let advisory = self.fuzzy.evaluate(&fuzzy_input(&sample));

        self.experts.reset();
        self.experts.add_facts(facts_from(&sample, &anomalies));
        let inference = self.experts.infer();

        let mut actions = Vec::new();
        for anomaly in anomalies.iter().filter(|a| a.severity.is_high()) {
            actions.extend(self.remediation.evaluate_anomaly(anomaly));
        }

        for anomaly in &anomalies {
            log_incident(self.sink.as_ref(), IncidentKind::Anomaly, anomaly);
        }
        for action in &actions {
            log_incident(self.sink.as_ref(), IncidentKind::RemediationAction, action);
        }

        IngestReport {
            alerts,
            anomalies,
            advisory,
            inference,
            actions,
        }
    }

    // ------------------------------------------------------------------
    // Traffic path
    // ------------------------------------------------------------------

    /// Inspect one network event. Blocked or unparseable traffic yields no
    /// threat; detected threats are matched against remediation policies.
    pub fn inspect_traffic(
        &self,
        threat_type: &str,
        source_ip: &str,
        target_ip: &str,
        port: Option<u16>,
        payload: Option<&str>,
    ) -> Option<Threat> {
        let threat = self
            .threats
            .detect_threat(threat_type, source_ip, target_ip, port, payload)?;
        log_incident(self.sink.as_ref(), IncidentKind::Threat, &threat);

        let actions = self.remediation.evaluate_threat(&threat);
        for action in &actions {
            log_incident(self.sink.as_ref(), IncidentKind::RemediationAction, action);
        }
        Some(threat)
    }

    // ------------------------------------------------------------------
    // Prediction path
    // ------------------------------------------------------------------

    /// Feed an upstream fault forecast to prediction-triggered remediation
    /// policies.
    pub fn report_prediction(&self, prediction: &PredictedFault) -> Vec<RemediationAction> {
        let actions = self.remediation.evaluate_prediction(prediction);
        for action in &actions {
            log_incident(self.sink.as_ref(), IncidentKind::RemediationAction, action);
        }
        actions
    }
}

/// Map a telemetry sample onto the advisory engine's input space. Traffic
/// is link utilization as a percentage of the 1 Gbps reference capacity.
fn fuzzy_input(sample: &MetricSample) -> FuzzyInput {
    FuzzyInput {
        latency: sample.latency,
        traffic: (sample.bandwidth / 10.0).clamp(0.0, 100.0),
        cpu_usage: sample.cpu,
        bandwidth: sample.bandwidth,
        packet_loss: sample.packet_loss,
    }
}

/// Working-memory snapshot for the expert engine: raw metrics at full
/// confidence plus the anomaly context from this cycle.
fn facts_from(sample: &MetricSample, anomalies: &[Anomaly]) -> Vec<Fact> {
    vec![
        Fact::new("cpu", sample.cpu, 1.0),
        Fact::new("memory", sample.memory, 1.0),
        Fact::new("latency", sample.latency, 1.0),
        Fact::new("bandwidth", sample.bandwidth, 1.0),
        Fact::new("packet_loss", sample.packet_loss, 1.0),
        Fact::new("anomaly_count", anomalies.len() as f64, 1.0),
        Fact::new("anomaly_detected", !anomalies.is_empty(), 1.0),
    ]
}

// ============================================================================
// TESTS
// ============================================================================
