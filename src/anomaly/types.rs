//! Anomaly Types
//!
//! Data structures only - detection logic lives in the detectors and the
//! engine.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// SEVERITY
// ============================================================================

/// Severity levels shared by anomalies, threats, alerts and actions
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    pub fn is_high(&self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ANOMALY CLASSIFICATION
// ============================================================================

/// What kind of abnormal behavior was observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    /// Sample far from every learned cluster
    PerformanceDegradation,
    LatencyAnomaly,
    /// CPU or memory deviating from baseline
    ResourceExhaustion,
    /// Bandwidth deviating from baseline
    TrafficSpike,
    PacketLoss,
}

impl AnomalyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyType::PerformanceDegradation => "performance_degradation",
            AnomalyType::LatencyAnomaly => "latency_anomaly",
            AnomalyType::ResourceExhaustion => "resource_exhaustion",
            AnomalyType::TrafficSpike => "traffic_spike",
            AnomalyType::PacketLoss => "packet_loss",
        }
    }
}

/// Which detector produced the anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    Clustering,
    Statistical,
    Threshold,
}

impl DetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMethod::Clustering => "clustering",
            DetectionMethod::Statistical => "statistical",
            DetectionMethod::Threshold => "threshold",
        }
    }
}

// ============================================================================
// ANOMALY RECORD
// ============================================================================

/// One detected anomaly. Descriptive fields are fixed at creation; records
/// are never mutated, only aged out of the rolling store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub id: String,
    pub device_id: String,
    pub anomaly_type: AnomalyType,
    pub severity: Severity,
    /// 0 - 100
    pub confidence: f64,
    /// Metric the anomaly is about ("composite" for clustering hits)
    pub metric: String,
    pub current_value: f64,
    pub expected_value: f64,
    pub deviation: f64,
    pub detection_method: DetectionMethod,
    pub detected_at: DateTime<Utc>,
}

// ============================================================================
// DETECTOR OUTPUTS
// ============================================================================

/// Clustering detector verdict for one sample
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClusterDetection {
    pub is_anomaly: bool,
    /// Nearest-centroid distance scaled to 0-100 space
    pub normalized_distance: f64,
}

/// One metric's deviation from the statistical baseline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricDeviation {
    pub metric: String,
    pub is_anomaly: bool,
    pub z_score: f64,
    pub current_value: f64,
    pub expected_value: f64,
}

// ============================================================================
// STATISTICS
// ============================================================================

/// Counts over the rolling anomaly store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnomalyStatistics {
    pub total: usize,
    pub by_severity: HashMap<String, usize>,
    pub by_type: HashMap<String, usize>,
    pub by_method: HashMap<String, usize>,
    pub devices_tracked: usize,
}
