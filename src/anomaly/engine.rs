//! Anomaly Engine
//!
//! Orchestrates the clustering and statistical detectors per device, applies
//! fixed critical thresholds, merges everything into severity-ranked anomaly
//! records and keeps a rolling one-hour store.
//!
//! Cold start: a device below the minimum sample count produces no anomalies
//! at all. Both detectors are retrained every N-th sample once past cold
//! start.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::events::{EngineEvent, EventBus};
use crate::metrics::{BoundedHistory, MetricSample};

use super::clustering::ClusteringDetector;
use super::statistical::StatisticalDetector;
use super::types::{
    Anomaly, AnomalyStatistics, AnomalyType, DetectionMethod, Severity,
};

// ============================================================================
// FIXED CRITICAL THRESHOLDS
// ============================================================================

/// (metric, limit, confidence, type) - fire whenever detection runs,
/// independent of what the trained detectors think
const CRITICAL_THRESHOLDS: [(&str, f64, f64, AnomalyType); 3] = [
    ("cpu", 90.0, 98.0, AnomalyType::ResourceExhaustion),
    ("memory", 90.0, 98.0, AnomalyType::ResourceExhaustion),
    ("latency", 100.0, 95.0, AnomalyType::LatencyAnomaly),
];

const ANOMALY_STORE_CAP: usize = 1000;

// ============================================================================
// PER-DEVICE STATE
// ============================================================================

struct DeviceState {
    name: String,
    history: BoundedHistory<MetricSample>,
    samples_seen: usize,
    clustering: ClusteringDetector,
    statistical: StatisticalDetector,
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct AnomalyEngine {
    config: PipelineConfig,
    devices: RwLock<HashMap<String, DeviceState>>,
    store: RwLock<BoundedHistory<Anomaly>>,
    /// Master RNG; each device detector gets its own stream seeded from it
    rng: RwLock<StdRng>,
    bus: EventBus,
}

impl AnomalyEngine {
    pub fn new(config: &PipelineConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config: config.clone(),
            devices: RwLock::new(HashMap::new()),
            store: RwLock::new(BoundedHistory::new(ANOMALY_STORE_CAP)),
            rng: RwLock::new(rng),
            bus: EventBus::new(),
        }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EngineEvent> {
        self.bus.subscribe()
    }

    /// Append one sample to the device history. Retrains both detectors on
    /// every N-th sample once the device is past cold start.
    pub fn add_metrics(&self, device_id: &str, device_name: &str, sample: MetricSample) {
        let mut devices = self.devices.write();
        let state = devices.entry(device_id.to_string()).or_insert_with(|| {
            let seed = self.rng.write().gen::<u64>();
            DeviceState {
                name: device_name.to_string(),
                history: BoundedHistory::new(self.config.history_capacity),
                samples_seen: 0,
                clustering: ClusteringDetector::new(
                    self.config.clustering.clone(),
                    StdRng::seed_from_u64(seed),
                ),
                statistical: StatisticalDetector::new(self.config.z_score_threshold),
            }
        });

        state.history.push(sample);
        state.samples_seen += 1;

        if state.samples_seen >= self.config.min_samples
            && state.samples_seen % self.config.retrain_interval == 0
        {
            let window = state.history.snapshot();
            state.clustering.train(&window);
            state.statistical.train(&window);
            log::debug!(
                "retrained detectors for {} ({} samples in window)",
                device_id,
                window.len()
            );
        }
    }

    /// Run detection against the device's most recent sample. Returns empty
    /// while the device is in cold start (below the minimum sample count).
    pub fn detect_anomalies(&self, device_id: &str) -> Vec<Anomaly> {
        let devices = self.devices.read();
        let state = match devices.get(device_id) {
            Some(s) => s,
            None => return Vec::new(),
        };
        if state.history.len() < self.config.min_samples {
            return Vec::new();
        }
        let sample = match state.history.last() {
            Some(s) => *s,
            None => return Vec::new(),
        };

        let mut anomalies = Vec::new();

        // Source 1: clustering
        let cluster = state.clustering.detect(&sample);
        if cluster.is_anomaly {
            let nd = cluster.normalized_distance;
            anomalies.push(self.make_anomaly(
                device_id,
                AnomalyType::PerformanceDegradation,
                cluster_severity(nd),
                (nd * 3.0).min(95.0),
                "composite",
                nd,
                self.config.clustering.distance_threshold,
                DetectionMethod::Clustering,
            ));
        }

        // Source 2: per-metric Z-scores
        for dev in state.statistical.detect(&sample) {
            if !dev.is_anomaly {
                continue;
            }
            let z = dev.z_score.abs();
            anomalies.push(self.make_anomaly(
                device_id,
                metric_anomaly_type(&dev.metric),
                z_severity(z),
                (70.0 + z * 5.0).min(99.0),
                &dev.metric,
                dev.current_value,
                dev.expected_value,
                DetectionMethod::Statistical,
            ));
        }

        // Source 3: fixed critical thresholds - these need no trained model
        for (metric, limit, confidence, anomaly_type) in CRITICAL_THRESHOLDS {
            let value = sample.get(metric).unwrap_or(0.0);
            if value > limit {
                anomalies.push(self.make_anomaly(
                    device_id,
                    anomaly_type,
                    Severity::Critical,
                    confidence,
                    metric,
                    value,
                    limit,
                    DetectionMethod::Threshold,
                ));
            }
        }

        drop(devices);

        if !anomalies.is_empty() {
            let mut store = self.store.write();
            for a in &anomalies {
                store.push(a.clone());
                self.bus.emit(EngineEvent::AnomalyDetected {
                    anomaly_id: a.id.clone(),
                    device_id: a.device_id.clone(),
                    severity: a.severity.as_str().to_string(),
                });
            }
            self.prune_locked(&mut store);
        }

        anomalies
    }

    #[allow(clippy::too_many_arguments)]
    fn make_anomaly(
        &self,
        device_id: &str,
        anomaly_type: AnomalyType,
        severity: Severity,
        confidence: f64,
        metric: &str,
        current: f64,
        expected: f64,
        method: DetectionMethod,
    ) -> Anomaly {
        Anomaly {
            id: Uuid::new_v4().to_string(),
            device_id: device_id.to_string(),
            anomaly_type,
            severity,
            confidence,
            metric: metric.to_string(),
            current_value: current,
            expected_value: expected,
            deviation: current - expected,
            detection_method: method,
            detected_at: Utc::now(),
        }
    }

    fn prune_locked(&self, store: &mut BoundedHistory<Anomaly>) {
        let cutoff = Utc::now() - Duration::minutes(self.config.anomaly_retention_minutes);
        store.retain(|a| a.detected_at >= cutoff);
    }

    // ------------------------------------------------------------------
    // Query surface (defensive copies)
    // ------------------------------------------------------------------

    /// Anomalies from the last `minutes`, optionally restricted to a device
    pub fn get_recent_anomalies(&self, device_id: Option<&str>, minutes: i64) -> Vec<Anomaly> {
        let cutoff = Utc::now() - Duration::minutes(minutes);
        self.store
            .read()
            .iter()
            .filter(|a| a.detected_at >= cutoff)
            .filter(|a| device_id.map_or(true, |d| a.device_id == d))
            .cloned()
            .collect()
    }

    pub fn device_sample_count(&self, device_id: &str) -> usize {
        self.devices
            .read()
            .get(device_id)
            .map_or(0, |s| s.history.len())
    }

    pub fn device_name(&self, device_id: &str) -> Option<String> {
        self.devices.read().get(device_id).map(|s| s.name.clone())
    }

    pub fn get_statistics(&self) -> AnomalyStatistics {
        let store = self.store.read();
        let mut stats = AnomalyStatistics {
            total: store.len(),
            devices_tracked: self.devices.read().len(),
            ..Default::default()
        };
        for a in store.iter() {
            *stats
                .by_severity
                .entry(a.severity.as_str().to_string())
                .or_insert(0) += 1;
            *stats
                .by_type
                .entry(a.anomaly_type.as_str().to_string())
                .or_insert(0) += 1;
            *stats
                .by_method
                .entry(a.detection_method.as_str().to_string())
                .or_insert(0) += 1;
        }
        stats
    }
}

// ============================================================================
// SEVERITY BUCKETING
// ============================================================================

fn cluster_severity(normalized_distance: f64) -> Severity {
    if normalized_distance > 30.0 {
        Severity::Critical
    } else if normalized_distance > 22.0 {
        Severity::High
    } else if normalized_distance > 17.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

fn z_severity(z: f64) -> Severity {
    if z > 4.0 {
        Severity::Critical
    } else if z > 3.5 {
        Severity::High
    } else if z > 3.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

fn metric_anomaly_type(metric: &str) -> AnomalyType {
    match metric {
        "latency" => AnomalyType::LatencyAnomaly,
        "bandwidth" => AnomalyType::TrafficSpike,
        "packet_loss" => AnomalyType::PacketLoss,
        // cpu, memory
        _ => AnomalyType::ResourceExhaustion,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> AnomalyEngine {
        AnomalyEngine::new(&PipelineConfig::deterministic(42))
    }

    fn steady(jitter: f64) -> MetricSample {
        MetricSample::new(30.0 + jitter, 40.0 + jitter, 20.0 + jitter, 100.0 + jitter, 0.5)
    }

    #[test]
    fn test_cold_start_returns_empty() {
        let e = engine();
        for i in 0..19 {
            e.add_metrics("dev-1", "edge-router", steady(i as f64 % 4.0));
        }
        // Even a blatant threshold breach stays silent below minimum history
        e.add_metrics("dev-2", "core-switch", MetricSample::new(99.0, 99.0, 400.0, 100.0, 0.0));
        assert!(e.detect_anomalies("dev-1").is_empty());
        assert!(e.detect_anomalies("dev-2").is_empty());
    }

    #[test]
    fn test_unknown_device_returns_empty() {
        assert!(engine().detect_anomalies("nope").is_empty());
    }

    #[test]
    fn test_threshold_breach_is_critical_conf_98() {
        let e = engine();
        for i in 0..24 {
            e.add_metrics("dev-1", "edge-router", steady((i % 4) as f64));
        }
        e.add_metrics("dev-1", "edge-router", MetricSample::new(95.0, 40.0, 20.0, 100.0, 0.5));

        let anomalies = e.detect_anomalies("dev-1");
        let threshold_hit = anomalies
            .iter()
            .find(|a| a.detection_method == DetectionMethod::Threshold && a.metric == "cpu")
            .expect("cpu threshold anomaly expected");
        assert_eq!(threshold_hit.severity, Severity::Critical);
        assert_eq!(threshold_hit.confidence, 98.0);
        assert_eq!(threshold_hit.anomaly_type, AnomalyType::ResourceExhaustion);
    }

    #[test]
    fn test_recent_anomalies_filtered_by_device() {
        let e = engine();
        for i in 0..24 {
            e.add_metrics("dev-1", "r1", steady((i % 4) as f64));
        }
        e.add_metrics("dev-1", "r1", MetricSample::new(95.0, 40.0, 20.0, 100.0, 0.5));
        e.detect_anomalies("dev-1");

        assert!(!e.get_recent_anomalies(Some("dev-1"), 5).is_empty());
        assert!(e.get_recent_anomalies(Some("dev-2"), 5).is_empty());
    }

    #[test]
    fn test_statistics_counts() {
        let e = engine();
        for i in 0..24 {
            e.add_metrics("dev-1", "r1", steady((i % 4) as f64));
        }
        e.add_metrics("dev-1", "r1", MetricSample::new(95.0, 95.0, 20.0, 100.0, 0.5));
        e.detect_anomalies("dev-1");

        let stats = e.get_statistics();
        assert!(stats.total >= 2); // cpu + memory threshold breaches
        assert!(stats.by_method.contains_key("threshold"));
        assert_eq!(stats.devices_tracked, 1);
    }

    #[test]
    fn test_severity_bucketing() {
        assert_eq!(cluster_severity(35.0), Severity::Critical);
        assert_eq!(cluster_severity(25.0), Severity::High);
        assert_eq!(cluster_severity(18.0), Severity::Medium);
        assert_eq!(cluster_severity(16.0), Severity::Low);
        assert_eq!(z_severity(4.2), Severity::Critical);
        assert_eq!(z_severity(3.7), Severity::High);
        assert_eq!(z_severity(3.2), Severity::Medium);
        assert_eq!(z_severity(2.6), Severity::Low);
    }
}
