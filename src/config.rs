//! Pipeline Configuration
//!
//! Every tunable threshold and interval in one place. Engines take their
//! slice of this at construction; nothing reads configuration from global
//! state at runtime.

use serde::{Deserialize, Serialize};

// ============================================================================
// DETECTION THRESHOLDS (Constants - defaults, overridable via config)
// ============================================================================

/// Samples required before a device leaves cold start
pub const MIN_SAMPLES_FOR_DETECTION: usize = 20;

/// Retrain both detectors every N-th sample (once past cold start)
pub const RETRAIN_INTERVAL: usize = 10;

/// Per-device metric history capacity (FIFO eviction beyond this)
pub const MAX_HISTORY: usize = 100;

/// Normalized centroid distance above this flags a clustering anomaly
pub const CLUSTER_DISTANCE_THRESHOLD: f64 = 15.0;

/// |Z| above this flags a statistical anomaly
pub const Z_SCORE_THRESHOLD: f64 = 2.5;

/// Anomaly records older than this are pruned (minutes)
pub const ANOMALY_RETENTION_MINUTES: i64 = 60;

// ============================================================================
// REMEDIATION DEFAULTS
// ============================================================================

/// Probability that a simulated action execution succeeds
pub const EXECUTION_SUCCESS_RATE: f64 = 0.85;

/// Queue poll interval for the remediation worker (milliseconds)
pub const QUEUE_POLL_INTERVAL_MS: u64 = 500;

// ============================================================================
// CONFIG STRUCTS
// ============================================================================

/// Clustering detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Number of centroids (k)
    pub k: usize,
    /// Maximum Lloyd iterations per retrain
    pub max_iterations: usize,
    /// Stop early when no centroid moves more than this
    pub convergence_epsilon: f64,
    /// Normalized distance above which a sample is anomalous
    pub distance_threshold: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            k: 3,
            max_iterations: 100,
            convergence_epsilon: 0.001,
            distance_threshold: CLUSTER_DISTANCE_THRESHOLD,
        }
    }
}

/// Simulated execution latency window, milliseconds
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Zero delay, for tests
    pub const fn none() -> Self {
        Self { min_ms: 0, max_ms: 0 }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Seed for every sampled outcome (centroid seeding, signature fallback
    /// confidence, execution success). `None` seeds from entropy.
    pub rng_seed: Option<u64>,

    pub clustering: ClusteringConfig,

    /// |Z| threshold for the statistical detector
    pub z_score_threshold: f64,

    /// Cold-start minimum before detection runs
    pub min_samples: usize,

    /// Retrain cadence (every N-th sample)
    pub retrain_interval: usize,

    /// Per-device history capacity
    pub history_capacity: usize,

    /// Anomaly retention window (minutes)
    pub anomaly_retention_minutes: i64,

    /// Probability an action execution succeeds
    pub execution_success_rate: f64,

    /// Simulated external-system latency per action
    pub execution_delay: DelayRange,

    /// Remediation queue poll interval (ms)
    pub queue_poll_interval_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rng_seed: None,
            clustering: ClusteringConfig::default(),
            z_score_threshold: Z_SCORE_THRESHOLD,
            min_samples: MIN_SAMPLES_FOR_DETECTION,
            retrain_interval: RETRAIN_INTERVAL,
            history_capacity: MAX_HISTORY,
            anomaly_retention_minutes: ANOMALY_RETENTION_MINUTES,
            execution_success_rate: EXECUTION_SUCCESS_RATE,
            execution_delay: DelayRange::new(1500, 3000),
            queue_poll_interval_ms: QUEUE_POLL_INTERVAL_MS,
        }
    }
}

impl PipelineConfig {
    /// Deterministic config for tests: fixed seed, no execution latency,
    /// guaranteed execution success.
    pub fn deterministic(seed: u64) -> Self {
        Self {
            rng_seed: Some(seed),
            execution_success_rate: 1.0,
            execution_delay: DelayRange::none(),
            queue_poll_interval_ms: 10,
            ..Default::default()
        }
    }
}
