//! Anomaly Detection
//!
//! Two unsupervised detectors (k-means clustering + per-metric Z-score
//! baselines) orchestrated by `AnomalyEngine`, which also applies fixed
//! critical thresholds and keeps the rolling anomaly store.

pub mod clustering;
pub mod engine;
pub mod statistical;
pub mod types;

pub use clustering::ClusteringDetector;
pub use engine::AnomalyEngine;
pub use statistical::StatisticalDetector;
pub use types::{Anomaly, AnomalyStatistics, AnomalyType, DetectionMethod, Severity};
