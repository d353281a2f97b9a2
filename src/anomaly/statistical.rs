//! Statistical Detector
//!
//! Per-device running baseline: mean and population standard deviation per
//! metric over the full window. A metric whose Z-score exceeds the threshold
//! is flagged; zero historical variance can never flag (denominator guard).

use serde::{Deserialize, Serialize};

use crate::metrics::{MetricSample, FEATURE_NAMES};

use super::types::MetricDeviation;

/// Learned baseline for one metric
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Baseline {
    pub mean: f64,
    pub std_dev: f64,
}

/// Z-score detector over the five metric features
#[derive(Debug)]
pub struct StatisticalDetector {
    z_threshold: f64,
    baselines: Option<[Baseline; 5]>,
}

impl StatisticalDetector {
    pub fn new(z_threshold: f64) -> Self {
        Self {
            z_threshold,
            baselines: None,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.baselines.is_some()
    }

    /// Recompute all baselines wholesale from the window
    pub fn train(&mut self, history: &[MetricSample]) {
        if history.is_empty() {
            return;
        }

        let n = history.len() as f64;
        let mut baselines = [Baseline::default(); 5];

        for (i, b) in baselines.iter_mut().enumerate() {
            let mean = history.iter().map(|s| s.features()[i]).sum::<f64>() / n;
            let variance = history
                .iter()
                .map(|s| {
                    let d = s.features()[i] - mean;
                    d * d
                })
                .sum::<f64>()
                / n;
            b.mean = mean;
            b.std_dev = variance.sqrt();
        }

        self.baselines = Some(baselines);
    }

    /// Per-metric deviations for one sample. Untrained -> empty.
    pub fn detect(&self, sample: &MetricSample) -> Vec<MetricDeviation> {
        let baselines = match &self.baselines {
            Some(b) => b,
            None => return Vec::new(),
        };

        let features = sample.features();
        let mut out = Vec::with_capacity(5);

        for i in 0..5 {
            let b = baselines[i];
            // A flat history can never produce an anomaly for this metric
            let z = if b.std_dev > 0.0 {
                (features[i] - b.mean) / b.std_dev
            } else {
                0.0
            };

            out.push(MetricDeviation {
                metric: FEATURE_NAMES[i].to_string(),
                is_anomaly: b.std_dev > 0.0 && z.abs() > self.z_threshold,
                z_score: z,
                current_value: features[i],
                expected_value: b.mean,
            });
        }

        out
    }

    pub fn baseline(&self, metric_index: usize) -> Option<Baseline> {
        self.baselines.as_ref().map(|b| b[metric_index])
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn varied_history() -> Vec<MetricSample> {
        (0..30)
            .map(|i| {
                let j = (i % 6) as f64;
                MetricSample::new(30.0 + j, 40.0 + j, 20.0 + j * 2.0, 100.0 + j * 5.0, 0.5)
            })
            .collect()
    }

    #[test]
    fn test_untrained_returns_empty() {
        let d = StatisticalDetector::new(2.5);
        assert!(d.detect(&MetricSample::new(99.0, 99.0, 400.0, 900.0, 50.0)).is_empty());
    }

    #[test]
    fn test_zero_variance_never_flags() {
        let mut d = StatisticalDetector::new(2.5);
        // packet_loss is constant 0.5 across the window
        d.train(&varied_history());

        let extreme = MetricSample::new(32.0, 42.0, 24.0, 110.0, 99.0);
        let deviations = d.detect(&extreme);
        let loss = deviations.iter().find(|m| m.metric == "packet_loss").unwrap();
        assert!(!loss.is_anomaly, "flat metric must not flag, z = {}", loss.z_score);
    }

    #[test]
    fn test_large_deviation_flags() {
        let mut d = StatisticalDetector::new(2.5);
        d.train(&varied_history());

        let spike = MetricSample::new(95.0, 42.0, 24.0, 110.0, 0.5);
        let deviations = d.detect(&spike);
        let cpu = deviations.iter().find(|m| m.metric == "cpu").unwrap();
        assert!(cpu.is_anomaly);
        assert!(cpu.z_score > 2.5);
    }

    #[test]
    fn test_population_std_dev() {
        let mut d = StatisticalDetector::new(2.5);
        let history = vec![
            MetricSample::new(10.0, 0.0, 0.0, 0.0, 0.0),
            MetricSample::new(20.0, 0.0, 0.0, 0.0, 0.0),
        ];
        d.train(&history);
        let b = d.baseline(0).unwrap();
        assert!((b.mean - 15.0).abs() < 1e-9);
        // Population sigma of {10, 20} is 5, not the sample estimate
        assert!((b.std_dev - 5.0).abs() < 1e-9);
    }
}
