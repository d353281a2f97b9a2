//! Clustering Detector
//!
//! k-means over a window of metric vectors normalized to [0,1] per feature.
//! A sample whose nearest centroid is too far away is anomalous. The RNG is
//! injected so centroid seeding is reproducible under a fixed seed.

use rand::rngs::StdRng;
use rand::seq::index::sample as sample_indices;
use rand::Rng;

use crate::config::ClusteringConfig;
use crate::metrics::{MetricSample, FEATURE_MAXIMA};

use super::types::ClusterDetection;

type Point = [f64; 5];

/// Unsupervised k-means detector. One instance per device; centroids are
/// replaced wholesale on each `train`, never partially mutated.
#[derive(Debug)]
pub struct ClusteringDetector {
    config: ClusteringConfig,
    centroids: Vec<Point>,
    rng: StdRng,
}

impl ClusteringDetector {
    pub fn new(config: ClusteringConfig, rng: StdRng) -> Self {
        Self {
            config,
            centroids: Vec::new(),
            rng,
        }
    }

    pub fn is_trained(&self) -> bool {
        !self.centroids.is_empty()
    }

    /// Retrain on the full window. Requires at least k samples; with fewer
    /// the previous model (possibly none) is kept.
    pub fn train(&mut self, history: &[MetricSample]) {
        let k = self.config.k;
        if history.len() < k {
            return;
        }

        let points: Vec<Point> = history.iter().map(|s| normalize(s)).collect();

        // k distinct random seed points
        let mut centroids: Vec<Point> = sample_indices(&mut self.rng, points.len(), k)
            .iter()
            .map(|i| points[i])
            .collect();

        for _ in 0..self.config.max_iterations {
            // Assignment step
            let mut assignments: Vec<Vec<&Point>> = vec![Vec::new(); k];
            for p in &points {
                let (idx, _) = nearest(&centroids, p);
                assignments[idx].push(p);
            }

            // Update step
            let mut max_shift = 0.0f64;
            for (ci, members) in assignments.iter().enumerate() {
                if members.is_empty() {
                    // Reseed empty clusters to a random training point so the
                    // model keeps k meaningful centroids under degenerate data.
                    let replacement = points[self.rng.gen_range(0..points.len())];
                    max_shift = max_shift.max(distance(&centroids[ci], &replacement));
                    centroids[ci] = replacement;
                    continue;
                }
                let mean = mean_point(members);
                max_shift = max_shift.max(distance(&centroids[ci], &mean));
                centroids[ci] = mean;
            }

            if max_shift <= self.config.convergence_epsilon {
                break;
            }
        }

        self.centroids = centroids;
    }

    /// Distance-based verdict for one sample. An untrained detector never
    /// flags anything.
    pub fn detect(&self, sample: &MetricSample) -> ClusterDetection {
        if self.centroids.is_empty() {
            return ClusterDetection {
                is_anomaly: false,
                normalized_distance: 0.0,
            };
        }

        let p = normalize(sample);
        let (_, dist) = nearest(&self.centroids, &p);
        let normalized_distance = dist * 100.0;

        ClusterDetection {
            is_anomaly: normalized_distance > self.config.distance_threshold,
            normalized_distance,
        }
    }
}

fn normalize(sample: &MetricSample) -> Point {
    let raw = sample.features();
    let mut out = [0.0f64; 5];
    for i in 0..5 {
        out[i] = (raw[i] / FEATURE_MAXIMA[i]).clamp(0.0, 1.0);
    }
    out
}

fn distance(a: &Point, b: &Point) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Index and distance of the nearest centroid
fn nearest(centroids: &[Point], p: &Point) -> (usize, f64) {
    let mut best = (0usize, f64::INFINITY);
    for (i, c) in centroids.iter().enumerate() {
        let d = distance(c, p);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

fn mean_point(members: &[&Point]) -> Point {
    let mut sum = [0.0f64; 5];
    for p in members {
        for i in 0..5 {
            sum[i] += p[i];
        }
    }
    let n = members.len() as f64;
    sum.map(|v| v / n)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn detector() -> ClusteringDetector {
        ClusteringDetector::new(ClusteringConfig::default(), StdRng::seed_from_u64(7))
    }

    fn steady_sample(jitter: f64) -> MetricSample {
        MetricSample::new(30.0 + jitter, 40.0 + jitter, 20.0 + jitter, 100.0, 0.5)
    }

    #[test]
    fn test_untrained_never_flags() {
        let d = detector();
        let extreme = MetricSample::new(100.0, 100.0, 500.0, 1000.0, 100.0);
        let result = d.detect(&extreme);
        assert!(!result.is_anomaly);
        assert_eq!(result.normalized_distance, 0.0);
    }

    #[test]
    fn test_train_requires_k_samples() {
        let mut d = detector();
        d.train(&[steady_sample(0.0), steady_sample(1.0)]);
        assert!(!d.is_trained());
    }

    #[test]
    fn test_outlier_flagged_after_training() {
        let mut d = detector();
        let history: Vec<MetricSample> = (0..30).map(|i| steady_sample((i % 5) as f64)).collect();
        d.train(&history);
        assert!(d.is_trained());

        // In-distribution point stays quiet
        let normal = d.detect(&steady_sample(2.0));
        assert!(!normal.is_anomaly, "nd = {}", normal.normalized_distance);

        // Far-off point is flagged
        let outlier = d.detect(&MetricSample::new(99.0, 99.0, 480.0, 900.0, 80.0));
        assert!(outlier.is_anomaly);
        assert!(outlier.normalized_distance > 15.0);
    }

    #[test]
    fn test_seeded_training_is_deterministic() {
        let history: Vec<MetricSample> =
            (0..40).map(|i| steady_sample((i % 7) as f64)).collect();
        let probe = MetricSample::new(80.0, 20.0, 200.0, 500.0, 10.0);

        let mut a = detector();
        a.train(&history);
        let mut b = detector();
        b.train(&history);

        assert_eq!(
            a.detect(&probe).normalized_distance,
            b.detect(&probe).normalized_distance
        );
    }
}
