//! Metric Samples & Bounded History
//!
//! `MetricSample` is the per-device measurement vector every engine consumes.
//! `BoundedHistory` replaces ad hoc `drain(..)` trimming with one
//! fixed-capacity ring buffer used for metric windows, anomaly stores and
//! action/alert histories.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// METRIC SAMPLE
// ============================================================================

/// One measurement vector for one device. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// CPU utilization, percent
    pub cpu: f64,
    /// Memory utilization, percent
    pub memory: f64,
    /// Round-trip latency, milliseconds
    pub latency: f64,
    /// Throughput, Mbps
    pub bandwidth: f64,
    /// Packet loss, percent
    pub packet_loss: f64,
    pub timestamp: DateTime<Utc>,
}

impl MetricSample {
    pub fn new(cpu: f64, memory: f64, latency: f64, bandwidth: f64, packet_loss: f64) -> Self {
        Self {
            cpu,
            memory,
            latency,
            bandwidth,
            packet_loss,
            timestamp: Utc::now(),
        }
    }

    /// Feature vector in fixed order: cpu, memory, latency, bandwidth, loss
    pub fn features(&self) -> [f64; 5] {
        [
            self.cpu,
            self.memory,
            self.latency,
            self.bandwidth,
            self.packet_loss,
        ]
    }

    /// Value of a named metric, if known
    pub fn get(&self, metric: &str) -> Option<f64> {
        match metric {
            "cpu" => Some(self.cpu),
            "memory" => Some(self.memory),
            "latency" => Some(self.latency),
            "bandwidth" => Some(self.bandwidth),
            "packet_loss" => Some(self.packet_loss),
            _ => None,
        }
    }
}

/// Names of the five features, index-aligned with `MetricSample::features`
pub const FEATURE_NAMES: [&str; 5] = ["cpu", "memory", "latency", "bandwidth", "packet_loss"];

/// Fixed normalization maxima per feature (domain knowledge, not learned):
/// cpu %, memory %, latency ms, bandwidth Mbps, packet loss %
pub const FEATURE_MAXIMA: [f64; 5] = [100.0, 100.0, 500.0, 1000.0, 100.0];

// ============================================================================
// BOUNDED HISTORY (ring buffer)
// ============================================================================

/// Fixed-capacity FIFO buffer. Pushing beyond capacity evicts the oldest
/// entry.
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedHistory<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    /// Drop entries that fail the predicate (used for time-window pruning)
    pub fn retain<F: FnMut(&T) -> bool>(&mut self, f: F) {
        self.items.retain(f);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: Clone> BoundedHistory<T> {
    /// Owned snapshot, oldest first
    pub fn snapshot(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }

    /// Owned snapshot of the newest `limit` entries, oldest first
    pub fn tail(&self, limit: usize) -> Vec<T> {
        let start = self.items.len().saturating_sub(limit);
        self.items.iter().skip(start).cloned().collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_history_evicts_oldest() {
        let mut h = BoundedHistory::new(3);
        for i in 0..5 {
            h.push(i);
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.snapshot(), vec![2, 3, 4]);
    }

    #[test]
    fn test_tail_returns_newest() {
        let mut h = BoundedHistory::new(10);
        for i in 0..6 {
            h.push(i);
        }
        assert_eq!(h.tail(2), vec![4, 5]);
        assert_eq!(h.tail(100).len(), 6);
    }

    #[test]
    fn test_metric_lookup_by_name() {
        let s = MetricSample::new(10.0, 20.0, 30.0, 40.0, 1.0);
        assert_eq!(s.get("latency"), Some(30.0));
        assert_eq!(s.get("disk"), None);
    }
}
