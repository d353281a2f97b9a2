//! Fuzzification
//!
//! Pure functions mapping one crisp metric to {low, medium, high} membership
//! degrees via trapezoidal/triangular curves with fixed breakpoints. No
//! state, no configuration - the breakpoints are domain constants.

use serde::{Deserialize, Serialize};

/// Degrees of membership in the three linguistic categories, each in [0,1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

/// Crisp inputs for one advisory evaluation
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FuzzyInput {
    /// Round-trip latency, ms
    pub latency: f64,
    /// Link utilization, percent
    pub traffic: f64,
    /// CPU usage, percent
    pub cpu_usage: f64,
    /// Consumed bandwidth, Mbps
    pub bandwidth: f64,
    /// Packet loss, percent
    pub packet_loss: f64,
}

// ============================================================================
// CURVE PRIMITIVES
// ============================================================================

/// 1.0 up to `a`, linear descent to 0.0 at `b`
fn ramp_down(x: f64, a: f64, b: f64) -> f64 {
    if x <= a {
        1.0
    } else if x >= b {
        0.0
    } else {
        (b - x) / (b - a)
    }
}

/// 0.0 up to `a`, linear ascent to 1.0 at `b`
fn ramp_up(x: f64, a: f64, b: f64) -> f64 {
    if x <= a {
        0.0
    } else if x >= b {
        1.0
    } else {
        (x - a) / (b - a)
    }
}

/// Triangular curve peaking at `b`, zero outside (`a`, `c`)
fn triangle(x: f64, a: f64, b: f64, c: f64) -> f64 {
    if x <= a || x >= c {
        0.0
    } else if x <= b {
        (x - a) / (b - a)
    } else {
        (c - x) / (c - b)
    }
}

// ============================================================================
// FUZZIFIERS
// ============================================================================

/// Latency in milliseconds
pub fn fuzzify_latency(ms: f64) -> Membership {
    Membership {
        low: ramp_down(ms, 20.0, 60.0),
        medium: triangle(ms, 40.0, 90.0, 140.0),
        high: ramp_up(ms, 100.0, 180.0),
    }
}

/// Traffic as link utilization percent
pub fn fuzzify_traffic(pct: f64) -> Membership {
    Membership {
        low: ramp_down(pct, 20.0, 40.0),
        medium: triangle(pct, 30.0, 55.0, 80.0),
        high: ramp_up(pct, 70.0, 90.0),
    }
}

/// CPU usage percent
pub fn fuzzify_cpu(pct: f64) -> Membership {
    Membership {
        low: ramp_down(pct, 30.0, 50.0),
        medium: triangle(pct, 40.0, 60.0, 80.0),
        high: ramp_up(pct, 70.0, 90.0),
    }
}

/// Consumed bandwidth in Mbps
pub fn fuzzify_bandwidth(mbps: f64) -> Membership {
    Membership {
        low: ramp_down(mbps, 200.0, 400.0),
        medium: triangle(mbps, 300.0, 500.0, 700.0),
        high: ramp_up(mbps, 600.0, 850.0),
    }
}

/// Packet loss percent
pub fn fuzzify_packet_loss(pct: f64) -> Membership {
    Membership {
        low: ramp_down(pct, 0.5, 2.0),
        medium: triangle(pct, 1.0, 3.0, 5.0),
        high: ramp_up(pct, 4.0, 8.0),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_inputs_are_fully_low() {
        let m = fuzzify_latency(10.0);
        assert_eq!(m.low, 1.0);
        assert_eq!(m.medium, 0.0);
        assert_eq!(m.high, 0.0);

        let m = fuzzify_packet_loss(0.0);
        assert_eq!(m.low, 1.0);
        assert_eq!(m.high, 0.0);
    }

    #[test]
    fn test_extreme_inputs_are_fully_high() {
        let m = fuzzify_latency(200.0);
        assert_eq!(m.high, 1.0);
        assert_eq!(m.low, 0.0);

        let m = fuzzify_cpu(95.0);
        assert_eq!(m.high, 1.0);
    }

    #[test]
    fn test_triangle_peaks_at_center() {
        let m = fuzzify_cpu(60.0);
        assert_eq!(m.medium, 1.0);
    }

    #[test]
    fn test_overlap_region_has_partial_degrees() {
        // 75% CPU sits between medium's fall and high's rise
        let m = fuzzify_cpu(75.0);
        assert!(m.medium > 0.0 && m.medium < 1.0);
        assert!(m.high > 0.0 && m.high < 1.0);
        assert_eq!(m.low, 0.0);
    }

    #[test]
    fn test_degrees_stay_in_unit_interval() {
        for x in [-50.0, 0.0, 33.3, 87.2, 250.0, 10_000.0] {
            for m in [
                fuzzify_latency(x),
                fuzzify_traffic(x),
                fuzzify_cpu(x),
                fuzzify_bandwidth(x),
                fuzzify_packet_loss(x),
            ] {
                for d in [m.low, m.medium, m.high] {
                    assert!((0.0..=1.0).contains(&d), "degree {} out of range", d);
                }
            }
        }
    }
}
