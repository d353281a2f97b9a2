//! Attack Signature Table
//!
//! Confidence scoring for inbound traffic: payload regexes for injection
//! attacks, fixed base confidences for known attack types, and a bounded
//! random fallback for anything unrecognized.

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::Rng;
use regex::Regex;

use crate::anomaly::Severity;

// ============================================================================
// PAYLOAD SIGNATURES
// ============================================================================

struct PayloadSignature {
    threat_type: &'static str,
    pattern: Regex,
    confidence: f64,
}

static PAYLOAD_SIGNATURES: Lazy<Vec<PayloadSignature>> = Lazy::new(|| {
    vec![
        PayloadSignature {
            threat_type: "sql_injection",
            pattern: Regex::new(
                r#"(?i)('\s*(or|and)\s+[^=]*=|union\s+select|;\s*drop\s+table|--\s*$|'\s*;)"#,
            )
            .expect("sqli pattern"),
            confidence: 0.93,
        },
        PayloadSignature {
            threat_type: "xss",
            pattern: Regex::new(r#"(?i)(<script[\s>]|javascript:|onerror\s*=|onload\s*=)"#)
                .expect("xss pattern"),
            confidence: 0.92,
        },
    ]
});

// ============================================================================
// TYPE CONFIDENCE TABLE
// ============================================================================

/// Base confidence for known attack types without payload inspection
const TYPE_CONFIDENCE: [(&str, f64); 6] = [
    ("ddos", 0.95),
    ("malware", 0.94),
    ("port_scan", 0.88),
    ("brute_force", 0.85),
    ("mitm", 0.82),
    ("dns_poisoning", 0.80),
];

/// Types that escalate to critical when confidence is very high
const CRITICAL_TYPES: [&str; 4] = ["ddos", "malware", "sql_injection", "ransomware"];

// ============================================================================
// SCORING
// ============================================================================

/// Confidence for one traffic event. Payload signatures take precedence,
/// then the type table, then a pseudo-random fallback in [0.6, 0.9).
pub fn score(threat_type: &str, payload: Option<&str>, rng: &mut StdRng) -> (String, f64) {
    if let Some(payload) = payload {
        for sig in PAYLOAD_SIGNATURES.iter() {
            if sig.pattern.is_match(payload) {
                return (sig.threat_type.to_string(), sig.confidence);
            }
        }
    }

    for (name, confidence) in TYPE_CONFIDENCE {
        if name.eq_ignore_ascii_case(threat_type) {
            return (threat_type.to_ascii_lowercase(), confidence);
        }
    }

    (threat_type.to_ascii_lowercase(), rng.gen_range(0.6..0.9))
}

/// Map confidence + type to a severity bucket
pub fn severity(threat_type: &str, confidence: f64) -> Severity {
    if confidence > 0.9 {
        if CRITICAL_TYPES.iter().any(|t| t.eq_ignore_ascii_case(threat_type)) {
            Severity::Critical
        } else {
            Severity::High
        }
    } else if confidence > 0.7 {
        Severity::High
    } else if confidence > 0.5 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(1)
    }

    #[test]
    fn test_sqli_payload_recognized() {
        let (t, c) = score("web_attack", Some("id=1' OR 1=1 --"), &mut rng());
        assert_eq!(t, "sql_injection");
        assert_eq!(c, 0.93);
    }

    #[test]
    fn test_xss_payload_recognized() {
        let (t, c) = score("web_attack", Some("<script>alert(1)</script>"), &mut rng());
        assert_eq!(t, "xss");
        assert_eq!(c, 0.92);
    }

    #[test]
    fn test_known_type_base_confidence() {
        let (t, c) = score("ddos", None, &mut rng());
        assert_eq!(t, "ddos");
        assert_eq!(c, 0.95);
    }

    #[test]
    fn test_unknown_type_falls_back_to_bounded_random() {
        let (_, c) = score("weird_probe", None, &mut rng());
        assert!((0.6..0.9).contains(&c));
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(severity("ddos", 0.95), Severity::Critical);
        assert_eq!(severity("port_scan", 0.95), Severity::High);
        assert_eq!(severity("anything", 0.8), Severity::High);
        assert_eq!(severity("anything", 0.6), Severity::Medium);
        assert_eq!(severity("anything", 0.4), Severity::Low);
    }
}
