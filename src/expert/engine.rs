//! Expert Engine
//!
//! Forward-chaining evaluation: every rule whose conditions all hold against
//! the current fact set becomes a match; matches are ranked by computed
//! confidence. Type-mismatched comparisons evaluate to false, never error.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;

use crate::events::{EngineEvent, EventBus};

use super::rules::default_rules;
use super::types::{
    Condition, Diagnosis, ExpertRule, Fact, FactValue, InferenceResult, Operator,
};

pub struct ExpertEngine {
    /// Sorted descending by static priority at load time
    rules: Vec<ExpertRule>,
    facts: RwLock<HashMap<String, Fact>>,
    bus: EventBus,
}

impl ExpertEngine {
    pub fn new() -> Self {
        Self::with_rules(default_rules())
    }

    pub fn with_rules(mut rules: Vec<ExpertRule>) -> Self {
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self {
            rules,
            facts: RwLock::new(HashMap::new()),
            bus: EventBus::new(),
        }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EngineEvent> {
        self.bus.subscribe()
    }

    /// Replace the fact set for the next run
    pub fn add_facts(&self, facts: Vec<Fact>) {
        let mut map = self.facts.write();
        map.clear();
        for f in facts {
            map.insert(f.id.clone(), f);
        }
    }

    /// Clear facts between independent evaluation runs
    pub fn reset(&self) {
        self.facts.write().clear();
    }

    /// Evaluate all rules against the current facts. Rules are visited in
    /// priority order; results are re-sorted by computed confidence.
    pub fn infer(&self) -> InferenceResult {
        let facts = self.facts.read();
        let mut matches: Vec<Diagnosis> = Vec::new();

        for rule in &self.rules {
            if let Some(confidence) = match_rule(rule, &facts) {
                matches.push(Diagnosis {
                    rule_id: rule.id.clone(),
                    diagnosis: rule.diagnosis.clone(),
                    recommendation: rule.recommendation.clone(),
                    confidence,
                });
            }
        }

        matches.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut iter = matches.into_iter();
        let primary_diagnosis = iter.next();
        let alternatives: Vec<Diagnosis> = iter.take(3).collect();

        if let Some(primary) = &primary_diagnosis {
            self.bus.emit(EngineEvent::DiagnosisReached {
                rule_id: primary.rule_id.clone(),
                diagnosis: primary.diagnosis.clone(),
                confidence: primary.confidence,
            });
        }

        InferenceResult {
            primary_diagnosis,
            alternatives,
            rules_evaluated: self.rules.len(),
            facts_considered: facts.len(),
            evaluated_at: Utc::now(),
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl Default for ExpertEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// All conditions must hold; returns the computed confidence on match.
/// Confidence = mean of the matched facts' confidence x rule confidence.
fn match_rule(rule: &ExpertRule, facts: &HashMap<String, Fact>) -> Option<f64> {
    let mut fact_confidence_sum = 0.0;

    for cond in &rule.conditions {
        let fact = facts.get(&cond.fact_id)?;
        if !evaluate_condition(cond, &fact.value) {
            return None;
        }
        fact_confidence_sum += fact.confidence;
    }

    let mean = fact_confidence_sum / rule.conditions.len() as f64;
    Some(mean * rule.confidence)
}

/// One condition against one fact value. Mismatched types are false.
fn evaluate_condition(cond: &Condition, value: &FactValue) -> bool {
    use FactValue::*;
    match (cond.operator, value, &cond.value) {
        (Operator::Equals, a, b) => a == b,
        (Operator::NotEquals, a, b) => {
            // Only meaningful when the types line up
            std::mem::discriminant(a) == std::mem::discriminant(b) && a != b
        }
        (Operator::GreaterThan, Number(a), Number(b)) => a > b,
        (Operator::LessThan, Number(a), Number(b)) => a < b,
        (Operator::Contains, Text(a), Text(b)) => a.contains(b.as_str()),
        _ => false,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_congestion_rule_wins_for_matching_facts() {
        let engine = ExpertEngine::new();
        engine.add_facts(vec![
            Fact::new("latency", 150.0, 0.95),
            Fact::new("packet_loss", 4.0, 0.9),
        ]);

        let result = engine.infer();
        let primary = result.primary_diagnosis.expect("match expected");
        assert_eq!(primary.rule_id, "EX-01");
        assert_eq!(primary.diagnosis, "Network congestion on uplink path");
        // mean(0.95, 0.9) * 0.9
        assert!((primary.confidence - 0.925 * 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_type_mismatch_evaluates_false_not_error() {
        let engine = ExpertEngine::new();
        // latency asserted as text; numeric comparison must simply not match
        engine.add_facts(vec![
            Fact::new("latency", "very high", 1.0),
            Fact::new("packet_loss", 4.0, 1.0),
        ]);

        let result = engine.infer();
        assert!(result
            .primary_diagnosis
            .map_or(true, |d| d.rule_id != "EX-01"));
    }

    #[test]
    fn test_missing_fact_means_no_match() {
        let engine = ExpertEngine::new();
        engine.add_facts(vec![Fact::new("latency", 150.0, 0.9)]);
        let result = engine.infer();
        assert!(result
            .primary_diagnosis
            .map_or(true, |d| d.rule_id != "EX-01"));
    }

    #[test]
    fn test_reset_clears_facts() {
        let engine = ExpertEngine::new();
        engine.add_facts(vec![
            Fact::new("latency", 150.0, 0.9),
            Fact::new("packet_loss", 4.0, 0.9),
        ]);
        engine.reset();
        let result = engine.infer();
        assert!(result.primary_diagnosis.is_none());
        assert_eq!(result.facts_considered, 0);
    }

    #[test]
    fn test_add_facts_replaces_previous_set() {
        let engine = ExpertEngine::new();
        engine.add_facts(vec![
            Fact::new("latency", 150.0, 0.9),
            Fact::new("packet_loss", 4.0, 0.9),
        ]);
        engine.add_facts(vec![Fact::new("cpu", 20.0, 0.9)]);
        assert_eq!(engine.infer().facts_considered, 1);
    }

    #[test]
    fn test_alternatives_capped_at_three() {
        let engine = ExpertEngine::new();
        engine.add_facts(vec![
            Fact::new("latency", 150.0, 0.9),
            Fact::new("packet_loss", 0.5, 0.9),
            Fact::new("cpu", 90.0, 0.9),
            Fact::new("memory", 85.0, 0.9),
            Fact::new("bandwidth", 900.0, 0.9),
            Fact::new("device_role", "core-router", 0.9),
            Fact::new("config_changed", true, 0.9),
        ]);

        let result = engine.infer();
        assert!(result.primary_diagnosis.is_some());
        assert!(result.alternatives.len() <= 3);
        // Confidence ordering holds across primary + alternatives
        let mut last = result.primary_diagnosis.unwrap().confidence;
        for alt in &result.alternatives {
            assert!(alt.confidence <= last);
            last = alt.confidence;
        }
    }

    #[tokio::test]
    async fn test_primary_diagnosis_emits_event() {
        let engine = ExpertEngine::new();
        let mut rx = engine.subscribe();
        engine.add_facts(vec![
            Fact::new("latency", 150.0, 0.9),
            Fact::new("packet_loss", 4.0, 0.9),
        ]);
        engine.infer();

        match rx.recv().await.unwrap() {
            EngineEvent::DiagnosisReached { rule_id, .. } => assert_eq!(rule_id, "EX-01"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_contains_operator() {
        let engine = ExpertEngine::new();
        engine.add_facts(vec![
            Fact::new("device_role", "core-switch", 1.0),
            Fact::new("cpu", 80.0, 1.0),
        ]);
        let result = engine.infer();
        let primary = result.primary_diagnosis.expect("EX-06 should match");
        assert_eq!(primary.rule_id, "EX-06");
    }
}
