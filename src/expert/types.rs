//! Expert System Types
//!
//! Data structures only - evaluation logic lives in `engine.rs`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// FACTS
// ============================================================================

/// A fact's payload. Comparisons across variants evaluate to false rather
/// than erroring, so one malformed fact cannot abort an inference run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<bool> for FactValue {
    fn from(v: bool) -> Self {
        FactValue::Bool(v)
    }
}

impl From<f64> for FactValue {
    fn from(v: f64) -> Self {
        FactValue::Number(v)
    }
}

impl From<&str> for FactValue {
    fn from(v: &str) -> Self {
        FactValue::Text(v.to_string())
    }
}

/// Asserted knowledge for one inference run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub id: String,
    pub value: FactValue,
    /// 0.0 - 1.0
    pub confidence: f64,
}

impl Fact {
    pub fn new<V: Into<FactValue>>(id: &str, value: V, confidence: f64) -> Self {
        Self {
            id: id.to_string(),
            value: value.into(),
            confidence,
        }
    }
}

// ============================================================================
// RULES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
}

/// One antecedent term: `fact(fact_id) <op> value`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub fact_id: String,
    pub operator: Operator,
    pub value: FactValue,
}

impl Condition {
    pub fn new<V: Into<FactValue>>(fact_id: &str, operator: Operator, value: V) -> Self {
        Self {
            fact_id: fact_id.to_string(),
            operator,
            value: value.into(),
        }
    }
}

/// Static diagnostic rule. All conditions must hold for the rule to match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpertRule {
    pub id: String,
    pub name: String,
    pub conditions: Vec<Condition>,
    pub diagnosis: String,
    pub recommendation: String,
    /// Static evaluation-order priority (higher first)
    pub priority: u32,
    /// Rule author's confidence in the conclusion, 0.0 - 1.0
    pub confidence: f64,
}

// ============================================================================
// RESULTS
// ============================================================================

/// One matched rule with its computed confidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnosis {
    pub rule_id: String,
    pub diagnosis: String,
    pub recommendation: String,
    /// mean(matched fact confidences) x rule confidence
    pub confidence: f64,
}

/// Outcome of one `infer()` run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceResult {
    pub primary_diagnosis: Option<Diagnosis>,
    /// Up to three runners-up, confidence descending
    pub alternatives: Vec<Diagnosis>,
    pub rules_evaluated: usize,
    pub facts_considered: usize,
    pub evaluated_at: DateTime<Utc>,
}
