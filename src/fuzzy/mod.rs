//! Fuzzy Advisory Engine
//!
//! Maps crisp metrics to low/medium/high membership degrees, evaluates a
//! fixed rule set with min() AND-semantics and defuzzifies the matches into
//! one textual recommendation.

pub mod engine;
pub mod membership;
pub mod rules;

pub use engine::{AdvisoryReport, FuzzyAdvisoryEngine, RuleMatch};
pub use membership::{FuzzyInput, Membership};
pub use rules::{FuzzyRule, RulePriority};
