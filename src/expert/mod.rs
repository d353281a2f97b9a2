//! Expert (Inference) Engine
//!
//! Forward-chaining rule evaluation over asserted facts. The fact set is
//! rebuilt for every independent run; rules are static and loaded once.

pub mod engine;
pub mod rules;
pub mod types;

pub use engine::ExpertEngine;
pub use types::{
    Condition, Diagnosis, ExpertRule, Fact, FactValue, InferenceResult, Operator,
};
