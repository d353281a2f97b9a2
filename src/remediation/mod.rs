//! Automated Remediation
//!
//! Policies bind detection triggers to actions with cooldown and retry
//! limits. Matched actions enter a FIFO queue drained by a single worker
//! (one action in flight at a time); executed actions can be rolled back
//! where the action type supports it.

pub mod engine;
pub mod types;
pub mod worker;

pub use engine::RemediationEngine;
pub use types::{
    ActionFilter, ActionMode, ActionStatus, ActionType, PredictedFault, RemediationAction,
    RemediationPolicy, RemediationStatistics, TriggerType,
};
pub use worker::spawn_worker;
