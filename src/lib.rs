//! NetOps Intelligence Core
//!
//! Detection -> Reasoning -> Remediation pipeline for network operations:
//! unsupervised anomaly detection (k-means + Z-score baselines), fuzzy-logic
//! advisories, a forward-chaining expert system, threat/firewall matching,
//! and policy-driven automated remediation with queuing, cooldown and
//! rollback.
//!
//! Dashboards, persistent incident storage and ticketing are external
//! collaborators; they consume this crate's output through the query surface
//! and the per-engine event channels.

pub mod alerts;
pub mod anomaly;
pub mod config;
pub mod events;
pub mod expert;
pub mod fuzzy;
pub mod incident;
pub mod metrics;
pub mod pipeline;
pub mod remediation;
pub mod threat;

pub use config::PipelineConfig;
pub use pipeline::Pipeline;
